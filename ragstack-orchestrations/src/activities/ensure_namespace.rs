//! Ensure namespace activity

use tracing::info;

use super::ActivityContext;
use crate::activity_types::{EnsureNamespaceInput, EnsureNamespaceOutput};
use crate::error::BackendError;
use crate::names::activities::ENSURE_NAMESPACE;
use crate::retry::with_retry;

pub async fn activity(
    ctx: ActivityContext<'_>,
    input: EnsureNamespaceInput<'_>,
) -> Result<EnsureNamespaceOutput, BackendError> {
    let exists = with_retry(ctx.retry, ENSURE_NAMESPACE, || {
        ctx.cluster.namespace_exists(input.namespace)
    })
    .await?;

    if exists {
        info!(namespace = %input.namespace, "Namespace already exists");
        return Ok(EnsureNamespaceOutput { created: false });
    }

    with_retry(ctx.retry, ENSURE_NAMESPACE, || {
        ctx.cluster.create_namespace(input.namespace)
    })
    .await?;
    info!(namespace = %input.namespace, "Namespace created");

    Ok(EnsureNamespaceOutput { created: true })
}
