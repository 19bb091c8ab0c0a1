//! Apply component activity

use tracing::info;

use super::{release_exists, ActivityContext};
use crate::activity_types::{ApplyComponentInput, ApplyComponentOutput};
use crate::error::BackendError;
use crate::names::activities::APPLY_COMPONENT;
use crate::retry::with_retry;

pub async fn activity(
    ctx: ActivityContext<'_>,
    input: ApplyComponentInput<'_>,
) -> Result<ApplyComponentOutput, BackendError> {
    let component = input.component;
    let backend = ctx.backend_for(component);

    let upgraded = release_exists::activity(ctx, component).await?;
    info!(
        component = %component.name,
        backend = backend.name(),
        upgrade = upgraded,
        "Applying component"
    );

    let handle = with_retry(ctx.retry, APPLY_COMPONENT, || {
        backend.apply_release(component, input.values, input.timeout)
    })
    .await?;

    Ok(ApplyComponentOutput { upgraded, handle })
}
