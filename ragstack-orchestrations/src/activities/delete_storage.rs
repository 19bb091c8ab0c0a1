//! Delete storage claims activity

use ragstack_models::Component;
use tracing::info;

use super::ActivityContext;
use crate::activity_types::DeleteStorageOutput;
use crate::error::BackendError;
use crate::names::activities::DELETE_STORAGE;
use crate::retry::with_retry;

pub async fn activity(
    ctx: ActivityContext<'_>,
    component: &Component,
) -> Result<DeleteStorageOutput, BackendError> {
    let mut deleted_claims = Vec::new();

    for selector in &component.pvc_selectors {
        let claims = with_retry(ctx.retry, DELETE_STORAGE, || {
            ctx.cluster.list_resources(&component.namespace, selector)
        })
        .await?;

        for claim in claims {
            with_retry(ctx.retry, DELETE_STORAGE, || ctx.cluster.delete_resource(&claim)).await?;
            info!(component = %component.name, claim = %claim, "Storage claim deleted");
            if !deleted_claims.contains(&claim.name) {
                deleted_claims.push(claim.name);
            }
        }
    }

    Ok(DeleteStorageOutput { deleted_claims })
}
