//! Check capabilities activity

use ragstack_models::Component;

use super::ActivityContext;
use crate::activity_types::CheckCapabilitiesOutput;
use crate::error::BackendError;
use crate::names::activities::CHECK_CAPABILITIES;
use crate::retry::with_retry;

pub async fn activity(
    ctx: ActivityContext<'_>,
    component: &Component,
) -> Result<CheckCapabilitiesOutput, BackendError> {
    let mut missing = Vec::new();
    for &capability in &component.requires {
        let present = with_retry(ctx.retry, CHECK_CAPABILITIES, || {
            ctx.cluster.has_capability(capability)
        })
        .await?;
        if !present {
            missing.push(capability);
        }
    }
    Ok(CheckCapabilitiesOutput { missing })
}
