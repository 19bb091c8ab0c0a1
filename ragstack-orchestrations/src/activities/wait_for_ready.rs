//! Wait for component readiness activity

use tracing::info;

use super::ActivityContext;
use crate::activity_types::{WaitForReadyInput, WaitForReadyOutput};
use crate::error::BackendError;
use crate::names::activities::WAIT_FOR_READY;
use crate::retry::with_retry;

pub async fn activity(
    ctx: ActivityContext<'_>,
    input: WaitForReadyInput<'_>,
) -> Result<WaitForReadyOutput, BackendError> {
    let backend = ctx.backend_for(input.component);
    let is_ready = with_retry(ctx.retry, WAIT_FOR_READY, || {
        backend.is_ready(input.component, input.timeout)
    })
    .await?;

    info!(component = %input.component.name, ready = is_ready, "Readiness checked");
    Ok(WaitForReadyOutput { is_ready })
}
