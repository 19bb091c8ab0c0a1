//! Delete component activity

use tracing::info;

use super::{release_exists, ActivityContext};
use crate::activity_types::{DeleteComponentInput, DeleteComponentOutput};
use crate::error::{BackendError, BackendErrorKind};
use crate::names::activities::DELETE_COMPONENT;
use crate::retry::with_retry;

pub async fn activity(
    ctx: ActivityContext<'_>,
    input: DeleteComponentInput<'_>,
) -> Result<DeleteComponentOutput, BackendError> {
    let component = input.component;

    if !release_exists::activity(ctx, component).await? {
        info!(component = %component.name, "Release doesn't exist, nothing to delete");
        return Ok(DeleteComponentOutput { deleted: false });
    }

    let backend = ctx.backend_for(component);
    let result = with_retry(ctx.retry, DELETE_COMPONENT, || {
        backend.delete_release(component, input.timeout)
    })
    .await;

    match result {
        Ok(()) => {
            info!(component = %component.name, "Release deleted");
            Ok(DeleteComponentOutput { deleted: true })
        }
        // Removed by someone else between the lookup and the delete
        Err(e) if e.kind == BackendErrorKind::NotFound => {
            info!(component = %component.name, "Release vanished before delete");
            Ok(DeleteComponentOutput { deleted: false })
        }
        Err(e) => Err(e),
    }
}
