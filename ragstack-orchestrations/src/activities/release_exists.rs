//! Release lookup activity

use ragstack_models::Component;

use super::ActivityContext;
use crate::error::BackendError;
use crate::names::activities::RELEASE_EXISTS;
use crate::retry::with_retry;

pub async fn activity(
    ctx: ActivityContext<'_>,
    component: &Component,
) -> Result<bool, BackendError> {
    let backend = ctx.backend_for(component);
    with_retry(ctx.retry, RELEASE_EXISTS, || backend.release_exists(component)).await
}
