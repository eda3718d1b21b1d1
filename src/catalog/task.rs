//! Waiting on platform tasks attached to catalog items.

use tracing::{debug, info};

use crate::platform::{
    get_org, EntityKind, OrgRef, OrgSelector, PlatformError, PlatformResult, Session, TaskHandle,
    TaskStatus,
};
use crate::wait::{poll_until, Poll, WaitPolicy};

/// Poll a task until it leaves the pending state.
///
/// A failed task becomes [`PlatformError::TaskFailed`].
pub fn wait_for_task<S: Session>(
    session: &S,
    task: &TaskHandle,
    policy: &WaitPolicy,
) -> PlatformResult<()> {
    debug!(task = %task, "waiting for task");
    poll_until(policy, || match session.task_status(task)? {
        TaskStatus::Pending => Ok(Poll::Pending),
        TaskStatus::Succeeded => Ok(Poll::Ready(())),
        TaskStatus::Failed { message } => Err(PlatformError::TaskFailed {
            task: task.href.clone(),
            message,
        }),
    })
}

/// Wait for the first pending task of a catalog item's entity.
///
/// Returns immediately when nothing is pending. A missing item is
/// [`PlatformError::NotFound`].
pub fn wait_for_item_task<S: Session>(
    session: &S,
    org: &OrgRef,
    catalog: &str,
    item: &str,
    policy: &WaitPolicy,
) -> PlatformResult<()> {
    let item_ref = session
        .catalog_item(org, catalog, item)?
        .require(EntityKind::CatalogItem, item)?;
    let tasks = session.resource_tasks(&item_ref.entity_href)?;

    let Some(task) = tasks.first() else {
        debug!(catalog, item, "no pending task on catalog item");
        return Ok(());
    };

    wait_for_task(session, task, policy)?;
    info!(catalog, item, task = %task, "catalog item task finished");
    Ok(())
}

/// [`wait_for_item_task`] with the org picked by a selector.
pub fn wait_for_catalog_item_to_resolve<S: Session>(
    session: &S,
    selector: &OrgSelector,
    catalog: &str,
    item: &str,
    policy: &WaitPolicy,
) -> PlatformResult<()> {
    let org = get_org(session, selector)?;
    wait_for_item_task(session, &org, catalog, item, policy)
}
