//! Mock Platform and Guest Implementations
//!
//! In-process stand-ins for the virtualization platform SDK and the
//! guest-automation client, used by unit and integration tests.
//!
//! # Operations
//!
//! Every [`Session`](crate::platform::Session) and
//! [`Connector`](crate::platform::Connector) call is recorded in a journal
//! as a [`MockOp`] and can be made to fail through [`FailureConfig`].
//! Tasks resolve after a configurable number of status polls.

mod failure;
mod guest;
mod platform;
mod state;

pub use failure::{FailureConfig, FailureInjector, FailureKind};
pub use guest::{MockGuest, MockGuestConnector, MockGuestVm};
pub use platform::MockPlatform;
pub use state::{MockState, MockTask, TaskKind};

/// Collaborator operations recorded by the mock platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Login,
    CurrentOrg,
    OrgByName,
    ReloadOrg,
    Vdc,
    Catalog,
    CreateCatalog,
    ShareCatalog,
    CatalogItem,
    DeleteCatalogItem,
    UploadOvf,
    ResourceTasks,
    TaskStatus,
    Vm,
    VmMoid,
    Vcenter,
}
