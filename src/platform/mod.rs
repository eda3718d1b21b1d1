//! Virtualization Platform Collaborators
//!
//! The platform SDK (login, org/catalog object model, task monitor, vCenter
//! directory) is consumed through the [`Connector`] and [`Session`] traits.
//! The helpers in [`org`] cover the lookups the rest of the crate shares.

mod error;
mod lookup;
pub mod org;
mod session;
mod types;

pub use error::{EntityKind, PlatformError, PlatformResult};
pub use lookup::Lookup;
pub use org::{catalog_exists, catalog_item_exists, get_org, get_vdc, OrgSelector};
pub use session::{Connector, Session};
pub use types::{
    CatalogItemRef, CatalogRef, LoginCredentials, OrgRef, TaskHandle, TaskStatus, VappRef,
    VcenterRecord, VdcRef, VmRecord,
};

/// Org the privileged platform account logs into.
pub const SYSTEM_ORG_NAME: &str = "System";
