//! Session traits for the platform SDK.

use std::path::Path;

use super::error::PlatformResult;
use super::lookup::Lookup;
use super::types::{
    CatalogItemRef, CatalogRef, LoginCredentials, OrgRef, TaskHandle, TaskStatus, VappRef,
    VcenterRecord, VdcRef, VmRecord,
};

/// Opens authenticated platform sessions.
pub trait Connector {
    type Session: Session;

    /// Log in and return a new session.
    fn login(&self, credentials: &LoginCredentials) -> PlatformResult<Self::Session>;
}

/// An authenticated platform session.
///
/// Lookups whose absence is ordinary return [`Lookup`]; an `Err` means the
/// call itself failed (including a missing parent, such as the catalog of
/// a catalog item lookup).
pub trait Session {
    /// The org this session is logged into.
    fn current_org(&self) -> PlatformResult<OrgRef>;

    fn org_by_name(&self, name: &str) -> PlatformResult<Lookup<OrgRef>>;

    /// Refetch an org so later calls see changes made since it was loaded.
    fn reload_org(&self, org: &OrgRef) -> PlatformResult<OrgRef>;

    fn vdc(&self, org: &OrgRef, name: &str) -> PlatformResult<Lookup<VdcRef>>;

    fn catalog(&self, org: &OrgRef, name: &str) -> PlatformResult<Lookup<CatalogRef>>;

    fn create_catalog(
        &self,
        org: &OrgRef,
        name: &str,
        description: &str,
    ) -> PlatformResult<CatalogRef>;

    /// Share a catalog with every org.
    fn share_catalog(&self, org: &OrgRef, name: &str) -> PlatformResult<()>;

    fn catalog_item(
        &self,
        org: &OrgRef,
        catalog: &str,
        item: &str,
    ) -> PlatformResult<Lookup<CatalogItemRef>>;

    /// Delete a catalog item. `NotFound` when there was nothing to delete.
    fn delete_catalog_item(
        &self,
        org: &OrgRef,
        catalog: &str,
        item: &str,
    ) -> PlatformResult<Lookup<()>>;

    /// Upload an OVF/OVA file as a catalog item named after the file.
    fn upload_ovf(&self, org: &OrgRef, catalog: &str, path: &Path) -> PlatformResult<()>;

    /// Tasks currently attached to the resource at `href`.
    fn resource_tasks(&self, href: &str) -> PlatformResult<Vec<TaskHandle>>;

    fn task_status(&self, task: &TaskHandle) -> PlatformResult<TaskStatus>;

    fn vm(&self, vapp: &VappRef, vm_name: &str) -> PlatformResult<Lookup<VmRecord>>;

    /// vCenter managed-object id of a VM.
    fn vm_moid(&self, vapp: &VappRef, vm_name: &str) -> PlatformResult<Lookup<String>>;

    fn vcenter(&self, name: &str) -> PlatformResult<Lookup<VcenterRecord>>;
}
