//! Mock Platform Implementation
//!
//! In-memory platform implementing both [`Connector`] and [`Session`].
//! Every session returned by `login` shares the same state, so tests can
//! set up fixtures, run a workflow and then inspect the call journal.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::platform::{
    CatalogItemRef, CatalogRef, Connector, EntityKind, LoginCredentials, Lookup, OrgRef,
    PlatformError, PlatformResult, Session, TaskHandle, TaskStatus, VappRef, VcenterRecord,
    VdcRef, VmRecord, SYSTEM_ORG_NAME,
};

use super::failure::{FailureConfig, FailureInjector};
use super::state::{MockCatalog, MockItem, MockOrg, MockState, MockVapp, MockVm, TaskKind};
use super::MockOp;

/// In-memory platform for tests.
///
/// Clones share state; each clone carries its own logged-in org.
#[derive(Clone, Debug)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
    org: String,
}

impl MockPlatform {
    /// Create a platform with the `System` org and `current_org`, logged
    /// into `current_org`.
    pub fn new(current_org: &str) -> Self {
        let platform = Self {
            state: Arc::new(Mutex::new(MockState::new())),
            failures: Arc::new(Mutex::new(FailureInjector::new())),
            org: current_org.to_string(),
        };
        platform.add_org(SYSTEM_ORG_NAME);
        platform.add_org(current_org);
        platform
    }

    // === Public API for test configuration ===

    pub fn add_org(&self, name: &str) -> OrgRef {
        let mut state = self.state();
        state
            .orgs
            .entry(name.to_string())
            .or_insert_with(|| MockOrg::new(name))
            .reference()
    }

    pub fn add_vdc(&self, org: &str, name: &str) {
        let mut state = self.state();
        if let Some(org) = state.orgs.get_mut(org) {
            org.vdcs.insert(name.to_string());
        }
    }

    pub fn add_catalog(&self, org: &str, name: &str) {
        let mut state = self.state();
        if let Some(org) = state.orgs.get_mut(org) {
            org.catalogs
                .entry(name.to_string())
                .or_insert_with(|| new_catalog(name, ""));
        }
    }

    /// Add a catalog item with no pending tasks.
    pub fn add_catalog_item(&self, org: &str, catalog: &str, item: &str) {
        let mut state = self.state();
        if let Some(catalog) = state
            .orgs
            .get_mut(org)
            .and_then(|org| org.catalogs.get_mut(catalog))
        {
            catalog.items.insert(item.to_string(), new_item(item, Vec::new()));
        }
    }

    /// Add a vApp and return its reference.
    pub fn add_vapp(&self, name: &str) -> VappRef {
        let vapp = MockVapp {
            name: name.to_string(),
            href: format!("https://vcd.mock/api/vApp/vapp-{}", uuid::Uuid::new_v4()),
            vms: Vec::new(),
        };
        let reference = vapp.reference();
        self.state().vapps.insert(vapp.href.clone(), vapp);
        reference
    }

    /// Add a VM to a vApp and return its record.
    pub fn add_vm(&self, vapp: &VappRef, name: &str, vcenter: &str, moid: &str) -> VmRecord {
        let uuid = uuid::Uuid::new_v4();
        let record = VmRecord {
            id: format!("urn:vcloud:vm:{}", uuid),
            href: format!("https://vcd.mock/api/vApp/vm-{}", uuid),
            name: name.to_string(),
            vcenter_name: vcenter.to_string(),
        };
        if let Some(vapp) = self.state().vapps.get_mut(&vapp.href) {
            vapp.vms.push(MockVm {
                record: record.clone(),
                moid: moid.to_string(),
            });
        }
        record
    }

    pub fn add_vcenter(&self, name: &str, url: &str) {
        self.state()
            .vcenters
            .insert(name.to_string(), url.to_string());
    }

    /// Number of pending polls new tasks report before resolving.
    pub fn set_task_polls(&self, polls: u32) {
        self.state().task_polls = polls;
    }

    /// Make the next task created fail with `message`.
    pub fn fail_next_task(&self, message: &str) {
        self.state().next_task_failure = Some(message.to_string());
    }

    /// Inject a failure for an operation.
    pub fn inject(&self, op: MockOp, config: FailureConfig) {
        self.failures.lock().unwrap().inject(op, config);
    }

    /// Clear all failure injections.
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    // === Inspection ===

    /// Every call made so far, in order.
    pub fn journal(&self) -> Vec<MockOp> {
        self.state().journal.clone()
    }

    /// Number of calls made to `op`.
    pub fn calls(&self, op: MockOp) -> usize {
        self.state().journal.iter().filter(|&&o| o == op).count()
    }

    pub fn clear_journal(&self) {
        self.state().journal.clear();
    }

    /// Credentials of every login, in order.
    pub fn logins(&self) -> Vec<LoginCredentials> {
        self.state().logins.clone()
    }

    /// How many times an org was reloaded.
    pub fn reloads(&self, org: &str) -> u32 {
        self.state().orgs.get(org).map(|o| o.reloads).unwrap_or(0)
    }

    /// Whether a catalog item currently exists.
    pub fn has_item(&self, org: &str, catalog: &str, item: &str) -> bool {
        self.state()
            .orgs
            .get(org)
            .and_then(|o| o.catalogs.get(catalog))
            .is_some_and(|c| c.items.contains_key(item))
    }

    /// Whether a catalog is shared.
    pub fn is_shared(&self, org: &str, catalog: &str) -> bool {
        self.state()
            .orgs
            .get(org)
            .and_then(|o| o.catalogs.get(catalog))
            .is_some_and(|c| c.shared)
    }

    /// Status history of a task.
    pub fn task_history(&self, task: &TaskHandle) -> Vec<(TaskStatus, DateTime<Utc>)> {
        self.state()
            .tasks
            .get(&task.href)
            .map(|t| t.history.clone())
            .unwrap_or_default()
    }

    // === Internals ===

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Record the call and apply any injected failure.
    fn enter(&self, op: MockOp) -> PlatformResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.journal.push(op);
        if let Some(err) = self.failures.lock().unwrap().check(op) {
            return Err(err);
        }
        Ok(state)
    }
}

fn new_catalog(name: &str, description: &str) -> MockCatalog {
    MockCatalog {
        name: name.to_string(),
        href: format!("https://vcd.mock/api/catalog/{}", uuid::Uuid::new_v4()),
        description: description.to_string(),
        shared: false,
        items: Default::default(),
    }
}

fn new_item(name: &str, tasks: Vec<String>) -> MockItem {
    MockItem {
        name: name.to_string(),
        entity_href: format!(
            "https://vcd.mock/api/vAppTemplate/vappTemplate-{}",
            uuid::Uuid::new_v4()
        ),
        tasks,
    }
}

fn org_mut<'a>(state: &'a mut MockState, org: &OrgRef) -> PlatformResult<&'a mut MockOrg> {
    state
        .orgs
        .get_mut(&org.name)
        .ok_or_else(|| PlatformError::not_found(EntityKind::Org, org.name.as_str()))
}

fn catalog_mut<'a>(
    state: &'a mut MockState,
    org: &OrgRef,
    catalog: &str,
) -> PlatformResult<&'a mut MockCatalog> {
    org_mut(state, org)?
        .catalogs
        .get_mut(catalog)
        .ok_or_else(|| PlatformError::not_found(EntityKind::Catalog, catalog))
}

fn vm_of<'a>(state: &'a MockState, vapp: &VappRef, vm_name: &str) -> PlatformResult<Option<&'a MockVm>> {
    let vapp = state
        .vapps
        .get(&vapp.href)
        .ok_or_else(|| PlatformError::not_found(EntityKind::Vapp, vapp.name.as_str()))?;
    Ok(vapp.vms.iter().find(|vm| vm.record.name == vm_name))
}

impl Connector for MockPlatform {
    type Session = MockPlatform;

    fn login(&self, credentials: &LoginCredentials) -> PlatformResult<MockPlatform> {
        let mut state = self.enter(MockOp::Login)?;
        state.logins.push(credentials.clone());
        if !state.orgs.contains_key(&credentials.org) {
            return Err(PlatformError::Authentication(format!(
                "unknown org '{}'",
                credentials.org
            )));
        }
        Ok(MockPlatform {
            state: Arc::clone(&self.state),
            failures: Arc::clone(&self.failures),
            org: credentials.org.clone(),
        })
    }
}

impl Session for MockPlatform {
    fn current_org(&self) -> PlatformResult<OrgRef> {
        let state = self.enter(MockOp::CurrentOrg)?;
        state
            .orgs
            .get(&self.org)
            .map(MockOrg::reference)
            .ok_or_else(|| PlatformError::not_found(EntityKind::Org, self.org.as_str()))
    }

    fn org_by_name(&self, name: &str) -> PlatformResult<Lookup<OrgRef>> {
        let state = self.enter(MockOp::OrgByName)?;
        Ok(state.orgs.get(name).map(MockOrg::reference).into())
    }

    fn reload_org(&self, org: &OrgRef) -> PlatformResult<OrgRef> {
        let mut state = self.enter(MockOp::ReloadOrg)?;
        let org = org_mut(&mut state, org)?;
        org.reloads += 1;
        Ok(org.reference())
    }

    fn vdc(&self, org: &OrgRef, name: &str) -> PlatformResult<Lookup<VdcRef>> {
        let mut state = self.enter(MockOp::Vdc)?;
        let org = org_mut(&mut state, org)?;
        Ok(org
            .vdcs
            .get(name)
            .map(|vdc| VdcRef {
                name: vdc.clone(),
                href: format!("{}/vdc/{}", org.href, vdc),
            })
            .into())
    }

    fn catalog(&self, org: &OrgRef, name: &str) -> PlatformResult<Lookup<CatalogRef>> {
        let mut state = self.enter(MockOp::Catalog)?;
        let org = org_mut(&mut state, org)?;
        Ok(org.catalogs.get(name).map(MockCatalog::reference).into())
    }

    fn create_catalog(
        &self,
        org: &OrgRef,
        name: &str,
        description: &str,
    ) -> PlatformResult<CatalogRef> {
        let mut state = self.enter(MockOp::CreateCatalog)?;
        let org = org_mut(&mut state, org)?;
        if org.catalogs.contains_key(name) {
            return Err(PlatformError::Transport(format!(
                "catalog '{}' already exists",
                name
            )));
        }
        let catalog = new_catalog(name, description);
        let reference = catalog.reference();
        org.catalogs.insert(name.to_string(), catalog);
        Ok(reference)
    }

    fn share_catalog(&self, org: &OrgRef, name: &str) -> PlatformResult<()> {
        let mut state = self.enter(MockOp::ShareCatalog)?;
        catalog_mut(&mut state, org, name)?.shared = true;
        Ok(())
    }

    fn catalog_item(
        &self,
        org: &OrgRef,
        catalog: &str,
        item: &str,
    ) -> PlatformResult<Lookup<CatalogItemRef>> {
        let mut state = self.enter(MockOp::CatalogItem)?;
        let catalog = catalog_mut(&mut state, org, catalog)?;
        Ok(catalog
            .items
            .get(item)
            .map(|found| catalog.item_ref(found))
            .into())
    }

    fn delete_catalog_item(
        &self,
        org: &OrgRef,
        catalog: &str,
        item: &str,
    ) -> PlatformResult<Lookup<()>> {
        let mut state = self.enter(MockOp::DeleteCatalogItem)?;
        if !catalog_mut(&mut state, org, catalog)?.items.contains_key(item) {
            return Ok(Lookup::NotFound);
        }

        let task = state.create_task(TaskKind::Delete {
            org: org.name.clone(),
            catalog: catalog.to_string(),
            item: item.to_string(),
        });
        if let Some(found) = catalog_mut(&mut state, org, catalog)?.items.get_mut(item) {
            found.tasks.insert(0, task);
        }
        Ok(Lookup::Found(()))
    }

    fn upload_ovf(&self, org: &OrgRef, catalog: &str, path: &Path) -> PlatformResult<()> {
        let mut state = self.enter(MockOp::UploadOvf)?;
        let item = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| PlatformError::InvalidSource(path.to_path_buf()))?;

        if catalog_mut(&mut state, org, catalog)?.items.contains_key(&item) {
            return Err(PlatformError::UploadRejected(format!(
                "catalog item '{}' already exists in catalog '{}'",
                item, catalog
            )));
        }

        let task = state.create_task(TaskKind::Upload);
        catalog_mut(&mut state, org, catalog)?
            .items
            .insert(item.clone(), new_item(&item, vec![task]));
        Ok(())
    }

    fn resource_tasks(&self, href: &str) -> PlatformResult<Vec<TaskHandle>> {
        let state = self.enter(MockOp::ResourceTasks)?;
        let item = state
            .item_by_entity(href)
            .ok_or_else(|| PlatformError::not_found(EntityKind::Resource, href))?;
        Ok(item
            .tasks
            .iter()
            .filter_map(|task| state.tasks.get(task))
            .filter(|task| !task.status.is_terminal())
            .map(|task| task.handle())
            .collect())
    }

    fn task_status(&self, task: &TaskHandle) -> PlatformResult<TaskStatus> {
        let mut state = self.enter(MockOp::TaskStatus)?;
        let entry = state
            .tasks
            .get_mut(&task.href)
            .ok_or_else(|| PlatformError::not_found(EntityKind::Task, task.href.as_str()))?;
        let status = entry.poll();
        let kind = entry.kind.clone();

        if let (TaskStatus::Succeeded, TaskKind::Delete { org, catalog, item }) = (&status, kind) {
            state.remove_item(&org, &catalog, &item);
        }
        Ok(status)
    }

    fn vm(&self, vapp: &VappRef, vm_name: &str) -> PlatformResult<Lookup<VmRecord>> {
        let state = self.enter(MockOp::Vm)?;
        Ok(vm_of(&state, vapp, vm_name)?
            .map(|vm| vm.record.clone())
            .into())
    }

    fn vm_moid(&self, vapp: &VappRef, vm_name: &str) -> PlatformResult<Lookup<String>> {
        let state = self.enter(MockOp::VmMoid)?;
        Ok(vm_of(&state, vapp, vm_name)?
            .map(|vm| vm.moid.clone())
            .into())
    }

    fn vcenter(&self, name: &str) -> PlatformResult<Lookup<VcenterRecord>> {
        let state = self.enter(MockOp::Vcenter)?;
        Ok(state
            .vcenters
            .get(name)
            .map(|url| VcenterRecord {
                name: name.to_string(),
                url: url.clone(),
            })
            .into())
    }
}
