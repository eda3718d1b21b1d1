//! Mock Platform State Management
//!
//! Orgs, catalogs, vApps, vCenters and tasks held by the mock platform.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::platform::{
    CatalogItemRef, CatalogRef, LoginCredentials, OrgRef, TaskHandle, TaskStatus, VappRef,
    VmRecord,
};

use super::MockOp;

/// What a mock task does when it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    Upload,
    /// Removes the catalog item once the task succeeds
    Delete {
        org: String,
        catalog: String,
        item: String,
    },
}

/// A task in the mock platform
#[derive(Debug, Clone)]
pub struct MockTask {
    pub href: String,
    pub kind: TaskKind,
    /// Status polls left before the task resolves
    pub remaining_polls: u32,
    /// Failure message; the task fails instead of succeeding when set
    pub failure: Option<String>,
    pub status: TaskStatus,
    /// State history for debugging
    pub history: Vec<(TaskStatus, DateTime<Utc>)>,
}

impl MockTask {
    /// Create a new task in PENDING state
    pub fn new(kind: TaskKind, remaining_polls: u32, failure: Option<String>) -> Self {
        let href = format!("urn:mock:task:{}", uuid::Uuid::new_v4());
        Self {
            href,
            kind,
            remaining_polls,
            failure,
            status: TaskStatus::Pending,
            history: vec![(TaskStatus::Pending, Utc::now())],
        }
    }

    pub fn handle(&self) -> TaskHandle {
        TaskHandle::new(self.href.clone())
    }

    /// Advance by one status poll and return the new status
    pub fn poll(&mut self) -> TaskStatus {
        if self.status.is_terminal() {
            return self.status.clone();
        }
        if self.remaining_polls > 0 {
            self.remaining_polls -= 1;
            return TaskStatus::Pending;
        }
        let status = match &self.failure {
            Some(message) => TaskStatus::Failed {
                message: message.clone(),
            },
            None => TaskStatus::Succeeded,
        };
        self.transition(status.clone());
        status
    }

    fn transition(&mut self, status: TaskStatus) {
        self.status = status.clone();
        self.history.push((status, Utc::now()));
    }
}

#[derive(Debug, Clone)]
pub struct MockItem {
    pub name: String,
    pub entity_href: String,
    /// Task hrefs, most recent first
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MockCatalog {
    pub name: String,
    pub href: String,
    pub description: String,
    pub shared: bool,
    pub items: BTreeMap<String, MockItem>,
}

impl MockCatalog {
    pub fn reference(&self) -> CatalogRef {
        CatalogRef {
            name: self.name.clone(),
            href: self.href.clone(),
            shared: self.shared,
        }
    }

    pub fn item_ref(&self, item: &MockItem) -> CatalogItemRef {
        CatalogItemRef {
            name: item.name.clone(),
            catalog: self.name.clone(),
            entity_href: item.entity_href.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockOrg {
    pub name: String,
    pub href: String,
    pub vdcs: BTreeSet<String>,
    pub catalogs: BTreeMap<String, MockCatalog>,
    pub reloads: u32,
}

impl MockOrg {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            href: format!("https://vcd.mock/api/org/{}", uuid::Uuid::new_v4()),
            vdcs: BTreeSet::new(),
            catalogs: BTreeMap::new(),
            reloads: 0,
        }
    }

    pub fn reference(&self) -> OrgRef {
        OrgRef {
            name: self.name.clone(),
            href: self.href.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockVm {
    pub record: VmRecord,
    pub moid: String,
}

#[derive(Debug, Clone)]
pub struct MockVapp {
    pub name: String,
    pub href: String,
    pub vms: Vec<MockVm>,
}

impl MockVapp {
    pub fn reference(&self) -> VappRef {
        VappRef {
            name: self.name.clone(),
            href: self.href.clone(),
        }
    }
}

/// Complete mock platform state
#[derive(Debug, Default)]
pub struct MockState {
    pub orgs: BTreeMap<String, MockOrg>,
    /// vApps by href
    pub vapps: BTreeMap<String, MockVapp>,
    /// vCenter URLs by name
    pub vcenters: BTreeMap<String, String>,
    pub tasks: HashMap<String, MockTask>,
    /// Every collaborator call, in order
    pub journal: Vec<MockOp>,
    pub logins: Vec<LoginCredentials>,
    /// Pending polls given to new tasks
    pub task_polls: u32,
    /// Failure message for the next task created
    pub next_task_failure: Option<String>,
}

impl MockState {
    pub fn new() -> Self {
        Self {
            task_polls: 1,
            ..Self::default()
        }
    }

    /// Create a task using the configured poll count and pending failure
    pub fn create_task(&mut self, kind: TaskKind) -> String {
        let failure = self.next_task_failure.take();
        let task = MockTask::new(kind, self.task_polls, failure);
        let href = task.href.clone();
        self.tasks.insert(href.clone(), task);
        href
    }

    /// Find the item whose entity has the given href
    pub fn item_by_entity(&self, entity_href: &str) -> Option<&MockItem> {
        self.orgs
            .values()
            .flat_map(|org| org.catalogs.values())
            .flat_map(|catalog| catalog.items.values())
            .find(|item| item.entity_href == entity_href)
    }

    /// Remove a catalog item (used when a delete task completes)
    pub fn remove_item(&mut self, org: &str, catalog: &str, item: &str) {
        if let Some(catalog) = self
            .orgs
            .get_mut(org)
            .and_then(|org| org.catalogs.get_mut(catalog))
        {
            catalog.items.remove(item);
        }
    }
}
