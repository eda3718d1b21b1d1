//! Plain-data references to platform objects.
//!
//! References are hrefs plus names; they stay valid only within the
//! session that produced them. Acting on a reference from another session
//! fails on the platform side, so code that switches sessions re-resolves
//! by href first.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credentials for a platform login.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub username: String,
    pub org: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(
        username: impl Into<String>,
        org: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            org: org.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("org", &self.org)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRef {
    pub name: String,
    pub href: String,
}

/// A virtual data center inside an org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VdcRef {
    pub name: String,
    pub href: String,
}

/// A catalog inside an org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRef {
    pub name: String,
    pub href: String,
    /// Whether the catalog is shared with all orgs
    pub shared: bool,
}

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItemRef {
    pub name: String,
    pub catalog: String,
    /// Href of the entity (template or media) the item wraps; its task
    /// list tracks the item's asynchronous processing
    pub entity_href: String,
}

/// A vApp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VappRef {
    pub name: String,
    pub href: String,
}

/// A VM as seen through a vApp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmRecord {
    /// Platform id of the VM (stable across sessions)
    pub id: String,
    pub name: String,
    pub href: String,
    /// Name of the vCenter that hosts the VM
    pub vcenter_name: String,
}

/// A registered vCenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcenterRecord {
    pub name: String,
    /// API URL of the vCenter, e.g. `https://vc1.example.com:443/sdk`
    pub url: String,
}

/// Handle for an asynchronous platform operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub href: String,
}

impl TaskHandle {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href)
    }
}

/// Status of a platform task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued or running
    Pending,
    Succeeded,
    Failed { message: String },
}

impl TaskStatus {
    /// Returns true if the task has resolved either way
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}
