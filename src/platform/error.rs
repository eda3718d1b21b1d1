//! Platform error taxonomy.

use std::fmt;
use std::path::PathBuf;

use crate::wait::WaitInterrupted;

/// Result alias for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Kind of platform entity named in a not-found error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Org,
    Vdc,
    Catalog,
    CatalogItem,
    Vapp,
    Vm,
    Vcenter,
    Resource,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Org => write!(f, "org"),
            Self::Vdc => write!(f, "vdc"),
            Self::Catalog => write!(f, "catalog"),
            Self::CatalogItem => write!(f, "catalog item"),
            Self::Vapp => write!(f, "vApp"),
            Self::Vm => write!(f, "VM"),
            Self::Vcenter => write!(f, "vCenter"),
            Self::Resource => write!(f, "resource"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// Errors from platform collaborators and the workflows built on them.
///
/// None of these are retried inside this crate.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntityKind, name: String },

    #[error("upload rejected: {0}")]
    UploadRejected(String),

    #[error("task {task} failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("malformed endpoint '{url}': {reason}")]
    MalformedEndpoint { url: String, reason: String },

    #[error("source path has no file name: {}", .0.display())]
    InvalidSource(PathBuf),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Interrupted(#[from] WaitInterrupted),
}

impl PlatformError {
    /// Create a not-found error.
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when this is a not-found error for the given kind.
    pub fn is_not_found_kind(&self, expected: EntityKind) -> bool {
        matches!(self, Self::NotFound { kind, .. } if *kind == expected)
    }
}
