//! Failure Injection for the Mock Platform
//!
//! Supports configurable failure injection for testing error paths.

use std::collections::HashMap;

use crate::platform::{EntityKind, PlatformError};

use super::MockOp;

/// Error a failing operation returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    NotFound { kind: EntityKind, name: String },
    UploadRejected(String),
    Authentication(String),
    Transport(String),
}

/// Failure configuration for an operation
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// Error to return
    pub kind: FailureKind,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Fail with a not-found error
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound {
            kind,
            name: name.into(),
        })
    }

    /// Reject uploads
    pub fn upload_rejected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::UploadRejected(message.into()))
    }

    /// Fail logins
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Authentication(message.into()))
    }

    /// Fail with a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport(message.into()))
    }

    fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }

    /// Build the error this config describes
    pub fn to_error(&self) -> PlatformError {
        match &self.kind {
            FailureKind::NotFound { kind, name } => PlatformError::not_found(*kind, name.clone()),
            FailureKind::UploadRejected(message) => PlatformError::UploadRejected(message.clone()),
            FailureKind::Authentication(message) => PlatformError::Authentication(message.clone()),
            FailureKind::Transport(message) => PlatformError::Transport(message.clone()),
        }
    }
}

/// Failure injector for the mock platform
#[derive(Debug, Default)]
pub struct FailureInjector {
    /// Per-operation failure configs
    configs: HashMap<MockOp, FailureConfig>,
    /// Call counts per operation (for fail_count tracking)
    call_counts: HashMap<MockOp, u32>,
}

impl FailureInjector {
    /// Create a new failure injector
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for an operation
    pub fn inject(&mut self, op: MockOp, config: FailureConfig) {
        self.configs.insert(op, config);
        self.call_counts.insert(op, 0);
    }

    /// Clear all failure injections
    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Clear failure injection for a specific operation
    pub fn clear_op(&mut self, op: MockOp) {
        self.configs.remove(&op);
        self.call_counts.remove(&op);
    }

    /// Check if a failure should occur for an operation
    pub fn check(&mut self, op: MockOp) -> Option<PlatformError> {
        let config = self.configs.get(&op)?;
        let count = self.call_counts.entry(op).or_insert(0);
        *count += 1;

        if let Some(fail_limit) = config.fail_count {
            if *count > fail_limit {
                return None;
            }
        }

        Some(config.to_error())
    }
}
