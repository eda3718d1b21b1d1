//! Mock Guest-Automation Client
//!
//! Scripted tools-status responses for readiness tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use crate::connection::ConnectionEndpoint;
use crate::guest::{GuestClient, GuestConnector, GuestError, ToolsStatus};

/// VM handle returned by [`MockGuest::vm_by_moid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockGuestVm {
    pub moid: String,
}

/// Guest client whose VM reports not-ready for a fixed number of polls.
#[derive(Debug, Default)]
pub struct MockGuest {
    moids: BTreeSet<String>,
    not_ready_polls: u32,
    /// Probe number (1-based) → error message
    probe_errors: HashMap<u32, String>,
    refuse_connect: Option<String>,
    connects: u32,
    polls: u32,
}

impl MockGuest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a moid resolvable.
    pub fn with_vm(mut self, moid: &str) -> Self {
        self.moids.insert(moid.to_string());
        self
    }

    /// Report not-ready for the first `polls` successful probes.
    pub fn with_not_ready_polls(mut self, polls: u32) -> Self {
        self.not_ready_polls = polls;
        self
    }

    /// Fail probe number `attempt` (1-based) with `message`.
    pub fn with_probe_error(mut self, attempt: u32, message: &str) -> Self {
        self.probe_errors.insert(attempt, message.to_string());
        self
    }

    pub fn refusing_connections(mut self, reason: &str) -> Self {
        self.refuse_connect = Some(reason.to_string());
        self
    }

    pub fn connects(&self) -> u32 {
        self.connects
    }

    /// Number of tools-status probes made.
    pub fn polls(&self) -> u32 {
        self.polls
    }
}

impl GuestClient for MockGuest {
    type Vm = MockGuestVm;

    fn connect(&mut self) -> Result<(), GuestError> {
        self.connects += 1;
        match &self.refuse_connect {
            Some(reason) => Err(GuestError::Connection {
                host: "mock".to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn vm_by_moid(&self, moid: &str) -> Result<MockGuestVm, GuestError> {
        if self.moids.contains(moid) {
            Ok(MockGuestVm {
                moid: moid.to_string(),
            })
        } else {
            Err(GuestError::VmNotFound {
                moid: moid.to_string(),
            })
        }
    }

    fn tools_status(&mut self, _vm: &MockGuestVm) -> Result<ToolsStatus, GuestError> {
        self.polls += 1;
        if let Some(message) = self.probe_errors.get(&self.polls) {
            return Err(GuestError::Probe(message.clone()));
        }
        if self.not_ready_polls > 0 {
            self.not_ready_polls -= 1;
            return Ok(ToolsStatus::NotReady {
                state: "toolsNotRunning".to_string(),
            });
        }
        Ok(ToolsStatus::Ready)
    }
}

/// Connector handing out fresh [`MockGuest`]s and recording endpoints.
#[derive(Debug, Clone, Default)]
pub struct MockGuestConnector {
    opened: Arc<Mutex<Vec<ConnectionEndpoint>>>,
}

impl MockGuestConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoints opened so far, in order.
    pub fn opened(&self) -> Vec<ConnectionEndpoint> {
        self.opened.lock().unwrap().clone()
    }
}

impl GuestConnector for MockGuestConnector {
    type Client = MockGuest;

    fn open(&self, endpoint: &ConnectionEndpoint) -> MockGuest {
        self.opened.lock().unwrap().push(endpoint.clone());
        MockGuest::new()
    }
}
