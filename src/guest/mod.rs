//! Guest Tools Readiness
//!
//! Waits for the guest tools of a vApp's VM to report ready, polling a
//! guest-automation client that talks to the VM's vCenter.

use tracing::{error, info};

use crate::connection::{ConnectionEndpoint, ConnectionResolver};
use crate::platform::{Connector, EntityKind, PlatformError, Session, VappRef};
use crate::wait::{poll_until, Poll, WaitInterrupted, WaitPolicy};

/// Errors from the guest-automation client
#[derive(Debug, thiserror::Error)]
pub enum GuestError {
    #[error("failed to connect to {host}: {reason}")]
    Connection { host: String, reason: String },

    #[error("no guest VM with moid '{moid}'")]
    VmNotFound { moid: String },

    #[error("tools status probe failed: {0}")]
    Probe(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Interrupted(#[from] WaitInterrupted),
}

/// Guest tools state as reported by vCenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolsStatus {
    Ready,
    NotReady { state: String },
}

/// Guest-automation client bound to one vCenter.
pub trait GuestClient {
    type Vm;

    /// Establish the vCenter connection.
    fn connect(&mut self) -> Result<(), GuestError>;

    fn vm_by_moid(&self, moid: &str) -> Result<Self::Vm, GuestError>;

    fn tools_status(&mut self, vm: &Self::Vm) -> Result<ToolsStatus, GuestError>;
}

/// Builds guest clients for resolved endpoints.
pub trait GuestConnector {
    type Client: GuestClient;

    fn open(&self, endpoint: &ConnectionEndpoint) -> Self::Client;
}

/// Default readiness callback: logs each message with `prefix`, probe
/// errors at error level.
pub fn progress_reporter(prefix: impl Into<String>) -> impl FnMut(&str, Option<&GuestError>) {
    let prefix = prefix.into();
    move |message, err| match err {
        Some(err) => error!(error = %err, "{}{}", prefix, message),
        None => info!("{}{}", prefix, message),
    }
}

/// Block until the guest tools of the VM named like `vapp` are ready.
///
/// `callback` gets one message per poll. A failed status probe is handed
/// to the callback and polling continues; connection and lookup failures
/// before the loop end the wait.
pub fn wait_until_tools_ready<S, G, F>(
    session: &S,
    vapp: &VappRef,
    guest: &mut G,
    policy: &WaitPolicy,
    mut callback: F,
) -> Result<(), GuestError>
where
    S: Session,
    G: GuestClient,
    F: FnMut(&str, Option<&GuestError>),
{
    guest.connect()?;
    let moid = session
        .vm_moid(vapp, &vapp.name)?
        .require(EntityKind::Vm, vapp.name.as_str())?;
    let vm = guest.vm_by_moid(&moid)?;

    let mut attempt = 0u32;
    poll_until(policy, || {
        attempt += 1;
        match guest.tools_status(&vm) {
            Ok(ToolsStatus::Ready) => {
                callback(&format!("VMware Tools ready on '{}'", vapp.name), None);
                Ok(Poll::Ready(()))
            }
            Ok(ToolsStatus::NotReady { state }) => {
                callback(
                    &format!(
                        "waiting for VMware Tools on '{}' (attempt {}, state {})",
                        vapp.name, attempt, state
                    ),
                    None,
                );
                Ok(Poll::Pending)
            }
            Err(err) => {
                callback(
                    &format!(
                        "VMware Tools status check failed on '{}' (attempt {})",
                        vapp.name, attempt
                    ),
                    Some(&err),
                );
                Ok(Poll::Pending)
            }
        }
    })
}

/// Resolve the guest endpoint of a VM and open a client for it.
pub fn open_guest<C, G, S>(
    resolver: &ConnectionResolver<C>,
    connector: &G,
    session: &S,
    vapp: &VappRef,
    vm_name: &str,
) -> Result<G::Client, GuestError>
where
    C: Connector,
    G: GuestConnector,
    S: Session,
{
    let endpoint = resolver.resolve_for(session, vapp, vm_name)?;
    Ok(connector.open(&endpoint))
}
