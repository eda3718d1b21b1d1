//! Guest Connection Resolution
//!
//! Maps a platform VM to the vCenter endpoint and credentials needed to
//! automate its guest. Resolution logs in as the system administrator,
//! follows the VM to its vCenter and joins the result with the configured
//! per-vCenter credentials. Results are cached per VM id in a bounded LRU
//! owned by the resolver.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};
use url::Url;

use crate::cache::BoundedLru;
use crate::config::{Config, VcenterEntry};
use crate::platform::{
    Connector, EntityKind, LoginCredentials, PlatformError, PlatformResult, Session, VappRef,
};

/// Default number of VMs whose endpoints are remembered.
pub const CONNECTION_CACHE_CAPACITY: usize = 1024;

const DEFAULT_CAPACITY: NonZeroUsize =
    NonZeroUsize::MIN.saturating_add(CONNECTION_CACHE_CAPACITY - 1);

/// Where and as whom to reach a VM's guest.
///
/// Username and password are `None` when no configured vCenter entry
/// matches the VM's vCenter.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionEndpoint {
    pub hostname: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ConnectionEndpoint {
    /// Whether configured credentials were found for the vCenter
    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }
}

impl fmt::Debug for ConnectionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionEndpoint")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Split a vCenter URL into host and port.
///
/// A URL without an explicit port gets its scheme's default (443 for
/// https).
pub fn parse_vcenter_url(raw: &str) -> PlatformResult<(String, u16)> {
    let malformed = |reason: &str| PlatformError::MalformedEndpoint {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| malformed(&e.to_string()))?;
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| malformed("missing host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| malformed("missing port and no default for scheme"))?;
    Ok((host.to_string(), port))
}

/// Resolves and caches guest connection endpoints.
pub struct ConnectionResolver<C: Connector> {
    connector: C,
    credentials: LoginCredentials,
    vcenters: Vec<VcenterEntry>,
    cache: Mutex<BoundedLru<String, ConnectionEndpoint>>,
    /// One gate per VM id with a miss being resolved.
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<C: Connector> ConnectionResolver<C> {
    /// Resolver with the default cache capacity.
    pub fn new(connector: C, config: &Config) -> Self {
        Self::with_capacity(connector, config, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(connector: C, config: &Config, capacity: NonZeroUsize) -> Self {
        Self {
            connector,
            credentials: config.system_credentials(),
            vcenters: config.vcs.clone(),
            cache: Mutex::new(BoundedLru::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Endpoint for the VM `vm_name` in `vapp`, cached under `vm_id`.
    ///
    /// A hit makes no collaborator calls. The cache is only locked to read
    /// and insert, so hits never wait on another VM's miss. Concurrent
    /// misses for one VM id queue on a per-id gate and resolve once.
    /// Nothing is cached when any step fails.
    pub fn resolve(
        &self,
        vm_id: &str,
        vapp: &VappRef,
        vm_name: &str,
    ) -> PlatformResult<ConnectionEndpoint> {
        if let Some(endpoint) = self.hit(vm_id) {
            return Ok(endpoint);
        }

        let gate = self.enter_gate(vm_id);
        let result = {
            let _resolving = gate.lock().unwrap_or_else(PoisonError::into_inner);
            // A miss queued behind ours finds the entry it was waiting for.
            match self.hit(vm_id) {
                Some(endpoint) => Ok(endpoint),
                None => self.lookup(vapp, vm_name).map(|endpoint| {
                    self.insert(vm_id, &endpoint);
                    endpoint
                }),
            }
        };
        self.leave_gate(vm_id, gate);
        result
    }

    /// Like [`resolve`](Self::resolve), reading the VM id through the
    /// caller's session first.
    pub fn resolve_for<S: Session>(
        &self,
        session: &S,
        vapp: &VappRef,
        vm_name: &str,
    ) -> PlatformResult<ConnectionEndpoint> {
        let vm = session.vm(vapp, vm_name)?.require(EntityKind::Vm, vm_name)?;
        self.resolve(&vm.id, vapp, vm_name)
    }

    /// Cached endpoint for a VM id, without touching its recency.
    pub fn cached(&self, vm_id: &str) -> Option<ConnectionEndpoint> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .peek(vm_id)
            .cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn capacity(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity()
    }

    fn hit(&self, vm_id: &str) -> Option<ConnectionEndpoint> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let endpoint = cache.get(vm_id)?.clone();
        debug!(vm_id, hostname = %endpoint.hostname, "connection cache hit");
        Some(endpoint)
    }

    fn insert(&self, vm_id: &str, endpoint: &ConnectionEndpoint) {
        let evicted = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(vm_id.to_string(), endpoint.clone());
        if let Some((evicted, _)) = evicted {
            debug!(vm_id = %evicted, "evicted connection cache entry");
        }
        info!(
            vm_id,
            hostname = %endpoint.hostname,
            port = endpoint.port,
            "resolved guest connection"
        );
    }

    fn enter_gate(&self, vm_id: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(vm_id.to_string()).or_default())
    }

    /// Drop the gate once no other caller holds it.
    fn leave_gate(&self, vm_id: &str, gate: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under this lock: the map's and ours.
        if Arc::strong_count(&gate) == 2 {
            in_flight.remove(vm_id);
        }
    }

    fn lookup(&self, vapp: &VappRef, vm_name: &str) -> PlatformResult<ConnectionEndpoint> {
        let session = self.connector.login(&self.credentials)?;

        // The caller's vApp reference is re-read under the system session.
        let vm = session.vm(vapp, vm_name)?.require(EntityKind::Vm, vm_name)?;
        let vcenter = session
            .vcenter(&vm.vcenter_name)?
            .require(EntityKind::Vcenter, &vm.vcenter_name)?;
        let (hostname, port) = parse_vcenter_url(&vcenter.url)?;

        let entry = self.vcenters.iter().find(|vc| vc.name == vcenter.name);
        if entry.is_none() {
            warn!(vcenter = %vcenter.name, "no credentials configured for vCenter");
        }

        Ok(ConnectionEndpoint {
            hostname,
            port,
            username: entry.map(|vc| vc.username.clone()),
            password: entry.map(|vc| vc.password.clone()),
        })
    }
}
