//! Configuration
//!
//! Parses and validates the toolkit config file (TOML):
//!
//! ```toml
//! [vcd]
//! host = "vcd.example.com"
//! username = "administrator"
//! password = "..."
//! api_version = "31.0"
//! verify = true
//!
//! [[vcs]]
//! name = "vc1"
//! username = "administrator@vsphere.local"
//! password = "..."
//!
//! [wait]
//! task_poll_seconds = 5
//! ```
//!
//! `[vcd]` and each `[[vcs]]` entry are checked key-by-key against a
//! reference table before deserialization (see [`schema`]).

pub mod schema;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toml::{Table, Value};
use tracing::{debug, warn};

use crate::platform::{LoginCredentials, SYSTEM_ORG_NAME};
use crate::wait::WaitPolicy;

pub use schema::{check_keys_and_value_types, SchemaError};

/// Toolkit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Platform endpoint and system-org credentials
    pub vcd: VcdSettings,

    /// Per-vCenter credentials for guest automation, matched by name
    #[serde(default)]
    pub vcs: Vec<VcenterEntry>,

    /// Poll intervals and timeouts
    #[serde(default)]
    pub wait: WaitSettings,
}

/// Platform endpoint settings
#[derive(Clone, Serialize, Deserialize)]
pub struct VcdSettings {
    /// Platform host name or URL
    pub host: String,
    /// System administrator user
    pub username: String,
    pub password: String,
    /// API version to request
    pub api_version: String,
    /// Verify TLS certificates
    pub verify: bool,
}

impl fmt::Debug for VcdSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VcdSettings")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("verify", &self.verify)
            .finish()
    }
}

impl VcdSettings {
    /// Reference table for the key/type check
    pub fn reference() -> Table {
        let mut table = Table::new();
        table.insert("host".into(), Value::String(String::new()));
        table.insert("username".into(), Value::String(String::new()));
        table.insert("password".into(), Value::String(String::new()));
        table.insert("api_version".into(), Value::String(String::new()));
        table.insert("verify".into(), Value::Boolean(true));
        table
    }
}

/// Credentials for one vCenter
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcenterEntry {
    /// vCenter name as registered with the platform
    pub name: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for VcenterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VcenterEntry")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl VcenterEntry {
    /// Reference table for the key/type check
    pub fn reference() -> Table {
        let mut table = Table::new();
        table.insert("name".into(), Value::String(String::new()));
        table.insert("username".into(), Value::String(String::new()));
        table.insert("password".into(), Value::String(String::new()));
        table
    }
}

/// Wait settings; unset values fall back to [`WaitPolicy`] defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitSettings {
    pub task_poll_seconds: Option<u64>,
    /// Unset = wait for tasks forever
    pub task_timeout_seconds: Option<u64>,
    pub tools_poll_seconds: Option<u64>,
    /// Unset = wait for guest tools forever
    pub tools_timeout_seconds: Option<u64>,
}

impl WaitSettings {
    /// Policy for platform task waits
    pub fn task_policy(&self) -> WaitPolicy {
        WaitPolicy::from_config(self.task_poll_seconds, self.task_timeout_seconds)
    }

    /// Policy for guest tools readiness waits
    pub fn tools_policy(&self) -> WaitPolicy {
        WaitPolicy::from_config(self.tools_poll_seconds, self.tools_timeout_seconds)
    }
}

/// Errors that can occur when loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), vcenters = config.vcs.len(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let document: Table = content.parse()?;
        Self::check_schema(&document)?;

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn check_schema(document: &Table) -> Result<(), SchemaError> {
        let vcd = document
            .get("vcd")
            .ok_or_else(|| SchemaError::MissingSection("vcd".to_string()))?;
        check_keys_and_value_types(
            schema::table_at(vcd, "vcd section")?,
            &VcdSettings::reference(),
            "vcd section",
        )?;

        if let Some(vcs) = document.get("vcs") {
            let entries = vcs.as_array().ok_or_else(|| SchemaError::NotATable {
                location: "vcs section".to_string(),
            })?;
            let reference = VcenterEntry::reference();
            for (index, entry) in entries.iter().enumerate() {
                let location = format!("vcs entry {}", index);
                check_keys_and_value_types(schema::table_at(entry, &location)?, &reference, &location)?;
            }
        }
        Ok(())
    }

    /// Validate values the type check cannot catch
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vcd.host.trim().is_empty() {
            return Err(invalid("vcd.host", "must not be empty"));
        }
        if self.vcd.username.trim().is_empty() {
            return Err(invalid("vcd.username", "must not be empty"));
        }

        let mut seen = HashSet::new();
        for (index, vc) in self.vcs.iter().enumerate() {
            if vc.name.trim().is_empty() {
                return Err(invalid(&format!("vcs[{}].name", index), "must not be empty"));
            }
            if !seen.insert(vc.name.as_str()) {
                warn!(vcenter = %vc.name, "duplicate vCenter entry; the first one is used");
            }
        }

        for (field, policy) in [
            ("wait.task_poll_seconds", self.wait.task_policy()),
            ("wait.tools_poll_seconds", self.wait.tools_policy()),
        ] {
            policy
                .validate()
                .map_err(|e| invalid(field, &e.to_string()))?;
        }

        Ok(())
    }

    /// Credentials of the first vCenter entry with this name
    pub fn vcenter(&self, name: &str) -> Option<&VcenterEntry> {
        self.vcs.iter().find(|vc| vc.name == name)
    }

    /// System-org login for the configured administrator
    pub fn system_credentials(&self) -> LoginCredentials {
        LoginCredentials::new(
            self.vcd.username.clone(),
            SYSTEM_ORG_NAME,
            self.vcd.password.clone(),
        )
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const VALID: &str = r#"
[vcd]
host = "vcd.example.com"
username = "administrator"
password = "secret"
api_version = "31.0"
verify = true

[[vcs]]
name = "vc1"
username = "admin1"
password = "pw1"

[[vcs]]
name = "vc2"
username = "admin2"
password = "pw2"
"#;

    #[test]
    fn test_parse_valid() {
        let config = Config::parse(VALID).unwrap();
        assert_eq!(config.vcd.host, "vcd.example.com");
        assert_eq!(config.vcs.len(), 2);
        assert_eq!(config.vcenter("vc2").unwrap().username, "admin2");
        assert!(config.vcenter("vc3").is_none());
    }

    #[test]
    fn test_system_credentials() {
        let config = Config::parse(VALID).unwrap();
        let creds = config.system_credentials();
        assert_eq!(creds.org, "System");
        assert_eq!(creds.username, "administrator");
    }

    #[test]
    fn test_first_vcenter_match_wins() {
        let content = format!(
            "{}\n[[vcs]]\nname = \"vc1\"\nusername = \"other\"\npassword = \"x\"\n",
            VALID
        );
        let config = Config::parse(&content).unwrap();
        assert_eq!(config.vcenter("vc1").unwrap().username, "admin1");
    }

    #[test]
    fn test_missing_vcd_section() {
        let err = Config::parse("[[vcs]]\nname = \"vc1\"\nusername = \"u\"\npassword = \"p\"\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Schema(SchemaError::MissingSection(_))
        ));
    }

    #[test]
    fn test_missing_key_in_vcd() {
        let content = VALID.replace("api_version = \"31.0\"\n", "");
        let err = Config::parse(&content).unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::Keys { .. })));
    }

    #[test]
    fn test_wrong_type_in_vcs_entry() {
        let content = VALID.replace("password = \"pw2\"", "password = 2");
        let err = Config::parse(&content).unwrap_err();
        match err {
            ConfigError::Schema(SchemaError::ValueTypes { location, .. }) => {
                assert_eq!(location, "vcs entry 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_host_rejected() {
        let content = VALID.replace("host = \"vcd.example.com\"", "host = \"\"");
        let err = Config::parse(&content).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_wait_settings() {
        let content = format!("{}\n[wait]\ntask_poll_seconds = 2\ntask_timeout_seconds = 600\n", VALID);
        let config = Config::parse(&content).unwrap();
        let policy = config.wait.task_policy();
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert_eq!(policy.timeout, Some(Duration::from_secs(600)));
        assert!(config.wait.tools_policy().timeout.is_none());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let content = format!("{}\n[wait]\ntools_poll_seconds = 0\n", VALID);
        let err = Config::parse(&content).unwrap_err();
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "wait.tools_poll_seconds"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/vcd-toolkit.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let config = Config::parse(VALID).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("pw1"));
    }
}
