//! vCD Toolkit - helpers for automating a vCloud Director installation
//!
//! This crate wraps the platform SDK (through the [`platform`] traits) with
//! the workflows automation scripts keep re-implementing: resolving guest
//! connection endpoints, uploading images into catalogs, waiting on
//! platform tasks and waiting for guest tools to come up.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod download;
pub mod files;
pub mod guest;
pub mod http;
pub mod mock;
pub mod platform;
pub mod wait;

pub use vcd_protocol as protocol;

pub use catalog::{
    create_and_share_catalog, upload_image_to_catalog, wait_for_catalog_item_to_resolve,
    wait_for_item_task, UploadOptions, UploadOutcome,
};
pub use config::{Config, ConfigError};
pub use connection::{ConnectionEndpoint, ConnectionResolver, CONNECTION_CACHE_CAPACITY};
pub use guest::{progress_reporter, wait_until_tools_ready, GuestClient, GuestConnector, GuestError};
pub use platform::{Connector, Lookup, PlatformError, PlatformResult, Session, SYSTEM_ORG_NAME};
pub use wait::{CancelFlag, WaitInterrupted, WaitPolicy};

/// `"success"` or `"fail"`, the status words used in script output.
pub fn bool_to_msg(value: bool) -> &'static str {
    if value {
        "success"
    } else {
        "fail"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_to_msg() {
        assert_eq!(bool_to_msg(true), "success");
        assert_eq!(bool_to_msg(false), "fail");
    }
}
