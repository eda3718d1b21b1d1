//! Catalog Workflows
//!
//! Uploading images into catalogs and waiting for the resulting items to
//! finish processing.
//!
//! # Upload flow
//!
//! ```text
//! resolve org ─► update? ─yes─► delete item ─► reload org ─► drain delete task ─┐
//!                  │                                                             │
//!                  no ─► item exists? ─yes─► AlreadyPresent                      │
//!                              │                                                 │
//!                              no ─► upload ─► reload org ─► wait upload task ◄──┘
//! ```

mod task;

use std::path::Path;

use tracing::{debug, info};

use crate::platform::{
    catalog_exists, get_org, CatalogRef, EntityKind, Lookup, OrgRef, OrgSelector, PlatformError,
    PlatformResult, Session,
};
use crate::wait::WaitPolicy;

pub use task::{wait_for_catalog_item_to_resolve, wait_for_item_task, wait_for_task};

/// Options for [`upload_image_to_catalog`].
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Replace an existing item instead of keeping it
    pub update: bool,
    /// Org to upload into; takes precedence over `org_name`
    pub org: Option<OrgRef>,
    /// Org name, used when `org` is unset; the session's org otherwise
    pub org_name: Option<String>,
    /// Policy for every task wait in the upload
    pub wait: WaitPolicy,
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn in_org(mut self, org: OrgRef) -> Self {
        self.org = Some(org);
        self
    }

    pub fn in_org_named(mut self, name: impl Into<String>) -> Self {
        self.org_name = Some(name.into());
        self
    }

    pub fn wait(mut self, policy: WaitPolicy) -> Self {
        self.wait = policy;
        self
    }

    fn resolve_org<S: Session>(&self, session: &S) -> PlatformResult<OrgRef> {
        match &self.org {
            Some(org) => Ok(org.clone()),
            None => get_org(session, &OrgSelector::from_name(self.org_name.as_deref())),
        }
    }
}

/// What [`upload_image_to_catalog`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// New item uploaded and resolved
    Uploaded,
    /// Existing item deleted, then re-uploaded and resolved
    Replaced,
    /// Item already present and `update` was not set; nothing uploaded
    AlreadyPresent,
}

/// Upload an image file into a catalog and wait until the platform has
/// finished processing it.
///
/// The item is named after the file's base name. Not-found and rejected
/// uploads propagate unretried.
pub fn upload_image_to_catalog<S: Session>(
    session: &S,
    catalog: &str,
    source: &Path,
    options: &UploadOptions,
) -> PlatformResult<UploadOutcome> {
    let mut org = options.resolve_org(session)?;
    let item = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PlatformError::InvalidSource(source.to_path_buf()))?;

    let mut replaced = false;
    if options.update {
        if let Lookup::Found(()) = session.delete_catalog_item(&org, catalog, &item)? {
            info!(org = %org.name, catalog, item = %item, "deleted catalog item for update");
            org = session.reload_org(&org)?;
            drain_deleted_item(session, &org, catalog, &item, &options.wait)?;
            replaced = true;
        }
    } else if session.catalog_item(&org, catalog, &item)?.is_found() {
        info!(org = %org.name, catalog, item = %item, "catalog item already present; skipping upload");
        return Ok(UploadOutcome::AlreadyPresent);
    }

    info!(org = %org.name, catalog, item = %item, source = %source.display(), "uploading image");
    session.upload_ovf(&org, catalog, source)?;
    let org = session.reload_org(&org)?;
    wait_for_item_task(session, &org, catalog, &item, &options.wait)?;

    info!(catalog, item = %item, "image upload resolved");
    Ok(if replaced {
        UploadOutcome::Replaced
    } else {
        UploadOutcome::Uploaded
    })
}

/// Wait for a deleted item's task; an item already gone counts as drained.
fn drain_deleted_item<S: Session>(
    session: &S,
    org: &OrgRef,
    catalog: &str,
    item: &str,
    policy: &WaitPolicy,
) -> PlatformResult<()> {
    match wait_for_item_task(session, org, catalog, item, policy) {
        Err(e)
            if e.is_not_found_kind(EntityKind::CatalogItem)
                || e.is_not_found_kind(EntityKind::Resource) =>
        {
            debug!(catalog, item, "deleted item already gone");
            Ok(())
        }
        other => other,
    }
}

/// Create a catalog if missing and share it with every org.
///
/// Returns the catalog as seen after the final org reload.
pub fn create_and_share_catalog<S: Session>(
    session: &S,
    org: &OrgRef,
    name: &str,
    description: &str,
) -> PlatformResult<CatalogRef> {
    let mut org = org.clone();
    if catalog_exists(session, &org, name)? {
        debug!(org = %org.name, catalog = name, "catalog already exists");
    } else {
        session.create_catalog(&org, name, description)?;
        info!(org = %org.name, catalog = name, "created catalog");
        org = session.reload_org(&org)?;
    }

    session.share_catalog(&org, name)?;
    info!(org = %org.name, catalog = name, "shared catalog with all orgs");
    let org = session.reload_org(&org)?;
    session.catalog(&org, name)?.require(EntityKind::Catalog, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockOp, MockPlatform};

    #[test]
    fn test_create_and_share_new_catalog() {
        let platform = MockPlatform::new("acme");
        let org = platform.current_org().unwrap();

        let catalog = create_and_share_catalog(&platform, &org, "templates", "images").unwrap();
        assert_eq!(catalog.name, "templates");
        assert!(catalog.shared);
        assert_eq!(platform.calls(MockOp::CreateCatalog), 1);
        assert_eq!(platform.reloads("acme"), 2);
    }

    #[test]
    fn test_create_and_share_existing_catalog() {
        let platform = MockPlatform::new("acme");
        platform.add_catalog("acme", "templates");
        let org = platform.current_org().unwrap();

        let catalog = create_and_share_catalog(&platform, &org, "templates", "images").unwrap();
        assert!(catalog.shared);
        assert_eq!(platform.calls(MockOp::CreateCatalog), 0);
        assert_eq!(platform.reloads("acme"), 1);
        assert!(platform.is_shared("acme", "templates"));
    }

    #[test]
    fn test_upload_without_file_name() {
        let platform = MockPlatform::new("acme");
        platform.add_catalog("acme", "templates");
        let err =
            upload_image_to_catalog(&platform, "templates", Path::new("/"), &UploadOptions::new())
                .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidSource(_)));
        assert_eq!(platform.calls(MockOp::UploadOvf), 0);
    }

    #[test]
    fn test_options_prefer_explicit_org() {
        let platform = MockPlatform::new("acme");
        let beta = platform.add_org("beta");
        let options = UploadOptions::new().in_org_named("acme").in_org(beta);
        assert_eq!(options.resolve_org(&platform).unwrap().name, "beta");
    }
}
