//! Org, VDC and catalog lookups shared by the workflows.

use tracing::debug;

use super::error::{EntityKind, PlatformResult};
use super::session::Session;
use super::types::{OrgRef, VdcRef};

/// Which org a workflow operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OrgSelector {
    /// The org the session is logged into
    #[default]
    Current,
    /// An org by name
    Named(String),
}

impl OrgSelector {
    /// `Named` when a name is given, `Current` otherwise.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(name) => OrgSelector::Named(name.to_string()),
            None => OrgSelector::Current,
        }
    }
}

/// Get the selected org.
pub fn get_org<S: Session>(session: &S, selector: &OrgSelector) -> PlatformResult<OrgRef> {
    match selector {
        OrgSelector::Current => session.current_org(),
        OrgSelector::Named(name) => session
            .org_by_name(name)?
            .require(EntityKind::Org, name.as_str()),
    }
}

/// Get a VDC of an org.
pub fn get_vdc<S: Session>(session: &S, org: &OrgRef, name: &str) -> PlatformResult<VdcRef> {
    session.vdc(org, name)?.require(EntityKind::Vdc, name)
}

/// Whether a catalog exists in the org.
pub fn catalog_exists<S: Session>(
    session: &S,
    org: &OrgRef,
    catalog: &str,
) -> PlatformResult<bool> {
    let exists = session.catalog(org, catalog)?.is_found();
    debug!(org = %org.name, catalog, exists, "checked catalog");
    Ok(exists)
}

/// Whether a catalog item exists, by name.
///
/// A missing catalog counts as a missing item.
pub fn catalog_item_exists<S: Session>(
    session: &S,
    org: &OrgRef,
    catalog: &str,
    item: &str,
) -> PlatformResult<bool> {
    match session.catalog_item(org, catalog, item) {
        Ok(lookup) => Ok(lookup.is_found()),
        Err(e) if e.is_not_found_kind(EntityKind::Catalog) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPlatform;

    fn platform() -> MockPlatform {
        let platform = MockPlatform::new("acme");
        platform.add_org("beta");
        platform.add_vdc("acme", "ovdc1");
        platform.add_catalog("acme", "templates");
        platform.add_catalog_item("acme", "templates", "ubuntu.ova");
        platform
    }

    #[test]
    fn test_get_current_org() {
        let platform = platform();
        let org = get_org(&platform, &OrgSelector::Current).unwrap();
        assert_eq!(org.name, "acme");
    }

    #[test]
    fn test_get_named_org() {
        let platform = platform();
        let org = get_org(&platform, &OrgSelector::from_name(Some("beta"))).unwrap();
        assert_eq!(org.name, "beta");
    }

    #[test]
    fn test_get_missing_org() {
        let platform = platform();
        let err = get_org(&platform, &OrgSelector::Named("nope".into())).unwrap_err();
        assert!(err.is_not_found_kind(EntityKind::Org));
    }

    #[test]
    fn test_get_vdc() {
        let platform = platform();
        let org = get_org(&platform, &OrgSelector::Current).unwrap();
        assert_eq!(get_vdc(&platform, &org, "ovdc1").unwrap().name, "ovdc1");
        assert!(get_vdc(&platform, &org, "ovdc2")
            .unwrap_err()
            .is_not_found_kind(EntityKind::Vdc));
    }

    #[test]
    fn test_catalog_and_item_exists() {
        let platform = platform();
        let org = get_org(&platform, &OrgSelector::Current).unwrap();
        assert!(catalog_exists(&platform, &org, "templates").unwrap());
        assert!(!catalog_exists(&platform, &org, "other").unwrap());
        assert!(catalog_item_exists(&platform, &org, "templates", "ubuntu.ova").unwrap());
        assert!(!catalog_item_exists(&platform, &org, "templates", "photon.ova").unwrap());
        assert!(!catalog_item_exists(&platform, &org, "other", "ubuntu.ova").unwrap());
    }
}
