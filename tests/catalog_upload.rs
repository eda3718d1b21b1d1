//! Catalog upload workflow tests against the mock platform.

use std::path::Path;
use std::time::Duration;

use vcd_toolkit::mock::{FailureConfig, MockOp, MockPlatform};
use vcd_toolkit::platform::EntityKind;
use vcd_toolkit::{upload_image_to_catalog, PlatformError, UploadOptions, UploadOutcome, WaitPolicy};

fn fast() -> WaitPolicy {
    WaitPolicy::unbounded(Duration::from_millis(1))
}

fn options() -> UploadOptions {
    UploadOptions::new().wait(fast())
}

fn platform() -> MockPlatform {
    let platform = MockPlatform::new("acme");
    platform.add_catalog("acme", "templates");
    platform
}

// =============================================================================
// Fresh uploads
// =============================================================================

#[test]
fn test_upload_new_image() {
    let platform = platform();

    let outcome = upload_image_to_catalog(
        &platform,
        "templates",
        Path::new("/tmp/images/image.ova"),
        &options(),
    )
    .unwrap();

    assert_eq!(outcome, UploadOutcome::Uploaded);
    assert!(platform.has_item("acme", "templates", "image.ova"));
    assert_eq!(platform.calls(MockOp::UploadOvf), 1);
    assert_eq!(platform.reloads("acme"), 1);
}

#[test]
fn test_upload_waits_for_item_task() {
    let platform = platform();
    platform.set_task_polls(3);

    upload_image_to_catalog(&platform, "templates", Path::new("image.ova"), &options()).unwrap();

    // Three pending polls, then the one that sees success.
    assert_eq!(platform.calls(MockOp::TaskStatus), 4);
}

#[test]
fn test_upload_call_order() {
    let platform = platform();
    platform.set_task_polls(0);

    upload_image_to_catalog(&platform, "templates", Path::new("image.ova"), &options()).unwrap();

    assert_eq!(
        platform.journal(),
        vec![
            MockOp::CurrentOrg,
            MockOp::CatalogItem,
            MockOp::UploadOvf,
            MockOp::ReloadOrg,
            MockOp::CatalogItem,
            MockOp::ResourceTasks,
            MockOp::TaskStatus,
        ]
    );
}

#[test]
fn test_upload_into_named_org() {
    let platform = platform();
    platform.add_org("beta");
    platform.add_catalog("beta", "shared");

    upload_image_to_catalog(
        &platform,
        "shared",
        Path::new("image.ova"),
        &options().in_org_named("beta"),
    )
    .unwrap();

    assert!(platform.has_item("beta", "shared", "image.ova"));
    assert!(!platform.has_item("acme", "shared", "image.ova"));
}

// =============================================================================
// Existing items
// =============================================================================

#[test]
fn test_existing_item_is_left_alone() {
    let platform = platform();
    platform.add_catalog_item("acme", "templates", "image.ova");

    let outcome =
        upload_image_to_catalog(&platform, "templates", Path::new("image.ova"), &options())
            .unwrap();

    assert_eq!(outcome, UploadOutcome::AlreadyPresent);
    assert_eq!(platform.calls(MockOp::UploadOvf), 0);
    assert_eq!(platform.calls(MockOp::DeleteCatalogItem), 0);
    assert_eq!(platform.calls(MockOp::TaskStatus), 0);
}

#[test]
fn test_update_replaces_item_in_order() {
    let platform = platform();
    platform.add_catalog_item("acme", "templates", "image.ova");
    platform.set_task_polls(0);

    let outcome = upload_image_to_catalog(
        &platform,
        "templates",
        Path::new("image.ova"),
        &options().update(true),
    )
    .unwrap();

    assert_eq!(outcome, UploadOutcome::Replaced);
    assert_eq!(
        platform.journal(),
        vec![
            MockOp::CurrentOrg,
            MockOp::DeleteCatalogItem,
            MockOp::ReloadOrg,
            MockOp::CatalogItem,
            MockOp::ResourceTasks,
            MockOp::TaskStatus,
            MockOp::UploadOvf,
            MockOp::ReloadOrg,
            MockOp::CatalogItem,
            MockOp::ResourceTasks,
            MockOp::TaskStatus,
        ]
    );
    assert!(platform.has_item("acme", "templates", "image.ova"));
    assert_eq!(platform.reloads("acme"), 2);
}

#[test]
fn test_update_drains_slow_delete_before_upload() {
    let platform = platform();
    platform.add_catalog_item("acme", "templates", "image.ova");
    platform.set_task_polls(2);

    upload_image_to_catalog(
        &platform,
        "templates",
        Path::new("image.ova"),
        &options().update(true),
    )
    .unwrap();

    let journal = platform.journal();
    let upload = journal
        .iter()
        .position(|op| *op == MockOp::UploadOvf)
        .unwrap();
    let polls_before_upload = journal[..upload]
        .iter()
        .filter(|op| **op == MockOp::TaskStatus)
        .count();
    assert_eq!(polls_before_upload, 3);
}

#[test]
fn test_update_without_existing_item_uploads() {
    let platform = platform();

    let outcome = upload_image_to_catalog(
        &platform,
        "templates",
        Path::new("image.ova"),
        &options().update(true),
    )
    .unwrap();

    assert_eq!(outcome, UploadOutcome::Uploaded);
    assert_eq!(platform.calls(MockOp::DeleteCatalogItem), 1);
    assert_eq!(platform.reloads("acme"), 1);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_failed_upload_task() {
    let platform = platform();
    platform.fail_next_task("import failed: disk full");

    let err = upload_image_to_catalog(&platform, "templates", Path::new("image.ova"), &options())
        .unwrap_err();

    match err {
        PlatformError::TaskFailed { message, .. } => {
            assert_eq!(message, "import failed: disk full")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_rejected_upload_is_not_retried() {
    let platform = platform();
    platform.inject(MockOp::UploadOvf, FailureConfig::upload_rejected("quota exceeded"));

    let err = upload_image_to_catalog(&platform, "templates", Path::new("image.ova"), &options())
        .unwrap_err();

    assert!(matches!(err, PlatformError::UploadRejected(_)));
    assert_eq!(platform.calls(MockOp::UploadOvf), 1);
    assert_eq!(platform.calls(MockOp::TaskStatus), 0);
}

#[test]
fn test_missing_catalog() {
    let platform = MockPlatform::new("acme");

    let err = upload_image_to_catalog(&platform, "templates", Path::new("image.ova"), &options())
        .unwrap_err();

    assert!(err.is_not_found_kind(EntityKind::Catalog));
    assert_eq!(platform.calls(MockOp::UploadOvf), 0);
}

#[test]
fn test_missing_catalog_in_update_mode() {
    let platform = MockPlatform::new("acme");

    let err = upload_image_to_catalog(
        &platform,
        "templates",
        Path::new("image.ova"),
        &options().update(true),
    )
    .unwrap_err();

    assert!(err.is_not_found_kind(EntityKind::Catalog));
    assert_eq!(platform.calls(MockOp::UploadOvf), 0);
}

#[test]
fn test_missing_org() {
    let platform = platform();

    let err = upload_image_to_catalog(
        &platform,
        "templates",
        Path::new("image.ova"),
        &options().in_org_named("nope"),
    )
    .unwrap_err();

    assert!(err.is_not_found_kind(EntityKind::Org));
}

#[test]
fn test_repeated_upload_is_idempotent() {
    let platform = platform();

    let first = upload_image_to_catalog(&platform, "templates", Path::new("image.ova"), &options())
        .unwrap();
    let second = upload_image_to_catalog(&platform, "templates", Path::new("image.ova"), &options())
        .unwrap();

    assert_eq!(first, UploadOutcome::Uploaded);
    assert_eq!(second, UploadOutcome::AlreadyPresent);
    assert_eq!(platform.calls(MockOp::UploadOvf), 1);
}
