//! Catalog lookups for every built-in metadata type.
//!
//! Each `#[case]` is isolated; no shared state.

use std::path::{Path, PathBuf};

use bumbo_core::{
    catalog::MetadataCatalog,
    types::{ComponentIdentity, ComponentRequest, MetadataTypeName},
    CoreError,
};
use rstest::rstest;

fn base() -> &'static Path {
    Path::new("/proj/force-app/main/default")
}

#[rstest]
#[case("ApexClass", "Foo", "classes/Foo.cls", "Foo.cls")]
#[case("ApexPage", "Home", "pages/Home.page", "Home.page")]
#[case("LightningComponentBundle", "card", "lwc/card", "card")]
#[case("AuraDefinitionBundle", "panel", "aura/panel", "panel")]
fn identity_and_remote_key(
    #[case] type_name: &str,
    #[case] name: &str,
    #[case] identity: &str,
    #[case] remote_key: &str,
) {
    let catalog = MetadataCatalog::builtin();
    let component = catalog
        .resolve_component(base(), &MetadataTypeName::from(type_name), name)
        .expect("resolve");
    assert_eq!(component.identity, ComponentIdentity::from(identity));
    assert_eq!(component.remote_key, remote_key);
}

#[test]
fn single_file_type_has_one_file() {
    let catalog = MetadataCatalog::builtin();
    let files = catalog
        .resolve_bundle_files(base(), &"ApexClass".into(), "Foo")
        .unwrap();
    assert_eq!(files, vec![base().join("classes").join("Foo.cls")]);
}

#[test]
fn bundle_type_lists_one_file_per_suffix_in_order() {
    let catalog = MetadataCatalog::builtin();
    let files = catalog
        .resolve_bundle_files(base(), &"AuraDefinitionBundle".into(), "panel")
        .unwrap();
    let dir = base().join("aura").join("panel");
    let expected: Vec<PathBuf> = [
        "panel.cmp",
        "panelController.js",
        "panelHelper.js",
        "panel.design",
        "panel.css",
    ]
    .iter()
    .map(|f| dir.join(f))
    .collect();
    assert_eq!(files, expected);
}

#[test]
fn unknown_type_is_an_error_everywhere() {
    let catalog = MetadataCatalog::builtin();
    let bogus = MetadataTypeName::from("CustomWidget");
    assert!(matches!(
        catalog.resolve_folder(&bogus),
        Err(CoreError::UnknownMetadataType { .. })
    ));
    assert!(matches!(
        catalog.resolve_extension(&bogus),
        Err(CoreError::UnknownMetadataType { .. })
    ));
    let err = catalog.resolve_identity(&bogus, "x").unwrap_err();
    assert_eq!(err.code(), "UnknownMetadataType");
    assert!(err.to_string().contains("CustomWidget"));
}

#[test]
fn resolve_requests_dedups_identities_across_requests() {
    let catalog = MetadataCatalog::builtin();
    let requests: Vec<ComponentRequest> = ["ApexClass:Foo,Bar", "ApexPage:Home", "ApexClass:Foo"]
        .iter()
        .map(|r| r.parse().unwrap())
        .collect();
    let components = catalog.resolve_requests(base(), &requests).unwrap();
    let ids: Vec<&str> = components.iter().map(|c| c.identity.0.as_str()).collect();
    assert_eq!(ids, vec!["classes/Foo.cls", "classes/Bar.cls", "pages/Home.page"]);
}
