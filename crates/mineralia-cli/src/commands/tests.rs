use std::path::Path;

use mineralia_core::{Catalog, CatalogConfig, SqliteCatalogStore};
use tempfile::tempdir;

use super::support::resolve_mineral_id;

fn fixture_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../mineralia-core/tests/fixtures/catalog_seed.yaml")
}

fn seeded_catalog(dir: &Path) -> Catalog<SqliteCatalogStore> {
    let store = SqliteCatalogStore::open(dir.join("catalog.sqlite3")).expect("open store");
    let doc = mineralia_core::store::SeedDocument::from_path(fixture_path()).expect("fixture");
    store.apply_seed(&doc).expect("seed");
    Catalog::new(store, CatalogConfig::default())
}

#[test]
fn mineral_argument_accepts_names_and_ids() {
    let dir = tempdir().expect("tempdir");
    let catalog = seeded_catalog(dir.path());
    let by_name = resolve_mineral_id(&catalog, "quartz").expect("by name");
    let by_id = resolve_mineral_id(&catalog, &by_name.to_string()).expect("by id");
    assert_eq!(by_name, by_id);
}

#[test]
fn unknown_mineral_name_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let catalog = seeded_catalog(dir.path());
    let err = resolve_mineral_id(&catalog, "Nonexistite").expect_err("must fail");
    assert!(err.to_string().contains("Nonexistite"));
}
