use std::collections::HashSet;

use tempfile::tempdir;
use uuid::Uuid;

use super::*;
use crate::error::CatalogError;
use crate::models::{CountryCountFilter, YearRange};
use crate::status::StatusCode;

const FIXTURE: &str = include_str!("../../tests/fixtures/catalog_seed.yaml");

fn seeded_store() -> (SqliteCatalogStore, SeedReport) {
    let store = SqliteCatalogStore::open_in_memory().expect("open store");
    let doc = SeedDocument::from_yaml_str(FIXTURE).expect("parse fixture");
    let report = store.apply_seed(&doc).expect("apply fixture");
    (store, report)
}

fn id_of(report: &SeedReport, name: &str) -> Uuid {
    *report
        .minerals
        .get(name)
        .unwrap_or_else(|| panic!("fixture mineral missing: {name}"))
}

#[test]
fn fixture_seeds_every_mineral() {
    let (store, report) = seeded_store();
    assert_eq!(report.minerals.len(), 9);
    let quartz = store
        .mineral(id_of(&report, "Quartz"))
        .expect("lookup")
        .expect("quartz present");
    assert_eq!(quartz.formula, "SiO_2_");
    assert_eq!(quartz.ns_class, Some(4));
    assert_eq!(quartz.ns_mineral.as_deref(), Some("1"));
}

#[test]
fn unknown_mineral_is_absent_not_an_error() {
    let (store, _) = seeded_store();
    assert!(store.mineral(Uuid::new_v4()).expect("lookup").is_none());
    assert!(store.mineral_by_name("Nonexistite").expect("lookup").is_none());
    assert!(
        store
            .status_assignments(Uuid::new_v4())
            .expect("assignments")
            .is_empty()
    );
    assert!(store.history(Uuid::new_v4()).expect("history").is_none());
}

#[test]
fn mineral_by_name_ignores_case() {
    let (store, report) = seeded_store();
    let found = store
        .mineral_by_name("  almandine ")
        .expect("lookup")
        .expect("present");
    assert_eq!(found.id, id_of(&report, "Almandine"));
}

#[test]
fn list_minerals_filters_by_prefix_and_pages() {
    let (store, _) = seeded_store();
    let names = |rows: Vec<crate::models::MineralRecord>| {
        rows.into_iter().map(|row| row.name).collect::<Vec<_>>()
    };
    assert_eq!(
        names(store.list_minerals(Some("m"), 10, 0).expect("list")),
        vec!["Magnetite", "Mixtite"]
    );
    assert_eq!(
        names(store.list_minerals(None, 2, 1).expect("list")),
        vec!["Bergkristall", "Garnet"]
    );
    assert!(store.list_minerals(Some("%"), 10, 0).expect("list").is_empty());
}

#[test]
fn reachable_edges_follow_parents_upward_only() {
    let (store, report) = seeded_store();
    let edges = store
        .hierarchy_edges_reachable_from(id_of(&report, "Almandine"))
        .expect("edges");
    let minerals: HashSet<_> = edges.iter().map(|edge| edge.mineral_id).collect();
    assert_eq!(edges.len(), 3);
    assert!(minerals.contains(&id_of(&report, "Garnet")));
    assert!(minerals.contains(&id_of(&report, "Pyralspite")));
    assert!(!minerals.contains(&id_of(&report, "Quartz")));

    let root_only = store
        .hierarchy_edges_reachable_from(id_of(&report, "Garnet"))
        .expect("edges");
    assert_eq!(root_only.len(), 1);
    assert_eq!(root_only[0].parent_id, None);
}

#[test]
fn reachable_edges_terminate_on_cycles() {
    let (store, report) = seeded_store();
    let garnet = id_of(&report, "Garnet");
    let almandine = id_of(&report, "Almandine");
    store
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO mineral_hierarchy(mineral_id, parent_id) VALUES (?1, ?2)",
                rusqlite::params![garnet.to_string(), almandine.to_string()],
            )?;
            Ok(())
        })
        .expect("insert cyclic edge");
    let edges = store
        .hierarchy_edges_reachable_from(almandine)
        .expect("edges");
    assert_eq!(edges.len(), 4);
}

#[test]
fn hierarchy_children_lists_direct_children() {
    let (store, report) = seeded_store();
    assert_eq!(
        store
            .hierarchy_children(id_of(&report, "Garnet"))
            .expect("children"),
        vec![id_of(&report, "Pyralspite")]
    );
    assert!(
        store
            .hierarchy_children(id_of(&report, "Almandine"))
            .expect("children")
            .is_empty()
    );
}

#[test]
fn status_assignments_carry_groups_and_every_relation_row() {
    let (store, report) = seeded_store();
    let assignments = store
        .status_assignments(id_of(&report, "Mixtite"))
        .expect("assignments");
    assert_eq!(assignments.len(), 1);
    let mixture = &assignments[0];
    assert_eq!(mixture.status_id, StatusCode::MIXTURE_SPECIES);
    assert_eq!(
        mixture.group.as_ref().map(|group| group.name.as_str()),
        Some("Mixture")
    );
    assert_eq!(mixture.relations.len(), 2);
    assert_eq!(mixture.relations[0].mineral_name, "Quartz");
    assert_eq!(mixture.relations[0].relation_type_id, None);
    assert_eq!(mixture.relations[0].direct_relation, None);
    assert_eq!(mixture.relations[1].relation_type_id, Some(2));
}

#[test]
fn status_assignments_keep_assignment_order() {
    let (store, report) = seeded_store();
    let codes: Vec<_> = store
        .status_assignments(id_of(&report, "Bergkristall"))
        .expect("assignments")
        .iter()
        .map(|assignment| assignment.status_id.to_string())
        .collect();
    assert_eq!(codes, vec!["2.2", "0.0"]);
}

#[test]
fn minerals_with_statuses_skips_unknown_ids() {
    let (store, report) = seeded_store();
    let nodes = store
        .minerals_with_statuses(&[id_of(&report, "Garnet"), Uuid::new_v4()])
        .expect("nodes");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].statuses, vec![StatusCode::from_parts(1, 0)]);
    assert!(store.minerals_with_statuses(&[]).expect("nodes").is_empty());
}

#[test]
fn crystal_structures_cover_the_requested_set() {
    let (store, report) = seeded_store();
    let structures = store
        .crystal_structures(&[id_of(&report, "Quartz"), id_of(&report, "Magnetite")])
        .expect("structures");
    assert_eq!(structures.len(), 3);
    assert!(store.crystal_structures(&[]).expect("structures").is_empty());
}

#[test]
fn country_counts_order_by_count_then_name() {
    let (store, _) = seeded_store();
    let counts = store
        .discovery_country_counts(&CountryCountFilter::default())
        .expect("counts");
    let flat: Vec<_> = counts
        .iter()
        .map(|count| (count.name.as_str(), count.count))
        .collect();
    assert_eq!(
        flat,
        vec![("Germany", 3), ("Austria", 2), ("Norway", 2), ("Brazil", 1)]
    );

    let top = store
        .discovery_country_counts(&CountryCountFilter {
            mineral_ids: None,
            limit: Some(2),
        })
        .expect("counts");
    assert_eq!(top.len(), 2);
}

#[test]
fn country_counts_for_an_empty_mineral_set_are_empty() {
    let (store, _) = seeded_store();
    let counts = store
        .discovery_country_counts(&CountryCountFilter {
            mineral_ids: Some(Vec::new()),
            limit: None,
        })
        .expect("counts");
    assert!(counts.is_empty());
}

#[test]
fn year_counts_respect_bounds() {
    let (store, _) = seeded_store();
    let years = |range| {
        store
            .discovery_year_counts(range)
            .expect("years")
            .into_iter()
            .map(|bucket| bucket.year)
            .collect::<Vec<_>>()
    };
    assert_eq!(
        years(YearRange {
            min: 1800,
            max: None
        }),
        vec![1850, 1900, 1950]
    );
    assert_eq!(
        years(YearRange {
            min: 1900,
            max: Some(1949)
        }),
        vec![1900]
    );
}

#[test]
fn year_counts_fall_back_to_the_upper_bound() {
    let store = SqliteCatalogStore::open_in_memory().expect("open store");
    let doc = SeedDocument::from_json_str(
        r#"{
            "minerals": [
                {"name": "Upperite", "history": {"discovery_year_max": 1950}},
                {"name": "Exactite", "history": {"discovery_year_min": 1950, "discovery_year_max": 1950}},
                {"name": "Undatedite", "history": {"discovery_year_note": "unknown"}}
            ]
        }"#,
    )
    .expect("parse seed");
    store.apply_seed(&doc).expect("apply seed");

    let years = store
        .discovery_year_counts(YearRange {
            min: 1800,
            max: None,
        })
        .expect("years");
    assert_eq!(years.len(), 1);
    assert_eq!(years[0].year, 1950);
    assert_eq!(years[0].count, 2);

    let above = store
        .discovery_year_counts(YearRange {
            min: 1951,
            max: None,
        })
        .expect("years");
    assert!(above.is_empty());
}

#[test]
fn status_counts_cover_assigned_statuses_only() {
    let (store, _) = seeded_store();
    let rows = store.status_counts().expect("counts");
    let approved = rows
        .iter()
        .find(|row| row.status_id == StatusCode::IMA_APPROVED)
        .expect("approved row");
    assert_eq!(approved.count, 4);
    assert!(
        rows.iter()
            .all(|row| row.status_id != StatusCode::from_parts(9, 0))
    );
}

#[test]
fn ns_lookup_resolves_level_descriptions() {
    let (store, report) = seeded_store();
    let almandine = store
        .mineral(id_of(&report, "Almandine"))
        .expect("lookup")
        .expect("present");
    let lookup = store.ns_lookup(&almandine).expect("ns lookup");
    assert_eq!(lookup.class_description.as_deref(), Some("Silicates"));
    assert_eq!(lookup.subclass_description.as_deref(), Some("Nesosilicates"));
    assert!(lookup.family_description.is_some());
}

#[test]
fn reseeding_is_idempotent() {
    let (store, first) = seeded_store();
    let doc = SeedDocument::from_yaml_str(FIXTURE).expect("parse fixture");
    let second = store.apply_seed(&doc).expect("reseed");
    assert_eq!(first, second);
    let assignments = store
        .status_assignments(id_of(&second, "Bergkristall"))
        .expect("assignments");
    assert_eq!(assignments.len(), 2);
    assert_eq!(
        store
            .hierarchy_edges_reachable_from(id_of(&second, "Almandine"))
            .expect("edges")
            .len(),
        3
    );
}

#[test]
fn seed_rejects_unknown_relation_target_and_rolls_back() {
    let store = SqliteCatalogStore::open_in_memory().expect("open store");
    let doc = SeedDocument::from_json_str(
        r#"{
            "status_groups": [{"id": 22, "name": "Common Synonym"}],
            "statuses": [{"id": 2.2, "group": 22, "description_short": "common synonym"}],
            "minerals": [{
                "name": "Lonely",
                "statuses": [{"status": 2.2, "relations": [{"mineral": "Missing"}]}]
            }]
        }"#,
    )
    .expect("parse seed");
    let err = store.apply_seed(&doc).expect_err("must fail");
    assert!(matches!(err, CatalogError::Validation(_)));
    assert!(store.mineral_by_name("Lonely").expect("lookup").is_none());
}

#[test]
fn seed_rejects_unknown_fields() {
    let err = SeedDocument::from_json_str(r#"{"minerals": [], "extra": 1}"#)
        .expect_err("must fail");
    assert!(matches!(err, CatalogError::Json(_)));
}

#[test]
fn seed_from_path_picks_format_by_extension() {
    let dir = tempdir().expect("tempdir");
    let yaml = dir.path().join("seed.yml");
    std::fs::write(&yaml, "countries:\n  - id: 7\n    name: Chile\n").expect("write yaml");
    let doc = SeedDocument::from_path(&yaml).expect("load yaml");
    assert_eq!(doc.countries.len(), 1);

    let toml = dir.path().join("seed.toml");
    std::fs::write(&toml, "").expect("write toml");
    let err = SeedDocument::from_path(&toml).expect_err("must fail");
    assert!(matches!(err, CatalogError::Validation(_)));
}

#[test]
fn on_disk_store_persists_between_opens() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("catalog.sqlite3");
    {
        let store = SqliteCatalogStore::open(&path).expect("open");
        let doc = SeedDocument::from_yaml_str(FIXTURE).expect("parse fixture");
        store.apply_seed(&doc).expect("seed");
    }
    let reopened = SqliteCatalogStore::open(&path).expect("reopen");
    assert!(
        reopened
            .mineral_by_name("Quartz")
            .expect("lookup")
            .is_some()
    );
}
