use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension, Transaction, params};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::models::{CrystallographyRecord, HistoryRecord};
use crate::status::StatusCode;

use super::SqliteCatalogStore;

/// Catalog content loaded from a JSON or YAML document.
///
/// Minerals reference each other by name; reference tables by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedDocument {
    #[serde(default)]
    pub ns_classes: Vec<SeedNsClass>,
    #[serde(default)]
    pub ns_subclasses: Vec<SeedNsSubclass>,
    #[serde(default)]
    pub ns_families: Vec<SeedNsFamily>,
    #[serde(default)]
    pub status_groups: Vec<SeedStatusGroup>,
    #[serde(default)]
    pub statuses: Vec<SeedStatus>,
    #[serde(default)]
    pub relation_types: Vec<SeedRelationType>,
    #[serde(default)]
    pub countries: Vec<SeedCountry>,
    #[serde(default)]
    pub minerals: Vec<SeedMineral>,
    #[serde(default)]
    pub hierarchy: Vec<SeedHierarchyEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedNsClass {
    pub id: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedNsSubclass {
    pub code: String,
    pub ns_class: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedNsFamily {
    pub code: String,
    pub ns_class: i64,
    #[serde(default)]
    pub ns_subclass: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedStatusGroup {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedStatus {
    pub id: StatusCode,
    #[serde(default)]
    pub group: Option<i64>,
    pub description_short: String,
    #[serde(default)]
    pub description_long: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRelationType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCountry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub iso_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedMineral {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub ns_class: Option<i64>,
    #[serde(default)]
    pub ns_subclass: Option<String>,
    #[serde(default)]
    pub ns_family: Option<String>,
    #[serde(default)]
    pub ns_mineral: Option<String>,
    #[serde(default)]
    pub statuses: Vec<SeedMineralStatus>,
    /// Country ids of discovery localities.
    #[serde(default)]
    pub countries: Vec<i64>,
    #[serde(default)]
    pub history: Option<HistoryRecord>,
    #[serde(default)]
    pub crystallography: Option<CrystallographyRecord>,
    #[serde(default)]
    pub structures: Vec<SeedStructure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedMineralStatus {
    pub status: StatusCode,
    #[serde(default = "default_direct")]
    pub direct: bool,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub relations: Vec<SeedRelation>,
}

fn default_direct() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRelation {
    /// Name of the related mineral.
    pub mineral: String,
    #[serde(default)]
    pub relation_type: Option<i64>,
    #[serde(default)]
    pub direct: Option<bool>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedStructure {
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub a: Option<f64>,
    #[serde(default)]
    pub b: Option<f64>,
    #[serde(default)]
    pub c: Option<f64>,
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub gamma: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedHierarchyEdge {
    pub mineral: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Ids of the minerals a seed touched, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub minerals: BTreeMap<String, Uuid>,
}

impl SeedDocument {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_norway::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::from_json_str(&raw),
            Some("yaml" | "yml") => Self::from_yaml_str(&raw),
            _ => Err(CatalogError::Validation(format!(
                "unsupported seed file extension: {}",
                path.display()
            ))),
        }
    }
}

impl SqliteCatalogStore {
    /// Upsert a seed document in one transaction.
    ///
    /// Reseeding a mineral replaces its statuses, relations, countries,
    /// structures and hierarchy edges.
    pub fn apply_seed(&self, doc: &SeedDocument) -> Result<SeedReport> {
        self.with_tx(|tx| {
            upsert_reference_tables(tx, doc)?;

            let now = Utc::now().to_rfc3339();
            let mut report = SeedReport::default();
            for mineral in &doc.minerals {
                let id = upsert_mineral(tx, mineral, &now)?;
                report.minerals.insert(mineral.name.trim().to_string(), id);
            }
            for mineral in &doc.minerals {
                let id = resolve_mineral(tx, &report, &mineral.name)?;
                replace_mineral_details(tx, &report, id, mineral, &now)?;
            }
            replace_hierarchy(tx, &report, &doc.hierarchy)?;
            Ok(report)
        })
    }
}

fn upsert_reference_tables(tx: &Transaction<'_>, doc: &SeedDocument) -> Result<()> {
    for class in &doc.ns_classes {
        tx.execute(
            "INSERT INTO ns_class(id, description) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET description = excluded.description",
            params![class.id, class.description],
        )?;
    }
    for subclass in &doc.ns_subclasses {
        tx.execute(
            "INSERT INTO ns_subclass(code, ns_class, description) VALUES (?1, ?2, ?3)
             ON CONFLICT(code) DO UPDATE SET
                ns_class = excluded.ns_class,
                description = excluded.description",
            params![subclass.code, subclass.ns_class, subclass.description],
        )?;
    }
    for family in &doc.ns_families {
        tx.execute(
            "INSERT INTO ns_family(code, ns_class, ns_subclass, description) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(code) DO UPDATE SET
                ns_class = excluded.ns_class,
                ns_subclass = excluded.ns_subclass,
                description = excluded.description",
            params![
                family.code,
                family.ns_class,
                family.ns_subclass,
                family.description
            ],
        )?;
    }
    for group in &doc.status_groups {
        tx.execute(
            "INSERT INTO status_group(id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![group.id, group.name],
        )?;
    }
    for status in &doc.statuses {
        tx.execute(
            "INSERT INTO status(id, status_group_id, description_short, description_long)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                status_group_id = excluded.status_group_id,
                description_short = excluded.description_short,
                description_long = excluded.description_long",
            params![
                status.id.as_f64(),
                status.group,
                status.description_short,
                status.description_long
            ],
        )?;
    }
    for relation_type in &doc.relation_types {
        tx.execute(
            "INSERT INTO relation_type(id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![relation_type.id, relation_type.name],
        )?;
    }
    for country in &doc.countries {
        tx.execute(
            "INSERT INTO country(id, name, iso_code) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                iso_code = excluded.iso_code",
            params![country.id, country.name, country.iso_code],
        )?;
    }
    Ok(())
}

fn upsert_mineral(tx: &Transaction<'_>, mineral: &SeedMineral, now: &str) -> Result<Uuid> {
    let name = mineral.name.trim();
    if name.is_empty() {
        return Err(CatalogError::Validation(
            "seed mineral name must not be empty".to_string(),
        ));
    }
    let existing = mineral_id_by_name(tx, name)?;
    let id = match (existing, mineral.id) {
        (Some(existing), Some(requested)) if existing != requested => {
            return Err(CatalogError::Validation(format!(
                "seed mineral {name} has id {requested} but the catalog stores it as {existing}"
            )));
        }
        (Some(existing), _) => existing,
        (None, requested) => requested.unwrap_or_else(Uuid::new_v4),
    };
    tx.execute(
        "INSERT INTO mineral(
            id, name, formula, note, ns_class, ns_subclass, ns_family, ns_mineral,
            created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            formula = excluded.formula,
            note = excluded.note,
            ns_class = excluded.ns_class,
            ns_subclass = excluded.ns_subclass,
            ns_family = excluded.ns_family,
            ns_mineral = excluded.ns_mineral,
            updated_at = excluded.updated_at",
        params![
            id.to_string(),
            name,
            mineral.formula,
            mineral.note,
            mineral.ns_class,
            mineral.ns_subclass,
            mineral.ns_family,
            mineral.ns_mineral,
            now
        ],
    )?;
    Ok(id)
}

fn replace_mineral_details(
    tx: &Transaction<'_>,
    report: &SeedReport,
    id: Uuid,
    mineral: &SeedMineral,
    now: &str,
) -> Result<()> {
    let key = id.to_string();
    tx.execute(
        "DELETE FROM mineral_status WHERE mineral_id = ?1",
        params![key],
    )?;
    tx.execute(
        "DELETE FROM mineral_country WHERE mineral_id = ?1",
        params![key],
    )?;
    tx.execute(
        "DELETE FROM mineral_structure WHERE mineral_id = ?1",
        params![key],
    )?;

    for status in &mineral.statuses {
        tx.execute(
            "INSERT INTO mineral_status(mineral_id, status_id, direct_status, author, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![key, status.status.as_f64(), status.direct, status.author, now],
        )?;
        let assignment_id = tx.last_insert_rowid();
        for relation in &status.relations {
            let related = resolve_mineral(tx, report, &relation.mineral)?;
            tx.execute(
                "INSERT INTO mineral_relation(
                    mineral_id, mineral_status_id, relation_id, relation_type_id,
                    direct_relation, relation_note
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    key,
                    assignment_id,
                    related.to_string(),
                    relation.relation_type,
                    relation.direct,
                    relation.note
                ],
            )?;
        }
    }

    for country_id in &mineral.countries {
        tx.execute(
            "INSERT OR IGNORE INTO mineral_country(mineral_id, country_id) VALUES (?1, ?2)",
            params![key, country_id],
        )?;
    }

    match &mineral.history {
        Some(history) => {
            tx.execute(
                "INSERT INTO mineral_history(
                    mineral_id, discovery_year_min, discovery_year_max, discovery_year_note,
                    ima_year, publication_year
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(mineral_id) DO UPDATE SET
                    discovery_year_min = excluded.discovery_year_min,
                    discovery_year_max = excluded.discovery_year_max,
                    discovery_year_note = excluded.discovery_year_note,
                    ima_year = excluded.ima_year,
                    publication_year = excluded.publication_year",
                params![
                    key,
                    history.discovery_year_min,
                    history.discovery_year_max,
                    history.discovery_year_note,
                    history.ima_year,
                    history.publication_year
                ],
            )?;
        }
        None => {
            tx.execute(
                "DELETE FROM mineral_history WHERE mineral_id = ?1",
                params![key],
            )?;
        }
    }

    match &mineral.crystallography {
        Some(crystallography) => {
            tx.execute(
                "INSERT INTO mineral_crystallography(
                    mineral_id, crystal_system, crystal_class, space_group, note
                 ) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(mineral_id) DO UPDATE SET
                    crystal_system = excluded.crystal_system,
                    crystal_class = excluded.crystal_class,
                    space_group = excluded.space_group,
                    note = excluded.note",
                params![
                    key,
                    crystallography.crystal_system,
                    crystallography.crystal_class,
                    crystallography.space_group,
                    crystallography.note
                ],
            )?;
        }
        None => {
            tx.execute(
                "DELETE FROM mineral_crystallography WHERE mineral_id = ?1",
                params![key],
            )?;
        }
    }

    for structure in &mineral.structures {
        tx.execute(
            "INSERT INTO mineral_structure(
                mineral_id, formula, a, b, c, alpha, beta, gamma, volume, reference
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                key,
                structure.formula,
                structure.a,
                structure.b,
                structure.c,
                structure.alpha,
                structure.beta,
                structure.gamma,
                structure.volume,
                structure.reference
            ],
        )?;
    }
    Ok(())
}

fn replace_hierarchy(
    tx: &Transaction<'_>,
    report: &SeedReport,
    edges: &[SeedHierarchyEdge],
) -> Result<()> {
    let mut cleared = Vec::new();
    for edge in edges {
        let mineral_id = resolve_mineral(tx, report, &edge.mineral)?;
        if !cleared.contains(&mineral_id) {
            tx.execute(
                "DELETE FROM mineral_hierarchy WHERE mineral_id = ?1",
                params![mineral_id.to_string()],
            )?;
            cleared.push(mineral_id);
        }
        let parent_id = edge
            .parent
            .as_deref()
            .map(|parent| resolve_mineral(tx, report, parent))
            .transpose()?;
        tx.execute(
            "INSERT INTO mineral_hierarchy(mineral_id, parent_id) VALUES (?1, ?2)",
            params![mineral_id.to_string(), parent_id.map(|id| id.to_string())],
        )?;
    }
    Ok(())
}

/// Seeded names win over stored ones so a document can refer to itself.
fn resolve_mineral(tx: &Transaction<'_>, report: &SeedReport, name: &str) -> Result<Uuid> {
    let name = name.trim();
    if let Some(id) = report.minerals.get(name) {
        return Ok(*id);
    }
    mineral_id_by_name(tx, name)?
        .ok_or_else(|| CatalogError::Validation(format!("seed references unknown mineral {name}")))
}

fn mineral_id_by_name(tx: &Transaction<'_>, name: &str) -> Result<Option<Uuid>> {
    let raw = tx
        .query_row(
            "SELECT id FROM mineral WHERE name = ?1 COLLATE NOCASE",
            params![name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    raw.map(|raw| {
        Uuid::parse_str(&raw)
            .map_err(|err| CatalogError::DataIntegrity(format!("mineral id {raw}: {err}")))
    })
    .transpose()
}
