use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classification::{Classification, StatusGroupSummary};
use super::statistics::{CountryCount, MineralStatistics};
use crate::status::StatusCode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineralRecord {
    pub id: Uuid,
    pub name: String,
    pub formula: String,
    pub note: Option<String>,
    pub ns_class: Option<i64>,
    pub ns_subclass: Option<String>,
    pub ns_family: Option<String>,
    pub ns_mineral: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A mineral plus the raw codes of every status assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MineralNode {
    pub mineral: MineralRecord,
    pub statuses: Vec<StatusCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEdge {
    pub id: i64,
    pub mineral_id: Uuid,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusGroupRef {
    pub id: i64,
    pub name: String,
}

/// One row of `mineral_status` with its status, group, and outgoing relations.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusAssignment {
    pub assignment_id: i64,
    pub status_id: StatusCode,
    /// `None` only when the store holds a status without a group.
    pub group: Option<StatusGroupRef>,
    pub description_short: String,
    pub direct_status: bool,
    pub relations: Vec<RelationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRecord {
    pub mineral_id: Uuid,
    pub mineral_name: String,
    pub relation_type_id: Option<i64>,
    pub direct_relation: Option<bool>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrystalStructure {
    pub id: i64,
    pub mineral_id: Uuid,
    pub formula: Option<String>,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HistoryRecord {
    pub discovery_year_min: Option<i32>,
    pub discovery_year_max: Option<i32>,
    pub discovery_year_note: Option<String>,
    pub ima_year: Option<i32>,
    pub publication_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CrystallographyRecord {
    pub crystal_system: Option<String>,
    pub crystal_class: Option<String>,
    pub space_group: Option<String>,
    pub note: Option<String>,
}

/// Descriptions of the Nickel-Strunz levels a mineral points at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NsLookup {
    pub class_description: Option<String>,
    pub subclass_description: Option<String>,
    pub family_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MineralListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MineralListItem {
    pub id: Uuid,
    pub name: String,
    pub formula: String,
    pub formula_html: String,
    pub ns_index: Option<String>,
    pub statuses: Vec<StatusGroupSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub discovery_year: Option<String>,
    pub discovery_year_note: Option<String>,
    pub ima_year: Option<i32>,
    pub publication_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MineralDetail {
    pub id: Uuid,
    pub name: String,
    pub formula: String,
    pub formula_html: String,
    pub ns_index: Option<String>,
    pub note: Option<String>,
    pub statuses: Vec<StatusGroupSummary>,
    pub classification: Option<Classification>,
    pub history: Option<HistorySummary>,
    pub crystallography: Option<CrystallographyRecord>,
    pub statistics: MineralStatistics,
    pub discovery_countries: Vec<CountryCount>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
