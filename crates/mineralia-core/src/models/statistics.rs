use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCountMode {
    /// Grouping statuses and the not-yet-classified marker.
    #[default]
    Basic,
    /// Every assigned status.
    Descriptive,
}

/// Raw per-status count as the store reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCountRow {
    pub status_id: StatusCode,
    pub description: String,
    pub group: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status_id: StatusCode,
    pub description: String,
    pub group: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCountGroup {
    pub group: String,
    pub statuses: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatusCountReport {
    Flat(Vec<StatusCount>),
    Grouped(Vec<StatusCountGroup>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountryCountFilter {
    /// Restrict counting to these minerals; `None` counts the whole catalog.
    pub mineral_ids: Option<Vec<Uuid>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCount {
    pub country_id: i64,
    pub name: String,
    pub iso_code: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureStatistics {
    pub count: usize,
    pub a: Option<FieldRange>,
    pub b: Option<FieldRange>,
    pub c: Option<FieldRange>,
    pub alpha: Option<FieldRange>,
    pub beta: Option<FieldRange>,
    pub gamma: Option<FieldRange>,
    pub volume: Option<FieldRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementCount {
    pub element: String,
    /// Number of distinct structures whose formula mentions the element.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MineralStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structures: Option<StructureStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ElementCount>>,
}
