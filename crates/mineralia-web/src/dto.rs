use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mineralia_core::models::{
    Classification, MineralListItem, MineralStatistics, StatusCountMode, StatusGroupSummary,
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MineralListResponse {
    pub items: Vec<MineralListItem>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct ClassificationResponse {
    pub mineral_id: Uuid,
    pub classification: Option<Classification>,
}

#[derive(Debug, Serialize)]
pub struct StatusGroupsResponse {
    pub mineral_id: Uuid,
    pub statuses: Vec<StatusGroupSummary>,
}

#[derive(Debug, Serialize)]
pub struct MineralStatisticsResponse {
    pub mineral_id: Uuid,
    pub related_ids: Vec<Uuid>,
    pub statistics: MineralStatistics,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusCountQuery {
    pub mode: Option<StatusCountMode>,
    pub grouped: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscoveryYearQuery {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscoveryCountryQuery {
    pub limit: Option<usize>,
}
