use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    CountryCount, CountryCountFilter, CrystalStructure, CrystallographyRecord, HierarchyEdge,
    HistoryRecord, MineralNode, MineralRecord, NsLookup, StatusAssignment, StatusCountRow,
    YearCount, YearRange,
};

mod schema;
mod seed;
mod sqlite;

pub use seed::{
    SeedCountry, SeedDocument, SeedHierarchyEdge, SeedMineral, SeedMineralStatus, SeedNsClass,
    SeedNsFamily, SeedNsSubclass, SeedRelation, SeedRelationType, SeedReport, SeedStatus,
    SeedStatusGroup, SeedStructure,
};
pub use sqlite::SqliteCatalogStore;

/// Read-only view of the catalog the derivation layer works against.
///
/// Absent rows are reported as `None` or empty collections, never as errors.
pub trait EntityStore: Send + Sync {
    fn mineral(&self, id: Uuid) -> Result<Option<MineralRecord>>;

    fn mineral_by_name(&self, name: &str) -> Result<Option<MineralRecord>>;

    /// Minerals ordered by name, optionally restricted to a case-insensitive name prefix.
    fn list_minerals(
        &self,
        name_prefix: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MineralRecord>>;

    /// Minerals with their raw status codes; unknown ids are skipped.
    fn minerals_with_statuses(&self, ids: &[Uuid]) -> Result<Vec<MineralNode>>;

    /// Hierarchy edges of `mineral_id` plus, transitively, the edges of every parent reached.
    fn hierarchy_edges_reachable_from(&self, mineral_id: Uuid) -> Result<Vec<HierarchyEdge>>;

    /// Minerals whose hierarchy parent is `mineral_id`.
    fn hierarchy_children(&self, mineral_id: Uuid) -> Result<Vec<Uuid>>;

    /// Status assignments in assignment order, each with every outgoing relation row.
    fn status_assignments(&self, mineral_id: Uuid) -> Result<Vec<StatusAssignment>>;

    fn crystal_structures(&self, mineral_ids: &[Uuid]) -> Result<Vec<CrystalStructure>>;

    /// Distinct-mineral counts for every assigned status.
    fn status_counts(&self) -> Result<Vec<StatusCountRow>>;

    fn discovery_year_counts(&self, range: YearRange) -> Result<Vec<YearCount>>;

    /// Counts ordered by descending count, then country name.
    fn discovery_country_counts(&self, filter: &CountryCountFilter) -> Result<Vec<CountryCount>>;

    fn history(&self, mineral_id: Uuid) -> Result<Option<HistoryRecord>>;

    fn crystallography(&self, mineral_id: Uuid) -> Result<Option<CrystallographyRecord>>;

    fn ns_lookup(&self, mineral: &MineralRecord) -> Result<NsLookup>;
}

#[cfg(test)]
mod tests;
