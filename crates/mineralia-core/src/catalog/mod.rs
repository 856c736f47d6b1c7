use std::collections::HashMap;

use uuid::Uuid;

use crate::aggregate::{aggregate_status_groups, related_mineral_ids, without_relations};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::hierarchy::{HierarchyArena, resolve_groups_classification};
use crate::models::{
    Classification, CountryCount, CountryCountFilter, GroupsClassification, MineralDetail,
    MineralListItem, MineralListQuery, MineralRecord, MineralStatistics, StatusCountMode,
    StatusCountReport, StatusGroupSummary, YearCount, YearRange,
};
use crate::statistics::{mineral_statistics, status_count_report};
use crate::store::EntityStore;
use crate::taxonomy::{self, formula_html, mineral_ns_index, ns_classification, summarize_history};

mod request_log;


/// Presentation-facing entry point: every derived view of the catalog.
#[derive(Debug, Clone)]
pub struct Catalog<S> {
    store: S,
    config: CatalogConfig,
}

impl<S: EntityStore> Catalog<S> {
    pub fn new(store: S, config: CatalogConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    #[must_use]
    pub fn format_taxonomic_index(
        &self,
        class_id: Option<i64>,
        subclass: Option<&str>,
        family: Option<&str>,
        species: Option<&str>,
    ) -> Option<String> {
        taxonomy::format_taxonomic_index(class_id, subclass, family, species)
    }

    /// Nickel-Strunz and group classifications, or `None` when the mineral has neither.
    pub fn resolve_classification(&self, mineral_id: Uuid) -> Result<Option<Classification>> {
        self.observe(
            "resolve_classification",
            Some(mineral_id.to_string()),
            || {
                let mineral = self.require_mineral(mineral_id)?;
                self.classification_for(&mineral)
            },
        )
    }

    pub fn resolve_status_groups(&self, mineral_id: Uuid) -> Result<Vec<StatusGroupSummary>> {
        self.observe(
            "resolve_status_groups",
            Some(mineral_id.to_string()),
            || {
                self.require_mineral(mineral_id)?;
                self.status_groups_for(mineral_id)
            },
        )
    }

    /// Minerals a reader of `mineral_id` may be redirected to, plus its hierarchy children.
    pub fn related_mineral_ids(&self, mineral_id: Uuid) -> Result<Vec<Uuid>> {
        self.observe("related_mineral_ids", Some(mineral_id.to_string()), || {
            self.require_mineral(mineral_id)?;
            let summaries = self.status_groups_for(mineral_id)?;
            self.related_ids_for(mineral_id, &summaries)
        })
    }

    /// Crystallographic roll-up over the mineral and `related_ids`.
    pub fn resolve_statistics(
        &self,
        mineral_id: Uuid,
        related_ids: &[Uuid],
    ) -> Result<MineralStatistics> {
        self.observe("resolve_statistics", Some(mineral_id.to_string()), || {
            self.require_mineral(mineral_id)?;
            self.statistics_for(mineral_id, related_ids)
        })
    }

    pub fn mineral_detail(&self, mineral_id: Uuid) -> Result<MineralDetail> {
        self.observe("mineral_detail", Some(mineral_id.to_string()), || {
            let mineral = self.require_mineral(mineral_id)?;
            self.detail_for(mineral)
        })
    }

    pub fn mineral_by_name(&self, name: &str) -> Result<MineralDetail> {
        self.observe("mineral_by_name", Some(name.to_string()), || {
            let mineral = self
                .store
                .mineral_by_name(name)?
                .ok_or_else(|| CatalogError::NotFound(format!("mineral {name}")))?;
            self.detail_for(mineral)
        })
    }

    pub fn list_minerals(&self, query: &MineralListQuery) -> Result<Vec<MineralListItem>> {
        self.observe("list_minerals", None, || {
            let limit = self.config.resolve_list_limit(query.limit);
            let offset = query.offset.unwrap_or(0);
            let records = self
                .store
                .list_minerals(query.q.as_deref(), limit, offset)?;
            records
                .into_iter()
                .map(|mineral| {
                    let statuses = without_relations(self.status_groups_for(mineral.id)?);
                    Ok(MineralListItem {
                        ns_index: mineral_ns_index(&mineral),
                        formula_html: formula_html(&mineral.formula),
                        id: mineral.id,
                        name: mineral.name,
                        formula: mineral.formula,
                        statuses,
                    })
                })
                .collect()
        })
    }

    pub fn status_counts(&self, mode: StatusCountMode, grouped: bool) -> Result<StatusCountReport> {
        self.observe("status_counts", None, || {
            status_count_report(self.store.status_counts()?, mode, grouped)
        })
    }

    /// Minerals per discovery year; `min` defaults to the configured lower bound.
    pub fn discovery_year_counts(
        &self,
        min: Option<i32>,
        max: Option<i32>,
    ) -> Result<Vec<YearCount>> {
        self.observe("discovery_year_counts", None, || {
            let range = YearRange {
                min: min.unwrap_or(self.config.discovery_year_min),
                max,
            };
            if let Some(max) = range.max
                && max < range.min
            {
                return Err(CatalogError::Validation(format!(
                    "discovery year max {max} is below min {}",
                    range.min
                )));
            }
            self.store.discovery_year_counts(range)
        })
    }

    /// Minerals per discovery country over the whole catalog, unbounded unless `limit` is set.
    pub fn discovery_country_counts(&self, limit: Option<usize>) -> Result<Vec<CountryCount>> {
        self.observe("discovery_country_counts", None, || {
            if limit == Some(0) {
                return Err(CatalogError::Validation(
                    "country count limit must be at least 1".to_string(),
                ));
            }
            self.store.discovery_country_counts(&CountryCountFilter {
                mineral_ids: None,
                limit,
            })
        })
    }

    fn require_mineral(&self, mineral_id: Uuid) -> Result<MineralRecord> {
        self.store
            .mineral(mineral_id)?
            .ok_or_else(|| CatalogError::mineral_not_found(mineral_id))
    }

    fn classification_for(&self, mineral: &MineralRecord) -> Result<Option<Classification>> {
        let lookup = self.store.ns_lookup(mineral)?;
        let ns = ns_classification(mineral, &lookup);
        let groups = self.groups_for(mineral.id)?;
        if ns.is_none() && groups.is_none() {
            return Ok(None);
        }
        Ok(Some(Classification { ns, groups }))
    }

    fn groups_for(&self, mineral_id: Uuid) -> Result<Option<GroupsClassification>> {
        let edges = self.store.hierarchy_edges_reachable_from(mineral_id)?;
        if edges.is_empty() {
            return Ok(None);
        }
        let arena = HierarchyArena::new(edges);
        let nodes: HashMap<_, _> = self
            .store
            .minerals_with_statuses(&arena.referenced_minerals())?
            .into_iter()
            .map(|node| (node.mineral.id, node))
            .collect();
        resolve_groups_classification(
            mineral_id,
            &arena,
            &nodes,
            self.config.hierarchy_limits(),
        )
    }

    fn status_groups_for(&self, mineral_id: Uuid) -> Result<Vec<StatusGroupSummary>> {
        aggregate_status_groups(&self.store.status_assignments(mineral_id)?)
    }

    fn related_ids_for(
        &self,
        mineral_id: Uuid,
        summaries: &[StatusGroupSummary],
    ) -> Result<Vec<Uuid>> {
        let children = self.store.hierarchy_children(mineral_id)?;
        Ok(related_mineral_ids(mineral_id, summaries, &children))
    }

    fn statistics_for(&self, mineral_id: Uuid, related_ids: &[Uuid]) -> Result<MineralStatistics> {
        let ids = scope_with(mineral_id, related_ids);
        Ok(mineral_statistics(&self.store.crystal_structures(&ids)?))
    }

    fn detail_for(&self, mineral: MineralRecord) -> Result<MineralDetail> {
        let statuses = self.status_groups_for(mineral.id)?;
        let related_ids = self.related_ids_for(mineral.id, &statuses)?;
        let classification = self.classification_for(&mineral)?;
        let history = self
            .store
            .history(mineral.id)?
            .map(|record| summarize_history(&record));
        let crystallography = self.store.crystallography(mineral.id)?;
        let statistics = self.statistics_for(mineral.id, &related_ids)?;
        let discovery_countries = self.store.discovery_country_counts(&CountryCountFilter {
            mineral_ids: Some(scope_with(mineral.id, &related_ids)),
            limit: Some(self.config.detail_top_countries),
        })?;

        Ok(MineralDetail {
            ns_index: mineral_ns_index(&mineral),
            formula_html: formula_html(&mineral.formula),
            id: mineral.id,
            name: mineral.name,
            formula: mineral.formula,
            note: mineral.note,
            statuses,
            classification,
            history,
            crystallography,
            statistics,
            discovery_countries,
            created_at: mineral.created_at,
            updated_at: mineral.updated_at,
        })
    }
}

fn scope_with(mineral_id: Uuid, related_ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(related_ids.len() + 1);
    ids.push(mineral_id);
    ids.extend(related_ids.iter().copied().filter(|id| *id != mineral_id));
    ids
}
