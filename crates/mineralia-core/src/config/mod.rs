use std::path::PathBuf;

use crate::hierarchy::HierarchyLimits;

mod env;

pub const ENV_DB_PATH: &str = "MINERALIA_DB_PATH";
const ENV_MAX_HIERARCHY_DEPTH: &str = "MINERALIA_MAX_HIERARCHY_DEPTH";
const ENV_MAX_HIERARCHY_NODES: &str = "MINERALIA_MAX_HIERARCHY_NODES";
const ENV_DETAIL_TOP_COUNTRIES: &str = "MINERALIA_DETAIL_TOP_COUNTRIES";
const ENV_DISCOVERY_YEAR_MIN: &str = "MINERALIA_DISCOVERY_YEAR_MIN";
const ENV_LIST_LIMIT: &str = "MINERALIA_LIST_LIMIT";

pub const DEFAULT_DB_FILE_NAME: &str = "mineralia.sqlite3";
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 64;
pub const DEFAULT_MAX_HIERARCHY_NODES: usize = 10_000;
pub const DEFAULT_DETAIL_TOP_COUNTRIES: usize = 5;
pub const DEFAULT_DISCOVERY_YEAR_MIN: i32 = 1800;
pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 500;

/// Runtime knobs for the catalog, resolved once from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub db_path: PathBuf,
    /// Hard cap on hierarchy descent; branches deeper than this are cut.
    pub max_hierarchy_depth: usize,
    /// Total classification nodes one render may produce.
    pub max_hierarchy_nodes: usize,
    pub detail_top_countries: usize,
    pub discovery_year_min: i32,
    pub list_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
            max_hierarchy_nodes: DEFAULT_MAX_HIERARCHY_NODES,
            detail_top_countries: DEFAULT_DETAIL_TOP_COUNTRIES,
            discovery_year_min: DEFAULT_DISCOVERY_YEAR_MIN,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl CatalogConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            db_path: env::read_non_empty_env(ENV_DB_PATH)
                .map_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME), PathBuf::from),
            max_hierarchy_depth: env::read_env_usize(
                ENV_MAX_HIERARCHY_DEPTH,
                DEFAULT_MAX_HIERARCHY_DEPTH,
                1,
            ),
            max_hierarchy_nodes: env::read_env_usize(
                ENV_MAX_HIERARCHY_NODES,
                DEFAULT_MAX_HIERARCHY_NODES,
                1,
            ),
            detail_top_countries: env::read_env_usize(
                ENV_DETAIL_TOP_COUNTRIES,
                DEFAULT_DETAIL_TOP_COUNTRIES,
                1,
            ),
            discovery_year_min: env::read_env_i32(
                ENV_DISCOVERY_YEAR_MIN,
                DEFAULT_DISCOVERY_YEAR_MIN,
            ),
            list_limit: env::read_env_usize(ENV_LIST_LIMIT, DEFAULT_LIST_LIMIT, 1)
                .min(MAX_LIST_LIMIT),
        }
    }

    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    #[must_use]
    pub fn hierarchy_limits(&self) -> HierarchyLimits {
        HierarchyLimits {
            max_depth: self.max_hierarchy_depth,
            max_nodes: self.max_hierarchy_nodes,
        }
    }

    /// Clamp a caller-supplied page size into `1..=MAX_LIST_LIMIT`.
    #[must_use]
    pub fn resolve_list_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.list_limit)
            .clamp(1, MAX_LIST_LIMIT)
    }
}
