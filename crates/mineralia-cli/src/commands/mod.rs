use std::path::PathBuf;

use anyhow::{Context, Result};
use mineralia_core::models::MineralListQuery;
use mineralia_core::store::SeedDocument;
use mineralia_core::{Catalog, CatalogConfig, SqliteCatalogStore};

use crate::cli::{Commands, StatsCommand};

mod support;

#[cfg(test)]
mod tests;

use self::support::{print_json, resolve_mineral_id};

pub(crate) fn run(db: Option<PathBuf>, command: Commands) -> Result<()> {
    let mut config = CatalogConfig::from_env();
    if let Some(db) = db {
        config = config.with_db_path(db);
    }
    let store = SqliteCatalogStore::open(&config.db_path)
        .with_context(|| format!("failed to open catalog at {}", config.db_path.display()))?;
    let catalog = Catalog::new(store, config);
    run_with_catalog(catalog, command)
}

fn run_with_catalog(catalog: Catalog<SqliteCatalogStore>, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            print_json(&serde_json::json!({
                "db_path": catalog.config().db_path,
                "status": "ready",
            }))?;
        }
        Commands::Seed(args) => {
            let doc = SeedDocument::from_path(&args.path)
                .with_context(|| format!("failed to read seed {}", args.path.display()))?;
            let report = catalog.store().apply_seed(&doc)?;
            tracing::info!(
                path = %args.path.display(),
                minerals = report.minerals.len(),
                "seed applied"
            );
            print_json(&report)?;
        }
        Commands::List(args) => {
            let items = catalog.list_minerals(&MineralListQuery {
                q: args.q,
                limit: args.limit,
                offset: args.offset,
            })?;
            print_json(&items)?;
        }
        Commands::Mineral(args) => {
            let id = resolve_mineral_id(&catalog, &args.mineral)?;
            print_json(&catalog.mineral_detail(id)?)?;
        }
        Commands::Classification(args) => {
            let id = resolve_mineral_id(&catalog, &args.mineral)?;
            print_json(&catalog.resolve_classification(id)?)?;
        }
        Commands::Statuses(args) => {
            let id = resolve_mineral_id(&catalog, &args.mineral)?;
            print_json(&catalog.resolve_status_groups(id)?)?;
        }
        Commands::Stats(args) => run_stats(&catalog, args.command)?,
        Commands::Web(args) => {
            mineralia_web::serve_web(catalog, &args.host, args.port)?;
        }
    }
    Ok(())
}

fn run_stats(catalog: &Catalog<SqliteCatalogStore>, command: StatsCommand) -> Result<()> {
    match command {
        StatsCommand::Statuses { mode, grouped } => {
            print_json(&catalog.status_counts(mode.into(), grouped)?)
        }
        StatsCommand::Years { min, max } => print_json(&catalog.discovery_year_counts(min, max)?),
        StatsCommand::Countries { limit } => {
            print_json(&catalog.discovery_country_counts(limit)?)
        }
        StatsCommand::Mineral(args) => {
            let id = resolve_mineral_id(catalog, &args.mineral)?;
            let related_ids = catalog.related_mineral_ids(id)?;
            print_json(&catalog.resolve_statistics(id, &related_ids)?)
        }
    }
}
