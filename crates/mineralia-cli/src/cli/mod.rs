use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;


pub use args::{
    ListArgs, MineralArg, SeedArgs, StatsArgs, StatsCommand, StatusModeArg, WebArgs,
};

#[derive(Debug, Parser)]
#[command(name = "mineralia")]
#[command(about = "Mineral taxonomy catalog", version)]
pub struct Cli {
    /// SQLite catalog file; defaults to `MINERALIA_DB_PATH` or `mineralia.sqlite3`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the catalog schema.
    Init,
    /// Load a JSON or YAML seed document.
    Seed(SeedArgs),
    List(ListArgs),
    /// Full detail view of one mineral.
    Mineral(MineralArg),
    Classification(MineralArg),
    Statuses(MineralArg),
    Stats(StatsArgs),
    /// Serve the JSON API.
    Web(WebArgs),
}
