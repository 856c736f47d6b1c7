use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use mineralia_core::models::StatusCountMode;

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Seed document; `.json`, `.yaml` or `.yml`.
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Case-insensitive name prefix.
    #[arg(long)]
    pub q: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub offset: Option<usize>,
}

#[derive(Debug, Args)]
pub struct MineralArg {
    /// Mineral id (UUID) or exact name.
    pub mineral: String,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: StatsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Minerals per status code.
    Statuses {
        #[arg(long, value_enum, default_value_t = StatusModeArg::Basic)]
        mode: StatusModeArg,
        #[arg(long, default_value_t = false)]
        grouped: bool,
    },
    /// Minerals per discovery year.
    Years {
        #[arg(long)]
        min: Option<i32>,
        #[arg(long)]
        max: Option<i32>,
    },
    /// Minerals per discovery country.
    Countries {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Crystallographic roll-up over a mineral and its related minerals.
    Mineral(MineralArg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusModeArg {
    Basic,
    Descriptive,
}

impl From<StatusModeArg> for StatusCountMode {
    fn from(value: StatusModeArg) -> Self {
        match value {
            StatusModeArg::Basic => Self::Basic,
            StatusModeArg::Descriptive => Self::Descriptive,
        }
    }
}

#[derive(Debug, Args)]
pub struct WebArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}
