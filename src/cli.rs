use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, builder::RangedU64ValueParser};

use crate::io_utils::parse_delimiter;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Query and link player records in a DKP roster table",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// YAML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Roster table (CSV or TSV); overrides `table` in the settings file
    #[arg(short, long, global = true)]
    pub table: Option<PathBuf>,
    /// Table delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, global = true, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the table (defaults to utf-8)
    #[arg(long = "input-encoding", global = true)]
    pub input_encoding: Option<String>,
    /// Chat identity of the person issuing the command
    #[arg(short, long, global = true)]
    pub user: Option<String>,
    /// Reply format written to stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Link your identity to a player ID
    Link(LinkArgs),
    /// Remove the link between your identity and its player ID
    Unlink,
    /// Show the stats card for yourself or another linked identity
    Stats(StatsArgs),
    /// Rank players by a category such as score, goal, rate, kills or power
    Leaderboard(LeaderboardArgs),
    /// Compare your numeric stats with another linked identity
    Compare(CompareArgs),
    /// Show column letters and your DKP cells for troubleshooting the sheet layout
    Inspect,
    /// List the leaderboard category names
    Categories,
}

#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Player ID as it appears in the ID column
    pub id: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Identity to look up instead of your own
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct LeaderboardArgs {
    /// Category alias or header name (defaults to the configured category)
    pub category: Option<String>,
    /// Number of entries to show (at least 1)
    #[arg(short = 'n', long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Identity to compare against
    pub target: Option<String>,
    /// Write the comparison chart to this file
    #[arg(long = "chart-out")]
    pub chart_out: Option<PathBuf>,
}
