use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clitrans")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Translate configuration trees to and from network device CLIs",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the one in the config directory
    #[arg(long, global = true, env = "CLITRANS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List supported devices, or the paths one device translates
    Units(UnitsArgs),

    /// Read a configuration subtree from a recorded device transcript
    Read(ReadArgs),

    /// Show the commands a change list would send, without sending them
    Plan(PlanArgs),

    /// Send a change list to a device through the configured exec program
    Apply(ApplyArgs),

    /// Show the resolved configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

#[derive(Args)]
pub struct UnitsArgs {
    /// Device type (ios, ios-xr, vrp, ironware, saos, saos8, sros, dasan, cubro)
    #[arg(short, long, env = "CLITRANS_DEVICE")]
    pub device: Option<String>,
}

#[derive(Args)]
pub struct ReadArgs {
    /// Device type (defaults to default_device from config)
    #[arg(short, long, env = "CLITRANS_DEVICE")]
    pub device: Option<String>,

    /// Configuration path to read, e.g. /network-instance[default]
    #[arg(short, long, default_value = "/")]
    pub path: String,

    /// TOML transcript of recorded command outputs
    #[arg(short, long)]
    pub transcript: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Parallel jobs for subtree reads (overrides config)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Device type (defaults to default_device from config)
    #[arg(short, long, env = "CLITRANS_DEVICE")]
    pub device: Option<String>,

    /// JSON change list: [{"path": ..., "before": {...}, "after": {...}}]
    #[arg(short, long)]
    pub changes: PathBuf,

    /// Print only the command text
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Device type (defaults to default_device from config)
    #[arg(short, long, env = "CLITRANS_DEVICE")]
    pub device: Option<String>,

    /// JSON change list: [{"path": ..., "before": {...}, "after": {...}}]
    #[arg(short, long)]
    pub changes: PathBuf,

    /// Seconds to wait for each batch (overrides config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Show what would be sent without sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Toml,
}
