//! Command-line argument parsing
//!
//! The positional access key and `--cache` flag keep the historical
//! `ipdistance <access_key> [--cache]` invocation working; everything else
//! lives in the TOML file or `IPD__*` environment variables.

use clap::Parser;

/// IP distance service
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "ipdistance")]
#[command(version)]
#[command(
    about = "Serve the great-circle distance between two IP addresses",
    long_about = None
)]
pub struct Args {
    /// ipstack access key (overrides provider.access_key)
    pub access_key: Option<String>,

    /// Enable the response cache (overrides cache.enabled)
    #[arg(long)]
    pub cache: bool,

    /// Path to a TOML configuration file
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub generate_config: bool,
}
