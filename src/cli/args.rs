use clap::{Parser, Subcommand};
use std::path::PathBuf;

use smapstack::types::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "smapstack", version, about = "Fetch SMAP granules and stack their GeoTIFF tiles")]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Pipeline configuration file (JSON). Secrets may come from SMAPSTACK_* variables instead
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable logging
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    /// Log level when logging is enabled (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authenticate, download, extract, and stack
    Run {
        /// Output GeoTIFF (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing output file
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// Authenticate, download, and extract without stacking
    Fetch,

    /// Stack the tiles of an already extracted archive
    Stack {
        /// Directory whose subdirectories hold the granule tiles
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output GeoTIFF
        #[arg(short, long)]
        output: PathBuf,

        /// Replace an existing output file
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// Check that the configured credentials are accepted
    Token,
}
