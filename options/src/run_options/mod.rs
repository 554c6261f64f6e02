pub mod start_options;

use clap::{Parser, Subcommand};

const DEFAULT_CONFIG_FILE_PATH: &str = "config.json";
const DEFAULT_LOG_LEVEL: &str = "INFO";

#[derive(Parser)]
pub struct RunOptions {
    #[clap(subcommand)]
    pub command: RunCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum RunCommand {
    /// The default command to start a backup run.
    Start(start_options::StartOptions),
}
