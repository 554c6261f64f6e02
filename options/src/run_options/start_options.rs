use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone, Debug, Default)]
pub struct StartOptions {
    /// The path to the config file
    /// If not provided, the default value is used, config.json
    #[clap(long("config"), short('c'), default_value_os = super::DEFAULT_CONFIG_FILE_PATH)]
    pub config_file_path: PathBuf,

    /// Event level to log
    /// If not provided, the default value is used, INFO
    #[clap(long("loglevel"), short('l'), default_value = super::DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}
