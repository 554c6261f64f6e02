use std::str::FromStr;

use logging::init_logging;
use mqtt_reporter::{MqttReporter, config::MqttReporterConfig};
use options::run_options::start_options::StartOptions;
use system_ops::make_shell_ops;
use tracing::level_filters::LevelFilter;
use utils::time_getter::TimeGetter;

use crate::{config::BackupRunConfig, system::BackupSystem};

/// Wire everything up and drive one backup run. Startup failures surface as
/// ordinary errors; failures of the run itself terminate the process with
/// the stage's exit code after the fatal handler reported them.
pub async fn run(start_options: StartOptions) -> anyhow::Result<()> {
    let log_level = LevelFilter::from_str(&start_options.log_level)
        .map_err(|_| anyhow::anyhow!("Invalid log level: {}", start_options.log_level))?;
    init_logging(log_level)?;

    let config = BackupRunConfig::from_file(&start_options.config_file_path)?;

    tracing::debug!("Initializing MQTT...");
    let reporter = MqttReporter::connect(MqttReporterConfig::from(&config)).await?;

    let system = BackupSystem::new(config, make_shell_ops(), TimeGetter::default());

    match system.run(&reporter).await {
        Ok(()) => {
            reporter.shutdown().await;
            Ok(())
        }
        Err(error) => {
            let exit_code = system.handle_fatal(&error, &reporter).await;
            reporter.shutdown().await;
            std::process::exit(exit_code);
        }
    }
}
