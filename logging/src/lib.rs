pub mod log_style;

use std::io::IsTerminal;

use log_style::{LogStyle, LogStyleParseError, TextColoring, get_log_style_from_env};
use tracing::level_filters::LevelFilter;

/// The env var that selects the log output format. See [`LogStyle`] for the
/// recognized values.
pub const LOG_STYLE_ENV_VAR_NAME: &str = "LOG_STYLE";

#[derive(Debug, thiserror::Error)]
pub enum InitLoggingError {
    #[error("Log style selection failed: {0}")]
    LogStyle(#[from] LogStyleParseError),
}

/// Initialize the global tracing subscriber. The default level comes from
/// the command line; `RUST_LOG` can refine it per module, and the
/// `LOG_STYLE` env var picks the output format.
pub fn init_logging(default_level: LevelFilter) -> Result<(), InitLoggingError> {
    let style = get_log_style_from_env(LOG_STYLE_ENV_VAR_NAME)?
        .unwrap_or(LogStyle::Text(TextColoring::Auto));

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    match style {
        LogStyle::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init(),
        LogStyle::Text(coloring) => {
            let with_colors = match coloring {
                TextColoring::On => true,
                TextColoring::Off => false,
                TextColoring::Auto => std::io::stdout().is_terminal(),
            };
            tracing_subscriber::fmt()
                .with_ansi(with_colors)
                .with_env_filter(env_filter)
                .init();
        }
    }

    tracing::debug!("Loglevel is {default_level}");

    Ok(())
}
