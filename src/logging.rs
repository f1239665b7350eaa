use std::path::Path;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "lease_scout=info";
const LOG_FILE_PREFIX: &str = "lease_scout.log";

fn file_appender(log_dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
}

/// Initializes console and daily-rotated JSON file logging.
///
/// When the log directory cannot be created only the console layer is
/// installed and `None` is returned. Otherwise keep the returned guard alive
/// for the life of the process so the file writer gets flushed.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let (file_layer, guard, init_error) = match file_appender(log_dir) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // try_init so tests and embedders that already installed a subscriber keep it
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if let Some(e) = init_error {
        warn!(
            "⚠️  File logging disabled, cannot open {}: {}",
            log_dir.display(),
            e
        );
    }
    guard
}
