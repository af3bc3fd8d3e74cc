use std::{fs::File, sync::OnceLock};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber writing `<log_dir>/clouddriver.log`.
/// `RUST_LOG` overrides the default INFO level. Later calls are no-ops.
pub fn setup_logger(
    log_dir: &str,
    _endpoint: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }
    let file = File::create(format!("{log_dir}/clouddriver.log"))?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()));
    let file_layer = fmt::layer()
        .with_line_number(true)
        .with_writer(non_blocking_writer)
        .with_filter(filter);

    LOG_GUARD.set(guard).ok();
    tracing_subscriber::registry().with(file_layer).try_init().ok();

    Ok(())
}

/// Nothing is buffered outside the file appender.
pub fn shutdown() {}
