use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Used when `RUST_LOG` is unset or unparsable. Covers the library and the three binaries.
const DEFAULT_DIRECTIVE: &str =
    "caption_dataset_tools=info,sample_dataset=info,filter_instances=info,caption_images=info";

/// `RUST_LOG` style filter from `spec`, or the default directives when absent or invalid.
fn env_filter(spec: Option<&str>) -> EnvFilter {
    spec.and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Initializes the logging system with both console and file output.
///
/// `app` names the daily-rotated JSON log file under `logs/`.
pub fn init_logging(app: &str) {
    // Ensure logs directory exists
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", format!("{}.log", app));
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    // A second call is a no-op
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    // Keep the guard alive for the whole process so logs are flushed on exit
    std::mem::forget(guard);
}
