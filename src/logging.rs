use {
    crate::config,
    std::{fs::OpenOptions, path::PathBuf, sync::Mutex},
    tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt},
};

/// the directive applied on top of `RUST_LOG`.
const DIRECTIVE: &str = "termdash=info";

/// installs a json subscriber writing to the log file.
///
/// the dashboard owns the terminal, so nothing is ever logged to stdout or stderr. if the log
/// file cannot be opened, logging stays off.
pub fn init_logging() {
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path())
    else {
        return;
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(filter())
        .try_init();
}

/// where the log file lives.
pub fn log_path() -> PathBuf {
    std::env::temp_dir().join(config::LOG_FILE)
}

fn filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match DIRECTIVE.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}
