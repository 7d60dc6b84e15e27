//! a terminal operations dashboard.

use {
    std::process::ExitCode,
    termdash::{Dashboard, logging},
    tracing::{error, info},
};

fn main() -> ExitCode {
    logging::init_logging();
    info!(event = "termdash.app.started", log = %logging::log_path().display());

    match Dashboard::new().and_then(|mut dashboard| dashboard.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(cause) => {
            error!(event = "termdash.app.failed", error = %cause);
            eprintln!("termdash: {cause}");
            ExitCode::FAILURE
        }
    }
}
