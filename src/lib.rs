//! a terminal operations dashboard.
//!
//! the dashboard redraws at a fixed cadence, while its data sources refresh at their own:
//! machine vitals on every tick, the process table every few seconds, and slow remote feeds
//! on background threads, served stale from a cache in the meantime.

pub use self::scheduler::{Dashboard, State};

/// caches that serve the last known value while a new one is obtained.
pub mod cache;
pub mod config;
pub mod feeds;
pub mod fetch;
pub mod logging;
/// labelled percentage bars.
pub mod meter;
pub mod metrics;
/// rates derived from cumulative counters.
pub mod sampler;
/// the render loop.
pub mod scheduler;
/// sources of time.
pub mod source;
pub mod surface;
/// frame layout.
pub mod window;

/// an error that stops the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}
