//! off-thread execution of slow producers.
//!
//! a [`BackgroundFetcher`] runs one producer on a dedicated worker thread and delivers its
//! single outcome through a one-shot channel. the receiving end, a [`Pending`], is held by
//! the cache that requested the fetch and is polled without blocking.

use {
    crossbeam::channel::{self, Receiver, Sender, TryRecvError},
    std::{
        io,
        panic::{self, AssertUnwindSafe},
        thread,
        time::Duration,
    },
    tracing::{info, warn},
};

/// the terminal outcome of one fetch.
pub type Outcome<T> = Result<T, FetchError>;

/// runs a single producer off the render thread.
///
/// a fetcher is transient: it is created for one refresh attempt, moved onto its worker,
/// and dropped once its outcome has been delivered.
pub struct BackgroundFetcher<T> {
    /// the name of the feed being fetched, used for logging.
    feed: &'static str,
    /// where the outcome is delivered.
    completion: Completion<T>,
}

/// the sending half of a one-shot outcome channel.
///
/// [`Completion::complete()`] consumes the completion, so at most one outcome can ever be
/// delivered.
pub struct Completion<T> {
    tx: Sender<Outcome<T>>,
}

/// the receiving half of a one-shot outcome channel.
pub struct Pending<T> {
    rx: Receiver<Outcome<T>>,
}

/// the broad category of a [`FetchError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// the request could not be made, timed out, or was answered with a non-success status.
    Transport,
    /// the response arrived but did not have the expected shape.
    Parse,
    /// an external process could not be run to completion.
    Process,
    /// the cache has never been populated.
    NoDataYet,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("{0}")]
    Transport(String),

    #[error("empty response body")]
    EmptyBody,

    #[error("Parse Error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("no data yet")]
    NoDataYet,

    #[error("fetch worker panicked")]
    Panicked,

    #[error("fetch worker exited without a result")]
    Abandoned,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to read process output: {0}")]
    Io(#[from] io::Error),

    #[error("process still running after {after:?}")]
    Timeout { after: Duration },

    #[error("process exited with status {code:?}")]
    ExitStatus { code: Option<i32> },

    #[error("process produced no output")]
    EmptyOutput,
}

// === impl BackgroundFetcher ===

impl<T: Send + 'static> BackgroundFetcher<T> {
    /// creates a fetcher for the given feed, and the [`Pending`] outcome it will deliver to.
    pub fn new(feed: &'static str) -> (Self, Pending<T>) {
        let (completion, pending) = Completion::pair();
        (Self { feed, completion }, pending)
    }

    /// runs `producer` on a new worker thread.
    ///
    /// panics inside the producer are caught and delivered as [`FetchError::Panicked`]. if the
    /// worker cannot be spawned, the fetcher is dropped without delivering anything, which the
    /// [`Pending`] side reports as [`FetchError::Abandoned`].
    pub fn start<P>(self, producer: P)
    where
        P: FnOnce() -> Outcome<T> + Send + 'static,
    {
        let feed = self.feed;
        let spawned = thread::Builder::new()
            .name(format!("fetch-{feed}"))
            .spawn(move || self.run(producer));

        if let Err(error) = spawned {
            warn!(
                event = "termdash.fetch.spawn_failed",
                feed,
                error = %error,
            );
        }
    }

    fn run<P>(self, producer: P)
    where
        P: FnOnce() -> Outcome<T>,
    {
        let Self { feed, completion } = self;

        info!(event = "termdash.fetch.started", feed);

        let outcome =
            panic::catch_unwind(AssertUnwindSafe(producer)).unwrap_or(Err(FetchError::Panicked));

        match &outcome {
            Ok(_) => info!(event = "termdash.fetch.completed", feed),
            Err(error) => warn!(
                event = "termdash.fetch.failed",
                feed,
                kind = ?error.kind(),
                error = %error,
            ),
        }

        completion.complete(outcome);
    }
}

// === impl Completion ===

impl<T> Completion<T> {
    /// returns a connected completion and pending pair.
    pub fn pair() -> (Self, Pending<T>) {
        let (tx, rx) = channel::bounded(1);
        (Self { tx }, Pending { rx })
    }

    /// delivers the outcome.
    ///
    /// if the pending side has already been dropped, the outcome is discarded.
    pub fn complete(self, outcome: Outcome<T>) {
        let Self { tx } = self;
        let _ = tx.send(outcome);
    }
}

// === impl Pending ===

impl<T> Pending<T> {
    /// returns the outcome if it has been delivered, without blocking.
    pub fn poll(&self) -> Option<Outcome<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(FetchError::Abandoned)),
        }
    }

    /// waits up to `timeout` for the outcome.
    #[cfg(test)]
    pub fn wait(&self, timeout: Duration) -> Option<Outcome<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(channel::RecvTimeoutError::Timeout) => None,
            Err(channel::RecvTimeoutError::Disconnected) => Some(Err(FetchError::Abandoned)),
        }
    }
}

// === impl FetchError ===

impl FetchError {
    /// returns the category this error falls under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Status { .. } | Self::Transport(_) | Self::Panicked | Self::Abandoned => {
                ErrorKind::Transport
            }
            Self::EmptyBody | Self::Parse(_) => ErrorKind::Parse,
            Self::Process(_) => ErrorKind::Process,
            Self::NoDataYet => ErrorKind::NoDataYet,
        }
    }

    /// builds a transport error from the innermost cause of `error`.
    pub fn transport(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut cause = error;
        while let Some(source) = cause.source() {
            cause = source;
        }

        Self::Transport(cause.to_string())
    }
}
