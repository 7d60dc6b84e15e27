//! producers for the externally-sourced feeds.
//!
//! each producer is a one-shot closure handed to a [`StaleCache`][crate::cache::StaleCache],
//! which runs it off the render thread.

use {
    crate::{
        config,
        fetch::{FetchError, Outcome},
    },
    reqwest::{StatusCode, blocking::Client},
    std::path::PathBuf,
};

pub use self::{branch::BranchCommand, crypto::Prices};

/// source-control branch resolution.
pub mod branch;
/// cryptocurrency prices.
pub mod crypto;
/// current weather conditions.
pub mod weather;

/// hands out producers for each feed.
pub trait Feeds {
    fn weather(&self) -> impl FnOnce() -> Outcome<String> + Send + 'static;
    fn crypto(&self) -> impl FnOnce() -> Outcome<Prices> + Send + 'static;
    fn branch(&self) -> impl FnOnce() -> Outcome<String> + Send + 'static;
}

/// feeds backed by real http endpoints and a real `git` process.
pub struct LiveFeeds {
    client: Client,
    dir: PathBuf,
}

// === impl LiveFeeds ===

impl LiveFeeds {
    /// creates live feeds, resolving the branch of the repository containing `dir`.
    pub fn new(dir: PathBuf) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config::HTTP_CONNECT_TIMEOUT)
            .timeout(config::HTTP_TIMEOUT)
            .user_agent(config::USER_AGENT)
            .build()?;

        Ok(Self { client, dir })
    }
}

impl Feeds for LiveFeeds {
    fn weather(&self) -> impl FnOnce() -> Outcome<String> + Send + 'static {
        let client = self.client.clone();
        move || weather::fetch(&client)
    }

    fn crypto(&self) -> impl FnOnce() -> Outcome<Prices> + Send + 'static {
        let client = self.client.clone();
        move || crypto::fetch(&client)
    }

    fn branch(&self) -> impl FnOnce() -> Outcome<String> + Send + 'static {
        let command = BranchCommand::git(self.dir.clone());
        move || command.resolve().map_err(FetchError::from)
    }
}

/// issues a GET request, returning the body of a `200 OK` response.
fn get(client: &Client, url: &str) -> Outcome<String> {
    let response = client
        .get(url)
        .send()
        .map_err(|error| FetchError::transport(&error))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .map_err(|error| FetchError::transport(&error))?;

    if body.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }

    Ok(body)
}

/// cuts `text` to the error text limit, marking the cut with an ellipsis.
pub fn truncate(text: &str) -> String {
    const LIMIT: usize = config::ERROR_TEXT_LIMIT;

    if text.chars().count() <= LIMIT {
        return text.to_owned();
    }

    text.chars()
        .take(LIMIT)
        .chain(config::ELLIPSIS.chars())
        .collect()
}
