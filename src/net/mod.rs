//! Clients for the remote data distribution service: token exchange (`auth`),
//! query construction (`request`), and streamed archive retrieval (`download`).
use std::time::Duration;

use thiserror::Error;

pub mod auth;
pub mod download;
pub mod request;

pub use auth::{AuthError, Token, request_token};
pub use download::{Download, download_archive};
pub use request::DataRequest;

const USER_AGENT: &str = concat!("smapstack/", env!("CARGO_PKG_VERSION"));

/// Errors raised while requesting or streaming the data archive
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid request URL `{url}`: {reason}")]
    Url { url: String, reason: String },
    #[error("service responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("I/O error while saving archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the blocking HTTP client shared by every stage, bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}
