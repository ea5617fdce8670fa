mod client;

pub use client::UpstreamClient;

use reqwest::StatusCode;
use thiserror::Error as ThisError;
use url::Url;

#[derive(Debug, ThisError)]
pub enum FetchError {
    #[error("Failed to retrieve playlist from upstream url `{url}`: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("Upstream url `{url}` answered with status {status}")]
    Status { url: Url, status: StatusCode },
}
