//! Failure classes for each pipeline stage and for the client.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Fetch stage failures. Any of these aborts the request with a 500.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The fetch deadline elapsed while waiting on the network or the body.
    #[error("rate source timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, DNS or TLS failure before a response arrived.
    #[error("rate source unreachable: {0}")]
    Transport(String),

    /// The body arrived but is not the expected JSON shape.
    #[error("rate source response could not be decoded: {0}")]
    Decode(String),
}

/// Persist stage failures. Recorded, never surfaced as a failed response.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("store write timed out after {0:?}")]
    Timeout(Duration),

    #[error("store write failed: {0}")]
    Store(String),
}

impl From<sqlx::Error> for PersistError {
    fn from(err: sqlx::Error) -> Self {
        PersistError::Store(err.to_string())
    }
}

/// Client side failures. All of them end the client process.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("quote server did not answer within {0:?}")]
    Timeout(Duration),

    #[error("quote server request failed: {0}")]
    Transport(String),

    #[error("failed to write output file {path}: {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: io::Error,
    },
}
