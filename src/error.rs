use thiserror::Error;

use crate::MAX_DAY_COUNT;

#[derive(Debug, Error)]
pub enum RatesError {
    #[error("invalid day count {0}: enter a value between 1 and {max}", max = MAX_DAY_COUNT)]
    InvalidDayCount(u32),
    #[error("error status {status} for {url}")]
    RequestFailed { status: u16, url: String },
    #[error("connection error for {url}: {source}")]
    ConnectionFailed {
        url: String,
        #[source]
        source: ureq::Error,
    },
    /// The server answered 200 but the body is not a rate table
    #[error("unexpected response body from {url}: {source}")]
    InvalidResponse {
        url: String,
        #[source]
        source: ureq::Error,
    },
}

pub type Result<T> = std::result::Result<T, RatesError>;
