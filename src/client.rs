use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use crate::error::{RatesError, Result};
use crate::rates::RateTable;

pub const PRIVATBANK_URL: &str = "https://api.privatbank.ua/p24api/exchange_rates";

/// Anything that can produce the rate table for a `DD.MM.YYYY` date.
pub trait RateSource {
    fn fetch(&self, date: &str) -> Result<RateTable>;
}

/// Client for the PrivatBank archive endpoint.
///
/// Holds a single agent, so every request of a run shares its connection pool.
pub struct PrivatClient {
    agent: Agent,
    base_url: String,
}

impl PrivatClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(timeout)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, date: &str) -> String {
        format!("{}?json&date={date}", self.base_url)
    }

    /// GET `url` once and parse the body. Only status 200 counts as success.
    pub fn get_table(&self, url: &str) -> Result<RateTable> {
        debug!(url, "requesting rate table");
        let mut resp = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::StatusCode(status) => RatesError::RequestFailed {
                status,
                url: url.to_string(),
            },
            source => RatesError::ConnectionFailed {
                url: url.to_string(),
                source,
            },
        })?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(RatesError::RequestFailed {
                status,
                url: url.to_string(),
            });
        }

        resp.body_mut()
            .read_json::<RateTable>()
            .map_err(|e| match e {
                ureq::Error::Json(_) => RatesError::InvalidResponse {
                    url: url.to_string(),
                    source: e,
                },
                source => RatesError::ConnectionFailed {
                    url: url.to_string(),
                    source,
                },
            })
    }
}

impl RateSource for PrivatClient {
    fn fetch(&self, date: &str) -> Result<RateTable> {
        self.get_table(&self.url_for(date))
    }
}
