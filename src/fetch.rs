use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::FetchConfig;

/// Blocking byte-level transport. The pipeline only ever issues GETs, one
/// at a time; tests substitute a stub implementation.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Transport over a shared blocking reqwest client.
pub struct HttpFetch {
    client: reqwest::blocking::Client,
}

impl HttpFetch {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Fetch for HttpFetch {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", url))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read body of {}", url))?;
        Ok(bytes.to_vec())
    }
}
