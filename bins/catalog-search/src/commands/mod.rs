//! CLI command implementations

pub mod search;
pub mod stats;

use crate::output::OutputFormat;
use anyhow::{Context as _, Result};
use catalog_api_client::{CatalogClient, ClientConfig};
use catalog_core::config::Config;
use catalog_search::{CatalogSearch, SearchSettings};
use std::num::NonZeroUsize;

/// What every command needs: a client, search settings and the output format
pub struct Context {
    client: CatalogClient,
    settings: SearchSettings,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(config: &Config, api_url: Option<&str>, format: OutputFormat) -> Result<Self> {
        let mut client_config = ClientConfig::from_section(&config.schema.api);
        if let Some(url) = api_url {
            client_config = client_config.with_base_url(url);
        }
        let client = CatalogClient::with_config(client_config).context("invalid API client configuration")?;

        Ok(Self {
            client,
            settings: SearchSettings::from_config(&config.schema),
            format,
        })
    }

    /// A fresh search service; `limit` overrides the configured one
    pub fn catalog(&self, limit: Option<NonZeroUsize>) -> CatalogSearch {
        let mut settings = self.settings.clone();
        if limit.is_some() {
            settings.limit = limit;
        }
        CatalogSearch::new(&self.client, settings)
    }

    /// Spinners only make sense for human-readable output
    pub fn interactive(&self) -> bool {
        self.format == OutputFormat::Text
    }
}
