use std::io::{Cursor, Read};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use zip::ZipArchive;

use super::rate_table::RateTable;
use crate::{
    error::{ReportError, Result},
    services::shared::env::Settings,
};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Where complete rate tables come from when storage has none.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<RateTable>;
}

/// Historical euro reference rates published by the European Central Bank.
pub struct EcbRateSource {
    url: String,
    max_retries: u32,
    client: Client,
}

impl EcbRateSource {
    pub fn new(url: impl Into<String>, max_retries: u32) -> Self {
        EcbRateSource {
            url: url.into(),
            max_retries,
            client: Client::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.exchange_rates_url.clone(), settings.max_http_retries)
    }

    async fn download(&self) -> anyhow::Result<Vec<u8>> {
        if let Some(path) = self.url.strip_prefix("file://") {
            return tokio::fs::read(path)
                .await
                .with_context(|| format!("unable to read {}", path));
        }
        let res = self.client.get(&self.url).send().await?.error_for_status()?;
        Ok(res.bytes().await?.to_vec())
    }

    /// A fetched payload is either a ZIP archive of CSV files or a bare CSV.
    pub fn parse_payload(payload: &[u8]) -> Result<RateTable> {
        if !payload.starts_with(ZIP_MAGIC) {
            return RateTable::from_csv(payload);
        }

        let mut archive = ZipArchive::new(Cursor::new(payload))?;
        let mut table = RateTable::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            debug!("Parsing {} from the rates archive", file.name());
            table.merge(RateTable::from_csv(&contents)?);
        }
        Ok(table)
    }
}

#[async_trait]
impl RateSource for EcbRateSource {
    async fn fetch(&self) -> Result<RateTable> {
        let mut retries = 0;
        let payload = loop {
            match self.download().await {
                Ok(payload) => break payload,
                Err(err) => {
                    warn!("Error while retrieving rates: {:#}", err);
                    if retries >= self.max_retries {
                        return Err(ReportError::RatesUnavailable);
                    }
                    retries += 1;
                }
            }
        };
        debug!("Successfully downloaded the latest exchange rates: {}", self.url);

        let table = Self::parse_payload(&payload)?;
        debug!("Parsed exchange rates for {} dates.", table.len());
        Ok(table)
    }
}
