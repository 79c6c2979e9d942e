//! Persistence for downloaded rate tables.
//!
//! Every backend stores the same bytes (`RateTable::encode`) under a
//! date-stamped filename, so a table saved by one process can be loaded by
//! any other using the same backend. A bounded in-process cache sits in
//! front of the backend and is filled on both save and load.

mod bucket;
mod cache;
mod local;

use std::{fmt, str::FromStr, sync::Arc};

use chrono::NaiveDate;
use tracing::debug;

pub use bucket::BucketStorage;
pub use cache::BoundedCache;
pub use local::LocalStorage;

use super::{
    market_data::rate_table::RateTable,
    parsers::DATE_FORMAT,
    shared::{
        constants::{SAVED_RATES_EXTENSION, SAVED_RATES_PREFIX},
        env::Settings,
    },
};
use crate::error::{ReportError, Result};

pub type RateCache = BoundedCache<Arc<RateTable>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Disabled,
    Local,
    AmazonS3,
    GoogleCloud,
}

impl StorageType {
    pub fn uses_bucket(&self) -> bool {
        matches!(self, StorageType::AmazonS3 | StorageType::GoogleCloud)
    }
}

impl FromStr for StorageType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "disabled" => Ok(StorageType::Disabled),
            "local" => Ok(StorageType::Local),
            "aws" => Ok(StorageType::AmazonS3),
            "gcp" => Ok(StorageType::GoogleCloud),
            other => Err(ReportError::Configuration(format!(
                "Not implemented: [STORAGE_TYPE] '{}', expected one of disabled, local, aws, gcp",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageType::Disabled => "disabled",
            StorageType::Local => "local",
            StorageType::AmazonS3 => "aws",
            StorageType::GoogleCloud => "gcp",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Disabled,
    Local(LocalStorage),
    AmazonS3(BucketStorage),
    GoogleCloud(BucketStorage),
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Disabled => "StorageDisabled",
            StorageBackend::Local(_) => "LocalStorage",
            StorageBackend::AmazonS3(_) => "AmazonS3",
            StorageBackend::GoogleCloud(_) => "GoogleCloudStorage",
        }
    }

    pub async fn save(&self, table: &RateTable, filename: &str) -> Result<()> {
        match self {
            StorageBackend::Disabled => Ok(()),
            StorageBackend::Local(local) => local.put(filename, table.encode()?).await,
            StorageBackend::AmazonS3(bucket) | StorageBackend::GoogleCloud(bucket) => {
                bucket.put(filename, table.encode()?).await
            }
        }
    }

    /// `None` when nothing has been saved under `filename`.
    pub async fn load(&self, filename: &str) -> Result<Option<RateTable>> {
        let data = match self {
            StorageBackend::Disabled => None,
            StorageBackend::Local(local) => local.get(filename).await?,
            StorageBackend::AmazonS3(bucket) | StorageBackend::GoogleCloud(bucket) => {
                bucket.get(filename).await?
            }
        };
        data.map(|data| RateTable::decode(&data)).transpose()
    }
}

/// Builds the backend selected by the configuration.
pub fn get_storage(settings: &Settings) -> Result<StorageBackend> {
    settings.validate()?;

    let bucket_id = || {
        settings.bucket_id.as_deref().ok_or_else(|| {
            ReportError::Configuration(format!(
                "[STORAGE_TYPE] is set as '{}', but [BUCKET_ID] is missing.",
                settings.storage_type
            ))
        })
    };

    let backend = match settings.storage_type {
        StorageType::Disabled => StorageBackend::Disabled,
        StorageType::Local => StorageBackend::Local(LocalStorage::new(&settings.storage_dir)?),
        StorageType::AmazonS3 => StorageBackend::AmazonS3(BucketStorage::amazon_s3(bucket_id()?)?),
        StorageType::GoogleCloud => {
            StorageBackend::GoogleCloud(BucketStorage::google_cloud(bucket_id()?)?)
        }
    };
    debug!("Using {} backend.", backend.name());
    Ok(backend)
}

pub fn rates_filename(date: NaiveDate) -> String {
    format!(
        "{}-{}.{}",
        SAVED_RATES_PREFIX,
        date.format(DATE_FORMAT),
        SAVED_RATES_EXTENSION
    )
}

/// Storage backend with the in-process cache in front of it.
#[derive(Debug, Clone)]
pub struct RateStore {
    backend: StorageBackend,
    cache: Arc<RateCache>,
}

impl RateStore {
    pub fn new(backend: StorageBackend, cache: Arc<RateCache>) -> Self {
        RateStore { backend, cache }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            get_storage(settings)?,
            Arc::new(RateCache::new(settings.cache_size)),
        ))
    }

    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    pub async fn save(&self, table: Arc<RateTable>, filename: &str) -> Result<()> {
        debug!("Save to '{}' using {} backend.", filename, self.backend.name());
        self.cache.insert(filename, table.clone());
        self.backend.save(&table, filename).await
    }

    /// Loads a table, an empty one when nothing is stored under `filename`.
    pub async fn load(&self, filename: &str) -> Result<Arc<RateTable>> {
        debug!("Load '{}' using {} backend.", filename, self.backend.name());
        if let Some(table) = self.cache.get(filename) {
            debug!("Cache hit: {}", filename);
            return Ok(table);
        }
        debug!("Cache miss: {}", filename);

        let table = Arc::new(self.backend.load(filename).await?.unwrap_or_default());
        if !table.is_empty() {
            self.cache.insert(filename, table.clone());
        }
        Ok(table)
    }
}
