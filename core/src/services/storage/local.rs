use std::{fs, io::ErrorKind, path::PathBuf};

use tracing::debug;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        if !storage_dir.exists() {
            fs::create_dir_all(&storage_dir)?;
            debug!("Storage folder created at: {:?}", storage_dir);
        }
        Ok(LocalStorage { storage_dir })
    }

    pub async fn put(&self, filename: &str, data: Vec<u8>) -> Result<()> {
        tokio::fs::write(self.storage_dir.join(filename), data).await?;
        Ok(())
    }

    pub async fn get(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.storage_dir.join(filename)).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
