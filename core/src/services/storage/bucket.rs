use std::sync::Arc;

use object_store::{
    aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder, path::Path, ObjectStore, PutPayload,
};
use tracing::debug;

use crate::error::Result;

/// Object storage bucket. Amazon S3 and Google Cloud Storage only differ in
/// how the client is built, credentials come from the usual `AWS_*` and
/// `GOOGLE_*` environment variables.
#[derive(Debug, Clone)]
pub struct BucketStorage {
    bucket_id: String,
    store: Arc<dyn ObjectStore>,
}

impl BucketStorage {
    pub fn amazon_s3(bucket_id: &str) -> Result<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket_id)
            .build()?;
        Ok(Self::with_store(bucket_id, Arc::new(store)))
    }

    pub fn google_cloud(bucket_id: &str) -> Result<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket_id)
            .build()?;
        Ok(Self::with_store(bucket_id, Arc::new(store)))
    }

    pub fn with_store(bucket_id: &str, store: Arc<dyn ObjectStore>) -> Self {
        BucketStorage {
            bucket_id: bucket_id.to_string(),
            store,
        }
    }

    pub async fn put(&self, filename: &str, data: Vec<u8>) -> Result<()> {
        debug!("Uploading {} to bucket {}", filename, self.bucket_id);
        self.store
            .put(&Path::from(filename), PutPayload::from(data))
            .await?;
        Ok(())
    }

    pub async fn get(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        debug!("Downloading {} from bucket {}", filename, self.bucket_id);
        match self.store.get(&Path::from(filename)).await {
            Ok(result) => Ok(Some(result.bytes().await?.to_vec())),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
