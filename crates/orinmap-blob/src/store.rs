//! BlobStore: map file storage over an `object_store` backend.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use http::Method;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use orinmap_core::config::{StorageBackend, StorageConfig};
use tracing::debug;
use url::Url;

use crate::error::{BlobError, BlobResult};
use crate::keys::object_key;
use crate::signer::LocalSigner;

const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:8080/blobs/";

/// Object store client shared across request handlers.
///
/// Every call is a round trip to the backend; nothing is cached and nothing
/// is retried.
#[derive(Clone)]
pub struct BlobStore {
    store: Arc<dyn ObjectStore>,
    signer: Arc<dyn Signer>,
}

impl BlobStore {
    pub fn new(store: Arc<dyn ObjectStore>, signer: Arc<dyn Signer>) -> Self {
        Self { store, signer }
    }

    /// Build the backend named in `[storage]`.
    pub fn from_config(config: &StorageConfig) -> BlobResult<Self> {
        match config.backend {
            StorageBackend::S3 => Self::s3(config),
            StorageBackend::Memory => Self::in_memory(
                config
                    .public_base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_LOCAL_BASE_URL),
            ),
        }
    }

    /// S3 (or S3-compatible) bucket. Settings absent from the config fall
    /// back to the standard `AWS_*` environment variables.
    pub fn s3(config: &StorageConfig) -> BlobResult<Self> {
        let bucket = config
            .bucket
            .as_deref()
            .ok_or(BlobError::MissingConfig("bucket"))?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder
                .with_access_key_id(key_id)
                .with_secret_access_key(secret);
        }

        let s3 = Arc::new(builder.build()?);
        debug!(%bucket, region = ?config.region, "s3 object store configured");
        Ok(Self::new(s3.clone(), s3))
    }

    /// Process-local store with unverified links rooted at `public_base_url`.
    pub fn in_memory(public_base_url: &str) -> BlobResult<Self> {
        let signer = LocalSigner::new(public_base_url)?;
        debug!(%public_base_url, "in-memory object store configured");
        Ok(Self::new(Arc::new(InMemory::new()), Arc::new(signer)))
    }

    /// Store a file under `maps/{namespace}/{now_millis}_{file_name}` and
    /// return its key.
    pub async fn put(
        &self,
        namespace: &str,
        file_name: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> BlobResult<String> {
        let key = object_key(namespace, epoch_millis(), file_name);
        let size = bytes.len();

        let mut attributes = Attributes::new();
        if let Some(content_type) = content_type {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&Path::from(key.as_str()), PutPayload::from(bytes), opts)
            .await?;
        debug!(%key, size, ?content_type, "object stored");
        Ok(key)
    }

    /// Fetch an object's full contents.
    pub async fn get(&self, key: &str) -> BlobResult<Bytes> {
        let result = match self.store.get(&Path::from(key)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(BlobError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let bytes = result.bytes().await?;
        debug!(%key, size = bytes.len(), "object fetched");
        Ok(bytes)
    }

    /// Whether an object exists.
    pub async fn exists(&self, key: &str) -> BlobResult<bool> {
        match self.store.head(&Path::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object. Deleting a missing object succeeds.
    pub async fn delete(&self, key: &str) -> BlobResult<()> {
        match self.store.delete(&Path::from(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!(%key, "object deleted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Signed GET URL valid for `ttl`. There is no revocation.
    pub async fn presign(&self, key: &str, ttl: Duration) -> BlobResult<Url> {
        let url = self
            .signer
            .signed_url(Method::GET, &Path::from(key), ttl)
            .await?;
        Ok(url)
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
