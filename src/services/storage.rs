use crate::error::UploaderError;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;

/// Bucket-level operations against the object store.
///
/// Implementations are shared by every upload worker, so calls must be safe
/// to make concurrently.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<(), UploaderError>;
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<(), UploaderError>;
}

pub struct S3StorageService {
    client: Client,
}

impl S3StorageService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Returns the file size, or an `Upload` error if `local_path` is missing or
/// not a regular file.
pub async fn ensure_regular_file(key: &str, local_path: &Path) -> Result<u64, UploaderError> {
    let metadata = tokio::fs::metadata(local_path)
        .await
        .map_err(|e| UploaderError::Upload {
            key: key.to_string(),
            source: anyhow::Error::new(e)
                .context(format!("cannot read {}", local_path.display())),
        })?;

    if !metadata.is_file() {
        return Err(UploaderError::Upload {
            key: key.to_string(),
            source: anyhow::anyhow!("{} is not a regular file", local_path.display()),
        });
    }

    Ok(metadata.len())
}

#[async_trait]
impl ObjectStore for S3StorageService {
    async fn bucket_exists(&self, bucket: &str) -> Result<(), UploaderError> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| UploaderError::Bucket {
                bucket: bucket.to_string(),
                source: anyhow::anyhow!("{}", DisplayErrorContext(e)),
            })?;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<(), UploaderError> {
        let size = ensure_regular_file(key, local_path).await?;

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| UploaderError::Upload {
                key: key.to_string(),
                source: e.into(),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(size as i64)
            .body(body)
            .send()
            .await
            .map_err(|e| UploaderError::Upload {
                key: key.to_string(),
                source: anyhow::anyhow!("{}", DisplayErrorContext(e)),
            })?;

        Ok(())
    }
}

/// Store that records every put and fails keys listed in `failing_keys` (for testing)
#[cfg(test)]
pub struct RecordingStore {
    pub missing_buckets: Vec<String>,
    pub failing_keys: Vec<String>,
    pub puts: std::sync::Mutex<Vec<(String, String, std::path::PathBuf)>>,
    pub bucket_checks: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl RecordingStore {
    pub fn new() -> Self {
        Self {
            missing_buckets: Vec::new(),
            failing_keys: Vec::new(),
            puts: std::sync::Mutex::new(Vec::new()),
            bucket_checks: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .puts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
#[async_trait]
impl ObjectStore for RecordingStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<(), UploaderError> {
        self.bucket_checks
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.missing_buckets.iter().any(|b| b == bucket) {
            return Err(UploaderError::Bucket {
                bucket: bucket.to_string(),
                source: anyhow::anyhow!("NotFound"),
            });
        }
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<(), UploaderError> {
        self.puts.lock().unwrap().push((
            bucket.to_string(),
            key.to_string(),
            local_path.to_path_buf(),
        ));
        if self.failing_keys.iter().any(|k| k == key) {
            return Err(UploaderError::Upload {
                key: key.to_string(),
                source: anyhow::anyhow!("AccessDenied"),
            });
        }
        Ok(())
    }
}
