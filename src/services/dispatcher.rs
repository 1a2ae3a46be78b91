use crate::error::UploaderError;
use crate::models::{ManifestEntry, UploadFailure, UploadOutcome, UploadReport};
use crate::services::storage::ObjectStore;
use crate::utils::keys::object_key;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Fans uploads out over a bounded pool and waits for all of them.
pub struct UploadDispatcher {
    store: Arc<dyn ObjectStore>,
    max_workers: usize,
}

impl UploadDispatcher {
    pub fn new(store: Arc<dyn ObjectStore>, max_workers: usize) -> Self {
        Self {
            store,
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Uploads every manifest entry to `bucket` under `prefix`.
    ///
    /// Returns only after every upload has finished. A failed upload does not
    /// stop the others; all failures are reported together as `PartialUpload`.
    pub async fn dispatch(
        &self,
        bucket: &str,
        prefix: &str,
        manifest: &[ManifestEntry],
    ) -> Result<UploadReport, UploaderError> {
        if manifest.is_empty() {
            tracing::warn!("⚠️  Archive contains no files, nothing to upload");
            return Ok(UploadReport::default());
        }

        tracing::info!(
            "🚀 Uploading {} files to bucket '{}' with {} workers",
            manifest.len(),
            bucket,
            self.max_workers
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let handles: Vec<_> = manifest
            .iter()
            .map(|entry| {
                let key = object_key(prefix, &entry.relative_path);
                let store = self.store.clone();
                let semaphore = semaphore.clone();
                let bucket = bucket.to_string();
                let local_path = entry.local_path.clone();
                let task_key = key.clone();

                let handle = tokio::spawn(async move {
                    let _permit =
                        semaphore
                            .acquire_owned()
                            .await
                            .map_err(|e| UploaderError::Upload {
                                key: task_key.clone(),
                                source: e.into(),
                            })?;
                    store.put_object(&bucket, &task_key, &local_path).await
                });
                (key, handle)
            })
            .collect();

        let (keys, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let outcomes: Vec<UploadOutcome> = keys
            .into_iter()
            .zip(join_all(handles).await)
            .map(|(key, joined)| match joined {
                Ok(Ok(())) => {
                    tracing::info!("✅ {} uploaded successfully to S3 bucket: {}", key, bucket);
                    UploadOutcome::Uploaded { key }
                }
                Ok(Err(e)) => {
                    tracing::error!("❌ Failed to upload file to S3 bucket: {}", e);
                    UploadOutcome::Failed(UploadFailure {
                        key,
                        reason: error_chain(&e),
                    })
                }
                Err(e) => {
                    tracing::error!("❌ Upload task for {} did not complete: {}", key, e);
                    UploadOutcome::Failed(UploadFailure {
                        key,
                        reason: format!("upload task did not complete: {}", e),
                    })
                }
            })
            .collect();

        summarize(outcomes)
    }
}

fn summarize(outcomes: Vec<UploadOutcome>) -> Result<UploadReport, UploaderError> {
    let attempted = outcomes.len();
    let mut report = UploadReport::default();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            UploadOutcome::Uploaded { key } => report.uploaded.push(key),
            UploadOutcome::Failed(failure) => failures.push(failure),
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(UploaderError::PartialUpload {
            failures,
            attempted,
        })
    }
}

fn error_chain(err: &UploaderError) -> String {
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !reason.contains(&cause_text) {
            reason.push_str(": ");
            reason.push_str(&cause_text);
        }
        source = cause.source();
    }
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::RecordingStore;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn manifest(paths: &[&str]) -> Vec<ManifestEntry> {
        paths
            .iter()
            .map(|p| ManifestEntry {
                local_path: PathBuf::from("/staging").join(p),
                relative_path: PathBuf::from(p),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_keys_without_prefix() {
        let store = Arc::new(RecordingStore::new());
        let dispatcher = UploadDispatcher::new(store.clone(), DEFAULT_MAX_WORKERS);

        let report = dispatcher
            .dispatch("test-bucket", "", &manifest(&["a.txt", "sub/b.txt"]))
            .await
            .unwrap();

        assert_eq!(store.keys(), vec!["a.txt", "sub/b.txt"]);
        assert_eq!(report.uploaded.len(), 2);
        let puts = store.puts.lock().unwrap();
        assert!(puts.iter().all(|(bucket, _, _)| bucket == "test-bucket"));
        assert!(
            puts.iter()
                .any(|(_, key, path)| key == "sub/b.txt" && path == Path::new("/staging/sub/b.txt"))
        );
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = Arc::new(RecordingStore::new());
        let dispatcher = UploadDispatcher::new(store.clone(), DEFAULT_MAX_WORKERS);

        dispatcher
            .dispatch("test-bucket", "out", &manifest(&["a.txt", "sub/b.txt"]))
            .await
            .unwrap();

        assert_eq!(store.keys(), vec!["out/a.txt", "out/sub/b.txt"]);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_rest() {
        let mut store = RecordingStore::new();
        store.failing_keys = vec!["c.txt".to_string()];
        let store = Arc::new(store);
        let dispatcher = UploadDispatcher::new(store.clone(), 2);

        let err = dispatcher
            .dispatch(
                "test-bucket",
                "",
                &manifest(&["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]),
            )
            .await
            .unwrap_err();

        assert_eq!(store.keys().len(), 5);
        match err {
            UploaderError::PartialUpload {
                failures,
                attempted,
            } => {
                assert_eq!(attempted, 5);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].key, "c.txt");
                assert!(failures[0].reason.contains("AccessDenied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_manifest_uploads_nothing() {
        let store = Arc::new(RecordingStore::new());
        let dispatcher = UploadDispatcher::new(store.clone(), DEFAULT_MAX_WORKERS);

        let report = dispatcher.dispatch("test-bucket", "out", &[]).await.unwrap();

        assert!(report.uploaded.is_empty());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_worker_count_is_at_least_one() {
        let dispatcher = UploadDispatcher::new(Arc::new(RecordingStore::new()), 0);
        assert_eq!(dispatcher.max_workers(), 1);
    }

    /// Tracks the highest number of puts in flight at once
    struct SlowStore {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for SlowStore {
        async fn bucket_exists(&self, _bucket: &str) -> Result<(), UploaderError> {
            Ok(())
        }

        async fn put_object(
            &self,
            _bucket: &str,
            _key: &str,
            _local_path: &Path,
        ) -> Result<(), UploaderError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_is_bounded_and_waits_for_all() {
        let store = Arc::new(SlowStore {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        });
        let dispatcher = UploadDispatcher::new(store.clone(), 3);
        let names: Vec<String> = (0..12).map(|i| format!("f{i}.txt")).collect();
        let paths: Vec<&str> = names.iter().map(String::as_str).collect();

        let report = dispatcher
            .dispatch("test-bucket", "", &manifest(&paths))
            .await
            .unwrap();

        assert_eq!(report.uploaded.len(), 12);
        assert_eq!(store.finished.load(Ordering::SeqCst), 12);
        assert!(store.peak.load(Ordering::SeqCst) <= 3);
    }
}
