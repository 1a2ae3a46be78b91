use crate::config::UploaderConfig;
use crate::error::UploaderError;
use crate::models::{PipelineStage, TransferRequest, UploadReport};
use crate::services::dispatcher::UploadDispatcher;
use crate::services::stager::ArchiveStager;
use crate::services::storage::ObjectStore;
use crate::services::transfer::TransferGateway;
use std::sync::Arc;

/// Runs one archive-to-bucket transfer:
/// validate, stage (fetch, extract, enumerate), upload, clean up.
pub struct Pipeline {
    transfer: Arc<dyn TransferGateway>,
    store: Arc<dyn ObjectStore>,
    stager: ArchiveStager,
    dispatcher: UploadDispatcher,
}

impl Pipeline {
    pub fn new(
        transfer: Arc<dyn TransferGateway>,
        store: Arc<dyn ObjectStore>,
        config: &UploaderConfig,
    ) -> Self {
        Self {
            stager: ArchiveStager::new(config.temp_dir.clone()),
            dispatcher: UploadDispatcher::new(store.clone(), config.max_workers),
            transfer,
            store,
        }
    }

    pub async fn run(&self, request: &TransferRequest) -> Result<UploadReport, UploaderError> {
        let result = self.execute(request).await;
        match &result {
            Ok(report) => {
                tracing::info!(
                    stage = %PipelineStage::Done,
                    "🎉 Uploaded {} files to s3://{}/{}",
                    report.uploaded.len(),
                    request.bucket(),
                    request.key_prefix()
                );
            }
            Err(e) => {
                tracing::error!(
                    stage = %PipelineStage::Failed,
                    failed_at = %e.stage(),
                    "💥 Transfer failed: {}",
                    e
                );
            }
        }
        result
    }

    async fn execute(&self, request: &TransferRequest) -> Result<UploadReport, UploaderError> {
        tracing::info!(stage = %PipelineStage::Validating, "🔎 Validating bucket and source URL");
        self.validate(request).await?;

        tracing::info!(
            stage = %PipelineStage::Fetching,
            "⬇️  Downloading archive from {}",
            request.source_url()
        );
        let staged = self
            .stager
            .stage(self.transfer.as_ref(), request.source_url())
            .await?;

        tracing::info!(stage = %PipelineStage::Uploading, "Dispatching uploads");
        let result = self
            .dispatcher
            .dispatch(request.bucket(), request.key_prefix(), staged.manifest())
            .await;

        tracing::info!(stage = %PipelineStage::Cleanup, "Removing temporary files");
        staged.cleanup();

        result
    }

    /// The bucket is checked before the URL; neither check downloads anything.
    pub async fn validate(&self, request: &TransferRequest) -> Result<(), UploaderError> {
        if let Err(e) = self.store.bucket_exists(request.bucket()).await {
            tracing::error!("S3 bucket failed with: {}", e);
            return Err(e);
        }

        if let Err(e) = self.transfer.check_reachable(request.source_url()).await {
            tracing::error!("{}", e);
            return Err(e);
        }

        Ok(())
    }
}
