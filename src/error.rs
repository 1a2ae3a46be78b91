use crate::models::{PipelineStage, UploadFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploaderError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("S3 bucket '{bucket}' is missing or inaccessible: {source}")]
    Bucket {
        bucket: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid URL {url} with error: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to download archive from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to extract archive: {0}")]
    Extract(String),

    #[error("Failed to {context}: {source}")]
    Staging {
        stage: PipelineStage,
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to upload {key}: {source}")]
    Upload {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{} of {attempted} uploads failed", .failures.len())]
    PartialUpload {
        failures: Vec<UploadFailure>,
        attempted: usize,
    },
}

impl UploaderError {
    pub(crate) fn staging(
        stage: PipelineStage,
        context: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Staging {
            stage,
            context: context.into(),
            source,
        }
    }

    /// Pipeline stage an error belongs to.
    pub fn stage(&self) -> PipelineStage {
        match self {
            UploaderError::InvalidRequest(_)
            | UploaderError::Bucket { .. }
            | UploaderError::Unreachable { .. } => PipelineStage::Validating,
            UploaderError::Fetch { .. } => PipelineStage::Fetching,
            UploaderError::Extract(_) => PipelineStage::Extracting,
            UploaderError::Staging { stage, .. } => *stage,
            UploaderError::Upload { .. } | UploaderError::PartialUpload { .. } => {
                PipelineStage::Uploading
            }
        }
    }
}
