use crate::error::UploaderError;
use crate::utils::validation::{validate_bucket_name, validate_source_url};
use std::fmt;
use std::path::PathBuf;

/// One archive-to-bucket transfer, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    source_url: String,
    bucket: String,
    key_prefix: String,
}

impl TransferRequest {
    pub fn new(
        source_url: impl Into<String>,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Result<Self, UploaderError> {
        let source_url = source_url.into();
        let bucket = bucket.into();
        validate_source_url(&source_url)?;
        validate_bucket_name(&bucket)?;

        Ok(Self {
            source_url,
            bucket,
            key_prefix: key_prefix.into(),
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }
}

/// A regular file extracted from the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Absolute path inside the extraction directory
    pub local_path: PathBuf,
    /// Path relative to the extraction root
    pub relative_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { key: String },
    Failed(UploadFailure),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Keys written to the bucket, in manifest order
    pub uploaded: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Fetching,
    Extracting,
    Enumerating,
    Uploading,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Enumerating => "enumerating",
            PipelineStage::Uploading => "uploading",
            PipelineStage::Cleanup => "cleanup",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}
