use crate::error::UploaderError;
use crate::models::{ManifestEntry, PipelineStage};
use crate::services::extract::{ArchiveFormat, extract_archive};
use crate::services::transfer::TransferGateway;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

const TEMP_PREFIX: &str = "archive-uploader-";

/// Downloaded and extracted archive.
///
/// Owns the temporary archive file and the extraction directory. Both are
/// removed by [`StagedArchive::cleanup`], or on drop if cleanup never runs.
#[derive(Debug)]
pub struct StagedArchive {
    archive: NamedTempFile,
    extract_dir: TempDir,
    manifest: Vec<ManifestEntry>,
}

impl StagedArchive {
    pub fn archive_path(&self) -> &Path {
        self.archive.path()
    }

    pub fn extract_dir(&self) -> &Path {
        self.extract_dir.path()
    }

    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    /// Deletes the temporary file and directory. Failures are logged only.
    pub fn cleanup(self) {
        release_file(self.archive);
        release_dir(self.extract_dir);
        tracing::info!("🧹 Temporary archive and extracted files have been deleted");
    }
}

pub struct ArchiveStager {
    temp_root: Option<PathBuf>,
}

impl ArchiveStager {
    pub fn new(temp_root: Option<PathBuf>) -> Self {
        Self { temp_root }
    }

    /// Downloads the archive at `url`, extracts it and lists its regular files.
    ///
    /// Temporary resources created before a failure are removed before the
    /// error is returned.
    pub async fn stage(
        &self,
        transfer: &dyn TransferGateway,
        url: &str,
    ) -> Result<StagedArchive, UploaderError> {
        let hinted = ArchiveFormat::from_url(url);
        let suffix = hinted.unwrap_or(ArchiveFormat::Zip).suffix();

        // Fetching
        let archive = self.temp_file(suffix)?;
        let data = match transfer.fetch(url).await {
            Ok(data) => data,
            Err(e) => {
                release_file(archive);
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::write(archive.path(), &data).await {
            release_file(archive);
            return Err(UploaderError::staging(
                PipelineStage::Fetching,
                "write downloaded archive",
                e,
            ));
        }
        tracing::info!("📦 Archive downloaded successfully ({} bytes)", data.len());

        // Extracting
        let extract_dir = match self.temp_dir() {
            Ok(dir) => dir,
            Err(e) => {
                release_file(archive);
                return Err(e);
            }
        };
        let format = ArchiveFormat::sniff(&data).or(hinted);
        drop(data);

        tracing::info!(
            stage = %PipelineStage::Extracting,
            "🗜️  Extracting archive: {}",
            archive.path().display()
        );
        let extracted = match format {
            Some(format) => {
                let archive_path = archive.path().to_path_buf();
                let dest = extract_dir.path().to_path_buf();
                tokio::task::spawn_blocking(move || extract_archive(format, &archive_path, &dest))
                    .await
                    .unwrap_or_else(|e| {
                        Err(UploaderError::Extract(format!("Extraction task failed: {}", e)))
                    })
            }
            None => Err(UploaderError::Extract(
                "Unsupported archive format (expected zip, tar or tar.gz)".to_string(),
            )),
        };
        if let Err(e) = extracted {
            release_file(archive);
            release_dir(extract_dir);
            return Err(e);
        }
        tracing::info!("✅ Archive extracted successfully.");

        // Enumerating
        tracing::info!(stage = %PipelineStage::Enumerating, "🗂️  Listing extracted files");
        let mut manifest = Vec::new();
        if let Err(e) = collect_files(extract_dir.path(), extract_dir.path(), &mut manifest).await {
            release_file(archive);
            release_dir(extract_dir);
            return Err(UploaderError::staging(
                PipelineStage::Enumerating,
                "list extracted files",
                e,
            ));
        }
        manifest.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        tracing::info!("Found {} files in archive", manifest.len());

        Ok(StagedArchive {
            archive,
            extract_dir,
            manifest,
        })
    }

    fn temp_file(&self, suffix: &str) -> Result<NamedTempFile, UploaderError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(suffix);
        let file = match &self.temp_root {
            Some(root) => builder.tempfile_in(root),
            None => builder.tempfile(),
        };
        file.map_err(|e| UploaderError::staging(PipelineStage::Fetching, "create temporary file", e))
    }

    fn temp_dir(&self) -> Result<TempDir, UploaderError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX);
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| {
            UploaderError::staging(PipelineStage::Extracting, "create extraction directory", e)
        })
    }
}

/// Walks `dir` recursively, pushing one entry per regular file.
#[async_recursion::async_recursion]
async fn collect_files(
    root: &Path,
    dir: &Path,
    manifest: &mut Vec<ManifestEntry>,
) -> std::io::Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        let path = entry.path();

        if file_type.is_dir() {
            collect_files(root, &path, manifest).await?;
        } else if file_type.is_file() {
            let relative_path = path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .map_err(std::io::Error::other)?;
            tracing::debug!("Staged {}", relative_path.display());
            manifest.push(ManifestEntry {
                local_path: path,
                relative_path,
            });
        }
    }
    Ok(())
}

fn release_file(file: NamedTempFile) {
    let path = file.path().to_path_buf();
    if let Err(e) = file.close() {
        tracing::warn!("⚠️  Failed to delete temporary file {}: {}", path.display(), e);
    }
}

fn release_dir(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        tracing::warn!(
            "⚠️  Failed to delete temporary directory {}: {}",
            path.display(),
            e
        );
    }
}
