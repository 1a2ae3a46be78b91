use std::env;
use std::path::PathBuf;

/// Runtime configuration for the uploader
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Concurrent upload workers (default: 10)
    pub max_workers: usize,

    /// Custom S3 endpoint, e.g. a MinIO server (default: AWS)
    pub s3_endpoint: Option<String>,

    /// S3 region (default: "us-east-1")
    pub s3_region: String,

    /// Static access key; the AWS provider chain is used when unset
    pub s3_access_key: Option<String>,

    /// Static secret key; the AWS provider chain is used when unset
    pub s3_secret_key: Option<String>,

    /// Path-style bucket addressing (default: false)
    pub s3_force_path_style: bool,

    /// Root for the staged archive and extraction dir (default: system temp dir)
    pub temp_dir: Option<PathBuf>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            s3_endpoint: None,
            s3_region: "us-east-1".to_string(),
            s3_access_key: None,
            s3_secret_key: None,
            s3_force_path_style: false,
            temp_dir: None,
        }
    }
}

impl UploaderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            max_workers: lookup("UPLOAD_WORKERS")
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default.max_workers),

            s3_endpoint: lookup("S3_ENDPOINT").filter(|v| !v.is_empty()),

            s3_region: lookup("S3_REGION")
                .filter(|v| !v.is_empty())
                .unwrap_or(default.s3_region),

            s3_access_key: lookup("S3_ACCESS_KEY").filter(|v| !v.is_empty()),

            s3_secret_key: lookup("S3_SECRET_KEY").filter(|v| !v.is_empty()),

            s3_force_path_style: lookup("S3_FORCE_PATH_STYLE")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.s3_force_path_style),

            temp_dir: lookup("UPLOADER_TEMP_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}
