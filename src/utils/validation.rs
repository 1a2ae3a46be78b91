use crate::error::UploaderError;
use url::Url;

/// Current S3 naming rules allow 3-63 characters
pub const MIN_BUCKET_NAME_LEN: usize = 3;
pub const MAX_BUCKET_NAME_LEN: usize = 63;

/// Checks that the source is an absolute http(s) URL with a host.
pub fn validate_source_url(source_url: &str) -> Result<Url, UploaderError> {
    let url = Url::parse(source_url).map_err(|e| {
        UploaderError::InvalidRequest(format!("Invalid URL '{}': {}", source_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UploaderError::InvalidRequest(format!(
            "Unsupported URL scheme '{}', expected http or https",
            url.scheme()
        )));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UploaderError::InvalidRequest(format!(
            "URL '{}' has no host",
            source_url
        )));
    }

    Ok(url)
}

/// Rejects only names that can never address a bucket.
///
/// Legacy buckets and S3-compatible stores accept names outside the current
/// S3 rules, so existence is left to `HeadBucket`; such names only log a warning.
pub fn validate_bucket_name(bucket: &str) -> Result<(), UploaderError> {
    if bucket.trim().is_empty() {
        return Err(UploaderError::InvalidRequest(
            "Bucket name must not be empty".to_string(),
        ));
    }

    if bucket.contains('/') {
        return Err(UploaderError::InvalidRequest(format!(
            "Bucket name '{}' must not contain '/'",
            bucket
        )));
    }

    if !follows_s3_naming_rules(bucket) {
        tracing::warn!(
            "⚠️  Bucket name '{}' does not follow current S3 naming rules, relying on the store to accept it",
            bucket
        );
    }

    Ok(())
}

/// Current S3 rules: lowercase letters, digits, '.' and '-', alphanumeric at
/// both ends, no "..".
pub fn follows_s3_naming_rules(bucket: &str) -> bool {
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-';
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());

    (MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&bucket.len())
        && bucket.chars().all(allowed)
        && edge_ok(bucket.chars().next())
        && edge_ok(bucket.chars().last())
        && !bucket.contains("..")
}
