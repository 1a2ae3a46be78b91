use std::path::{Component, Path};

/// Derives the object key for a file relative to the extraction root.
///
/// Segments are always joined with `/`, whatever the host separator is.
/// A trailing `/` on the prefix is ignored, and an empty prefix leaves the
/// relative path unchanged.
pub fn object_key(prefix: &str, relative_path: &Path) -> String {
    let relative = relative_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        relative
    } else {
        format!("{}/{}", prefix, relative)
    }
}
