use crate::error::UploaderError;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Magic byte signatures for the supported archive formats
const ZIP_SIGNATURES: &[&[u8]] = &[
    &[0x50, 0x4B, 0x03, 0x04], // PK local file header
    &[0x50, 0x4B, 0x05, 0x06], // PK end of central directory (empty archive)
];
const GZIP_SIGNATURE: &[u8] = &[0x1F, 0x8B];
const TAR_MAGIC: &[u8] = b"ustar";
const TAR_MAGIC_OFFSET: usize = 257;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Guesses the format from the URL path, ignoring query and fragment.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url::Url::parse(url)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_else(|_| url.to_lowercase());

        if path.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if path.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }

    /// Identifies the format from the leading bytes of the archive.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if ZIP_SIGNATURES.iter().any(|sig| data.starts_with(sig)) {
            Some(ArchiveFormat::Zip)
        } else if data.starts_with(GZIP_SIGNATURE) {
            Some(ArchiveFormat::TarGz)
        } else if data
            .get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len())
            .is_some_and(|magic| magic == TAR_MAGIC)
        {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::Tar => ".tar",
            ArchiveFormat::TarGz => ".tar.gz",
        }
    }
}

/// Unpacks the archive at `archive_path` into `dest`, keeping its directory layout.
///
/// Blocking; run it on a blocking thread.
pub fn extract_archive(
    format: ArchiveFormat,
    archive_path: &Path,
    dest: &Path,
) -> Result<(), UploaderError> {
    let file = File::open(archive_path).map_err(|e| {
        UploaderError::Extract(format!("Failed to open {}: {}", archive_path.display(), e))
    })?;
    let reader = BufReader::new(file);

    match format {
        ArchiveFormat::Zip => {
            let mut archive = zip::ZipArchive::new(reader)
                .map_err(|e| UploaderError::Extract(format!("Failed to parse ZIP: {}", e)))?;
            archive
                .extract(dest)
                .map_err(|e| UploaderError::Extract(format!("Failed to unpack ZIP: {}", e)))?;
        }
        ArchiveFormat::Tar => unpack_tar(reader, dest, "tar")?,
        ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(reader), dest, "tar.gz")?,
    }

    Ok(())
}

fn unpack_tar<R: Read>(reader: R, dest: &Path, label: &str) -> Result<(), UploaderError> {
    let mut archive = tar::Archive::new(reader);
    archive
        .unpack(dest)
        .map_err(|e| UploaderError::Extract(format!("Failed to unpack {}: {}", label, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            writer
                .start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_format_from_url() {
        assert_eq!(
            ArchiveFormat::from_url("http://example.com/file.zip"),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(
            ArchiveFormat::from_url("https://example.com/a/b.TAR.GZ?sig=1"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_url("https://example.com/b.tgz"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_url("https://example.com/b.tar"),
            Some(ArchiveFormat::Tar)
        );
        assert_eq!(ArchiveFormat::from_url("https://example.com/download"), None);
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(
            ArchiveFormat::sniff(&zip_bytes(&[("a.txt", b"a")])),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(
            ArchiveFormat::sniff(&tar_bytes(&[("a.txt", b"a")])),
            Some(ArchiveFormat::Tar)
        );
        assert_eq!(ArchiveFormat::sniff(&[0x1F, 0x8B, 0x08]), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::sniff(b"some content"), None);
        assert_eq!(ArchiveFormat::sniff(b""), None);
    }

    #[test]
    fn test_extract_zip_preserves_layout() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("in.zip");
        std::fs::write(
            &archive_path,
            zip_bytes(&[("a.txt", b"alpha"), ("sub/b.txt", b"beta")]),
        )
        .unwrap();
        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();

        extract_archive(ArchiveFormat::Zip, &archive_path, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(std::fs::read(dest.join("sub/b.txt")).unwrap(), b"beta");
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("in.tar.gz");
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&tar_bytes(&[("sub/b.txt", b"beta")]))
            .unwrap();
        std::fs::write(&archive_path, encoder.finish().unwrap()).unwrap();
        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();

        extract_archive(ArchiveFormat::TarGz, &archive_path, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("sub/b.txt")).unwrap(), b"beta");
    }

    #[test]
    fn test_extract_corrupt_zip_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("in.zip");
        std::fs::write(&archive_path, b"PK\x03\x04 definitely not a zip").unwrap();

        let err = extract_archive(ArchiveFormat::Zip, &archive_path, dir.path()).unwrap_err();
        assert!(matches!(err, UploaderError::Extract(_)));
    }
}
