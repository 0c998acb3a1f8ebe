// ABOUTME: Pre-extraction checks for downloaded artifacts.
// ABOUTME: Size floor, gzip signature sniff, then a full decompression integrity pass.

use flate2::read::GzDecoder;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Artifacts smaller than this are error pages or empty responses.
pub const MIN_ARTIFACT_SIZE: u64 = 1024;

/// Bytes of a rejected artifact kept for diagnostics.
pub const PREVIEW_LEN: usize = 500;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];
const BZIP2_MAGIC: [u8; 3] = [b'B', b'Z', b'h'];
const XZ_MAGIC: [u8; 6] = [0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// Content type detected from an artifact's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Gzip,
    Zip,
    Bzip2,
    Xz,
    Html,
    Json,
    Text,
    Unknown,
}

impl ArtifactType {
    /// Sniff the type from the first bytes of a file.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            return ArtifactType::Gzip;
        }
        if head.starts_with(&ZIP_MAGIC) {
            return ArtifactType::Zip;
        }
        if head.starts_with(&BZIP2_MAGIC) {
            return ArtifactType::Bzip2;
        }
        if head.starts_with(&XZ_MAGIC) {
            return ArtifactType::Xz;
        }

        let Some(text) = utf8_prefix(head) else {
            return ArtifactType::Unknown;
        };
        let trimmed = text.trim_start();
        let lower = trimmed
            .chars()
            .take(16)
            .collect::<String>()
            .to_ascii_lowercase();
        if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
            ArtifactType::Html
        } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
            ArtifactType::Json
        } else {
            ArtifactType::Text
        }
    }
}

/// `head` as text, dropping a multi-byte character cut off by the read limit.
/// `None` when the bytes are not UTF-8 at all.
fn utf8_prefix(head: &[u8]) -> Option<&str> {
    match std::str::from_utf8(head) {
        Ok(text) => Some(text),
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok(),
        Err(_) => None,
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactType::Gzip => "gzip",
            ArtifactType::Zip => "zip",
            ArtifactType::Bzip2 => "bzip2",
            ArtifactType::Xz => "xz",
            ArtifactType::Html => "html",
            ArtifactType::Json => "json",
            ArtifactType::Text => "text",
            ArtifactType::Unknown => "unknown binary",
        };
        write!(f, "{name}")
    }
}

/// Facts derived from a validated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactMetadata {
    pub size_bytes: u64,
    pub detected_type: ArtifactType,
    pub integrity_ok: bool,
}

/// Reasons an artifact is rejected before extraction.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("artifact not found at {}", .0.display())]
    Missing(PathBuf),

    #[error(
        "artifact is only {size} bytes (minimum {MIN_ARTIFACT_SIZE}); likely an error page or empty response"
    )]
    TooSmall { size: u64 },

    #[error("artifact is not a gzip archive (detected {detected})")]
    WrongType {
        detected: ArtifactType,
        /// Leading bytes of the payload, lossily decoded.
        preview: String,
    },

    #[error("archive failed integrity check: {0}")]
    Corrupt(String),

    #[error("failed to read artifact: {0}")]
    Io(#[from] io::Error),
}

/// Run the size, type, and integrity checks in order.
pub fn validate(path: &Path) -> Result<ArtifactMetadata, ValidationError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta,
        _ => return Err(ValidationError::Missing(path.to_path_buf())),
    };

    let size = meta.len();
    if size < MIN_ARTIFACT_SIZE {
        return Err(ValidationError::TooSmall { size });
    }

    let mut head = Vec::with_capacity(PREVIEW_LEN);
    File::open(path)?
        .take(PREVIEW_LEN as u64)
        .read_to_end(&mut head)?;

    let detected = ArtifactType::detect(&head);
    tracing::info!("Artifact is {} bytes, detected type: {}", size, detected);

    if detected != ArtifactType::Gzip {
        let preview = match utf8_prefix(&head) {
            Some(text) => text.to_string(),
            None => String::from_utf8_lossy(&head).into_owned(),
        };
        tracing::error!("Artifact preview (first {} bytes):\n{}", head.len(), preview);
        return Err(ValidationError::WrongType { detected, preview });
    }

    verify_gzip_stream(path)?;
    tracing::info!("Archive integrity verified");

    Ok(ArtifactMetadata {
        size_bytes: size,
        detected_type: detected,
        integrity_ok: true,
    })
}

/// Decompress the whole stream to a sink; the gzip trailer carries a CRC32 and length.
fn verify_gzip_stream(path: &Path) -> Result<u64, ValidationError> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    io::copy(&mut decoder, &mut io::sink()).map_err(|e| ValidationError::Corrupt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_gzip_magic() {
        assert_eq!(ArtifactType::detect(&[0x1f, 0x8b, 0x08, 0x00]), ArtifactType::Gzip);
    }

    #[test]
    fn detects_html_error_pages() {
        assert_eq!(
            ArtifactType::detect(b"\n  <!DOCTYPE html><html>"),
            ArtifactType::Html
        );
        assert_eq!(ArtifactType::detect(b"<HTML><body>"), ArtifactType::Html);
    }

    #[test]
    fn detects_json_bodies() {
        assert_eq!(
            ArtifactType::detect(br#"{"message":"Not Found"}"#),
            ArtifactType::Json
        );
    }

    #[test]
    fn detects_other_archive_formats() {
        assert_eq!(ArtifactType::detect(b"PK\x03\x04rest"), ArtifactType::Zip);
        assert_eq!(ArtifactType::detect(b"BZh91AY"), ArtifactType::Bzip2);
    }

    #[test]
    fn character_cut_by_read_limit_still_sniffs_as_html() {
        let mut page = b"<!DOCTYPE html>".to_vec();
        page.resize(499, b' ');
        page.extend_from_slice("é".as_bytes());
        let head = &page[..500];

        assert_eq!(ArtifactType::detect(head), ArtifactType::Html);
        assert_eq!(utf8_prefix(head).map(str::len), Some(499));
    }

    #[test]
    fn invalid_byte_mid_stream_is_unknown() {
        assert_eq!(ArtifactType::detect(b"<html>\xff\xfe<body>"), ArtifactType::Unknown);
    }

    #[test]
    fn non_utf8_binary_is_unknown() {
        assert_eq!(ArtifactType::detect(&[0x00, 0xff, 0xfe, 0x80]), ArtifactType::Unknown);
    }
}
