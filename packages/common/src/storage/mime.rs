//! MIME type determination for uploaded content.
//!
//! The extension is trusted first; content sniffing over the leading bytes
//! is only used when the extension is missing or unknown.

use std::io::SeekFrom;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use super::error::StorageError;

/// Number of leading bytes inspected when sniffing.
pub const SNIFF_LEN: usize = 512;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension overrides applied before the `mime_guess` database.
const EXTENSION_OVERRIDES: &[(&str, &str)] = &[
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("doc", "application/msword"),
    ("xls", "application/vnd.ms-excel"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pdf", "application/pdf"),
    ("rtf", "application/rtf"),
    ("txt", "text/plain; charset=utf-8"),
    ("zip", "application/zip"),
    ("rar", "application/vnd.rar"),
    ("7z", "application/x-7z-compressed"),
    ("tar", "application/x-tar"),
    ("gz", "application/gzip"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("json", "application/json"),
    ("csv", "text/csv"),
    ("xml", "application/xml"),
];

/// Look up a MIME type from the filename's extension.
pub fn from_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();

    if let Some((_, mime)) = EXTENSION_OVERRIDES.iter().find(|(e, _)| *e == ext) {
        return Some((*mime).to_string());
    }

    mime_guess::from_ext(&ext).first().map(|m| m.to_string())
}

/// Guess a MIME type from the leading bytes of the content.
pub fn sniff(head: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"%PDF-", "application/pdf"),
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b\x08", "application/x-gzip"),
        (b"Rar!\x1a\x07", "application/x-rar-compressed"),
        (b"7z\xbc\xaf\x27\x1c", "application/x-7z-compressed"),
        (b"\x1a\x45\xdf\xa3", "video/webm"),
        (b"OggS\x00", "application/ogg"),
        (b"ID3", "audio/mpeg"),
        (b"\x00\x00\x01\x00", "image/x-icon"),
    ];

    for (signature, mime) in SIGNATURES {
        if head.starts_with(signature) {
            return mime;
        }
    }

    if head.len() >= 12 && &head[..4] == b"RIFF" {
        match &head[8..12] {
            b"WEBP" => return "image/webp",
            b"WAVE" => return "audio/wave",
            b"AVI " => return "video/avi",
            _ => {}
        }
    }

    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return "video/mp4";
    }

    let trimmed = trim_leading_whitespace(head);
    if starts_with_ignore_case(trimmed, b"<!doctype html") || starts_with_ignore_case(trimmed, b"<html")
    {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if looks_like_text(head) {
        return "text/plain; charset=utf-8";
    }

    OCTET_STREAM
}

/// Determine the MIME type for an upload.
///
/// Reads at most [`SNIFF_LEN`] bytes when the extension is not recognised and
/// always leaves the reader positioned at offset 0.
pub async fn detect<R>(filename: &str, reader: &mut R) -> Result<String, StorageError>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    if let Some(mime) = from_extension(filename) {
        return Ok(mime);
    }

    let mut head = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = reader.read(&mut head[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    head.truncate(filled);
    reader.seek(SeekFrom::Start(0)).await?;

    Ok(sniff(&head).to_string())
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn starts_with_ignore_case(data: &[u8], prefix: &[u8]) -> bool {
    data.len() >= prefix.len() && data[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.is_empty() {
        return false;
    }
    if std::str::from_utf8(head).is_err() && !utf8_truncated_at_end(head) {
        return false;
    }
    !head
        .iter()
        .any(|&b| b == 0 || (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | b'\x0c' | b'\x1b')))
}

/// A 512-byte window may cut a multi-byte character in half.
fn utf8_truncated_at_end(head: &[u8]) -> bool {
    match std::str::from_utf8(head) {
        Ok(_) => false,
        Err(e) => e.error_len().is_none() && e.valid_up_to() + 4 > head.len(),
    }
}
