/// Longest filename accepted, in characters.
pub const MAX_FILENAME_LEN: usize = 255;

/// Result of validating an uploaded filename.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    #[error("Filename cannot be empty")]
    Empty,
    /// Filename is `.` or `..`.
    #[error("Invalid filename: '.' and '..' are not allowed")]
    PathTraversal,
    #[error("Invalid filename: null bytes are not allowed")]
    NullByte,
    /// CR, LF and other ASCII control characters.
    #[error("Invalid filename: control characters are not allowed")]
    ControlCharacter,
    #[error("Invalid filename: must be at most 255 characters")]
    TooLong,
}

/// Normalise the filename a client declared for a multipart part.
///
/// Some clients send the full local path; only the final component is kept.
pub fn sanitize_upload_filename(filename: &str) -> Result<String, FilenameError> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() {
        return Err(FilenameError::Empty);
    }

    if base.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Reject ASCII control characters to prevent
    // header injection when the name is echoed back.
    if base.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if base == "." || base == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if base.chars().count() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }

    Ok(base.to_string())
}
