/// Reasons a blob name is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty or whitespace-only.
    Empty,
    /// Name contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Name is `..` or `.`.
    PathTraversal,
    /// Name contains null bytes.
    NullByte,
    /// Name starts with a dot (hidden file).
    Hidden,
    /// Name contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// Name is longer than [`MAX_NAME_LEN`] bytes.
    TooLong,
}

/// Longest name accepted, in bytes. Most filesystems cap a path component at 255.
pub const MAX_NAME_LEN: usize = 255;

impl NameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::TooLong => "Invalid filename: longer than 255 bytes",
        }
    }
}

/// Validates a flat blob name (no directory components allowed).
///
/// Leading and trailing whitespace is not trimmed: a blob name is used
/// verbatim as the on-disk filename, so anything that would change it is
/// rejected instead.
pub fn validate_blob_name(name: &str) -> Result<&str, NameError> {
    if name.trim().is_empty() {
        return Err(NameError::Empty);
    }

    if name.contains('\0') {
        return Err(NameError::NullByte);
    }

    // Also keeps CRLF out of Content-Disposition headers.
    if name.chars().any(|c| c.is_control()) {
        return Err(NameError::ControlCharacter);
    }

    if name.contains('/') || name.contains('\\') {
        return Err(NameError::ContainsPathSeparator);
    }

    if name == ".." || name == "." {
        return Err(NameError::PathTraversal);
    }

    if name.starts_with('.') {
        return Err(NameError::Hidden);
    }

    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }

    Ok(name)
}
