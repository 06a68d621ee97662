//! Input validation and the supported file-type table.

use std::path::Path;

use crate::error::{Error, Result};

pub const MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;
pub const MIN_PASSPHRASE_LEN: usize = 12;
pub const MAX_PASSPHRASE_LEN: usize = 256;

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// The closed set of supported document formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileType {
    Pdf,
    Word,
    Excel,
    Text,
}

impl FileType {
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" | "docx" | "docm" | "dotx" | "dotm" => Some(Self::Word),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "xltx" | "xltm" => Some(Self::Excel),
            "txt" | "md" | "csv" | "json" | "xml" => Some(Self::Text),
            _ => None,
        }
    }

    /// Determine the file type from a path's extension.
    ///
    /// # Errors
    ///
    /// Errors if the extension is missing or unsupported.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(extension).ok_or_else(|| {
            Error::Input(format!(
                "unsupported file format: '{}'",
                path.to_string_lossy()
            ))
        })
    }

    /// The tag stored in container metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Excel => "excel",
            Self::Text => "text",
        }
    }
}

/// Reject empty and oversize payloads.
///
/// # Errors
///
/// Errors if the payload is empty or larger than [`MAX_FILE_SIZE`].
pub fn validate_size(size: u64) -> Result<()> {
    if size == 0 {
        return Err(Error::Input("file is empty".to_string()));
    }
    if size > MAX_FILE_SIZE {
        return Err(Error::Input(format!(
            "file is too large: {size} bytes, maximum is {MAX_FILE_SIZE}"
        )));
    }
    Ok(())
}

/// Enforce the passphrase complexity policy.
///
/// 12 to 256 characters, with at least 3 of: uppercase, lowercase,
/// digits, special characters.
///
/// # Errors
///
/// Errors if the passphrase is too short, too long, or too weak.
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    let length = passphrase.chars().count();
    if length < MIN_PASSPHRASE_LEN {
        return Err(Error::Input(format!(
            "passphrase is too short, minimum is {MIN_PASSPHRASE_LEN} characters"
        )));
    }
    if length > MAX_PASSPHRASE_LEN {
        return Err(Error::Input(format!(
            "passphrase is too long, maximum is {MAX_PASSPHRASE_LEN} characters"
        )));
    }

    let has_uppercase = passphrase.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = passphrase.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = passphrase.chars().any(|c| c.is_ascii_digit());
    let has_special = passphrase.chars().any(|c| SPECIAL_CHARS.contains(c));

    let strength = usize::from(has_uppercase)
        + usize::from(has_lowercase)
        + usize::from(has_digit)
        + usize::from(has_special);

    if strength < 3 {
        return Err(Error::Input(
            "passphrase is too weak, mix uppercase, lowercase, digits and special characters"
                .to_string(),
        ));
    }

    Ok(())
}

/// Make a recovered filename safe to write to disk.
///
/// Strips path and shell metacharacters, trims dots and spaces, and
/// caps the length at 255 bytes while keeping the extension.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = sanitized.trim_matches(|c| c == '.' || c == ' ');

    if sanitized.len() <= 255 {
        return sanitized.to_string();
    }

    let (stem, extension) = match sanitized.rfind('.') {
        Some(i) => sanitized.split_at(i),
        None => (sanitized, ""),
    };
    let mut stem = stem.to_string();
    while stem.len() + extension.len() > 255 {
        stem.pop();
    }
    stem + extension
}
