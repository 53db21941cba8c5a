//! Storage name generation and filename sanitization.
//!
//! Names embed the uploading principal, a millisecond timestamp, and random
//! entropy: `{principal}_{unix_millis}_{16 hex chars}{ext}`. Uniqueness
//! needs no coordination across concurrent calls.

use crate::StorageError;
use chrono::Utc;
use rand::RngCore;
use uuid::Uuid;

const MAX_FILENAME_LENGTH: usize = 255;

/// Sanitize a client-supplied filename to prevent path traversal and
/// invalid characters. Returns an error on traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, StorageError> {
    if filename.contains("..") {
        return Err(StorageError::InvalidName(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

/// Lower-cased extension of a filename, with the leading dot; empty when
/// the name has none.
fn extension_suffix(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Generate a collision-resistant storage name for an upload.
pub fn storage_name(original_filename: &str, principal_id: Uuid) -> Result<String, StorageError> {
    storage_name_with(original_filename, principal_id, &mut rand::rng())
}

/// Same as [`storage_name`] but with an injected entropy source, so tests
/// can pin the random component.
pub fn storage_name_with<R: RngCore>(
    original_filename: &str,
    principal_id: Uuid,
    rng: &mut R,
) -> Result<String, StorageError> {
    let sanitized = sanitize_filename(original_filename)?;
    let ext = extension_suffix(&sanitized);

    let mut entropy = [0u8; 8];
    rng.fill_bytes(&mut entropy);

    Ok(format!(
        "{}_{}_{}{}",
        principal_id,
        Utc::now().timestamp_millis(),
        hex::encode(entropy),
        ext
    ))
}

/// Thumbnail sibling name for a stored asset: same stem, jpeg extension.
pub fn thumbnail_name(storage_name: &str) -> String {
    match storage_name.rsplit_once('.') {
        Some((stem, _ext)) => format!("{}.jpg", stem),
        None => format!("{}.jpg", storage_name),
    }
}
