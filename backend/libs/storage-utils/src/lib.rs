/// Shared storage utilities for the social client
///
/// Builds the addresses the client hands to the UI for stored objects:
/// transformed previews of uploaded images, raw file views, and generated
/// initials avatars. Nothing here performs I/O.

pub mod config;
pub mod preview;

pub use config::StorageConfig;
pub use preview::{Gravity, PreviewOptions, StorageUrlError};

/// Maximum length of a storage object identifier accepted by the backend
pub const MAX_FILE_ID_LEN: usize = 36;

/// Check that a file identifier is usable inside a URL path segment.
///
/// Identifiers are 1..=36 chars of `[A-Za-z0-9._-]` and may not start with a
/// special character.
pub fn validate_file_id(file_id: &str) -> Result<(), StorageUrlError> {
    if file_id.is_empty() {
        return Err(StorageUrlError::EmptyFileId);
    }
    if file_id.len() > MAX_FILE_ID_LEN {
        return Err(StorageUrlError::FileIdTooLong(file_id.len()));
    }
    let first_ok = file_id
        .chars()
        .next()
        .map(|c| c.is_ascii_alphanumeric())
        .unwrap_or(false);
    let rest_ok = file_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !first_ok || !rest_ok {
        return Err(StorageUrlError::InvalidFileId(file_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_id() {
        assert!(validate_file_id("65a1f0c2e9b1d3a4f5c6").is_ok());
        assert!(validate_file_id("a.b_c-d").is_ok());
        assert_eq!(validate_file_id(""), Err(StorageUrlError::EmptyFileId));
        assert!(matches!(
            validate_file_id("_leading"),
            Err(StorageUrlError::InvalidFileId(_))
        ));
        assert!(matches!(
            validate_file_id("has/slash"),
            Err(StorageUrlError::InvalidFileId(_))
        ));
        assert_eq!(
            validate_file_id(&"a".repeat(37)),
            Err(StorageUrlError::FileIdTooLong(37))
        );
    }
}
