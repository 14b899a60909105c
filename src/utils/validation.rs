//! Centralized validation and helper functions.

use std::path::{Path, PathBuf};

/// Security-related constants for input validation
pub const MAX_COMPONENT_LENGTH: usize = 255;

/// Magic prefix of a NumPy `.npy` file
pub const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Validation error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Path component too long: exceeds {MAX_COMPONENT_LENGTH} characters")]
    ComponentTooLong,
    #[error("Invalid path component '{0}': contains path traversal or invalid characters")]
    InvalidComponent(String),
    #[error("Empty path component")]
    EmptyComponent,
}

/// Check that a dataset identifier or file name is a single, plain path
/// component so joining it under a data root cannot escape that root.
///
/// # Examples
///
/// ```
/// use em_dataprep::utils::validation::validate_path_component;
///
/// assert!(validate_path_component("stitched_vol19-vol34").is_ok());
/// assert!(validate_path_component("msk.d128.h5").is_ok());
/// assert!(validate_path_component("../img.h5").is_err());
/// assert!(validate_path_component("a/b").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyComponent` if the name is blank,
/// `ValidationError::ComponentTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidComponent` if it contains separators, `..`, or
/// control characters.
pub fn validate_path_component(name: &str) -> Result<&str, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyComponent);
    }

    if name.len() > MAX_COMPONENT_LENGTH {
        return Err(ValidationError::ComponentTooLong);
    }

    // Prevent directory traversal
    if name == "." || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ValidationError::InvalidComponent(name.to_string()));
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidComponent(name.to_string()));
    }

    Ok(name)
}

/// Check that `found` has the same spatial extent as `expected`
#[must_use]
pub fn same_extent(expected: &[usize], found: &[usize]) -> bool {
    expected == found
}

/// Check file content against the `.npy` magic number
#[must_use]
pub fn is_npy(content: &[u8]) -> bool {
    content.starts_with(NPY_MAGIC)
}

/// Expand a leading `~` to the user's home directory
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
