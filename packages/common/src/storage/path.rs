use super::error::StorageError;

/// Validate a backend storage name: a single flat path component.
///
/// Backends only ever store under names of the form
/// `{code}_{timestamp}.{ext}`, so anything with directory structure,
/// traversal patterns, control characters or a leading dot is hostile
/// input and fails closed.
pub fn validate_storage_name(name: &str) -> Result<&str, StorageError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(StorageError::PathDenied("empty storage name".into()));
    }

    if trimmed.contains('\0') || trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(StorageError::PathDenied(
            "control characters are not allowed".into(),
        ));
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(StorageError::PathDenied(
            "path separators are not allowed".into(),
        ));
    }

    if trimmed == ".." {
        return Err(StorageError::PathDenied("'..' is not allowed".into()));
    }

    if trimmed.starts_with('.') {
        return Err(StorageError::PathDenied(
            "hidden names are not allowed".into(),
        ));
    }

    Ok(trimmed)
}
