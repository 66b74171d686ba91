//! Field checks applied before a repository touches the store.

use super::manager::DatabaseError;

/// A required string: must be present and not blank. Returned trimmed.
pub fn required_text(value: Option<&str>, message: &str) -> Result<String, DatabaseError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DatabaseError::Validation(message.to_string())),
    }
}

/// A supplied-but-optional replacement for a required field (partial updates).
/// `None` means "leave it alone"; a blank value is rejected.
pub fn required_patch(value: Option<&str>, message: &str) -> Result<Option<String>, DatabaseError> {
    match value {
        Some(v) => required_text(Some(v), message).map(Some),
        None => Ok(None),
    }
}

/// Optional unique text such as an email: blank collapses to `None` so two rows
/// without an email never collide on the unique index.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank() {
        assert_eq!(required_text(Some("  Acme "), "Name is required").unwrap(), "Acme");
        assert!(matches!(
            required_text(Some("   "), "Name is required"),
            Err(DatabaseError::Validation(msg)) if msg == "Name is required"
        ));
        assert!(required_text(None, "Name is required").is_err());
    }

    #[test]
    fn required_patch_passes_absent_through() {
        assert_eq!(required_patch(None, "Title is required").unwrap(), None);
        assert_eq!(
            required_patch(Some("Call back"), "Title is required").unwrap(),
            Some("Call back".to_string())
        );
        assert!(required_patch(Some(""), "Title is required").is_err());
    }

    #[test]
    fn optional_text_collapses_blank() {
        assert_eq!(optional_text(Some(" ")), None);
        assert_eq!(optional_text(Some(" jane@example.com ")), Some("jane@example.com".to_string()));
        assert_eq!(optional_text(None), None);
    }
}
