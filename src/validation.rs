//! Identifier validation for values that end up inside storage keys.
//!
//! User ids come from the external auth provider and module ids from the catalog
//! seed file. Both are embedded in `progress:<user>:<module>` keys, so anything that
//! could break key framing or a log line is rejected before any store I/O.

use std::collections::HashSet;

/// Maximum accepted length of a user id, in bytes.
pub const MAX_USER_ID_LEN: usize = 128;

/// User id validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    #[error("user id is empty")]
    Empty,

    #[error("user id is too long (maximum {max} bytes)")]
    TooLong { max: usize },

    #[error("user id cannot start or end with whitespace")]
    InvalidWhitespace,

    #[error("user id contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("user id contains path separators (/ or \\)")]
    PathTraversal,
}

/// Validate a user id handed over by the authentication collaborator.
///
/// Provider ids are opaque; only characters that would break key framing
/// (`:`), filesystems, or single-line logs are refused.
pub fn validate_user_id(user_id: &str) -> Result<&str, UserIdError> {
    if user_id.is_empty() {
        return Err(UserIdError::Empty);
    }
    if user_id.len() > MAX_USER_ID_LEN {
        return Err(UserIdError::TooLong {
            max: MAX_USER_ID_LEN,
        });
    }
    if user_id.trim() != user_id {
        return Err(UserIdError::InvalidWhitespace);
    }
    if user_id.contains("..") || user_id.contains('/') || user_id.contains('\\') {
        return Err(UserIdError::PathTraversal);
    }

    let invalid: HashSet<char> = user_id
        .chars()
        .filter(|c| c.is_control() || *c == ':' || *c == '\0')
        .collect();
    if !invalid.is_empty() {
        let chars = invalid
            .into_iter()
            .map(|c| {
                if c.is_control() {
                    format!("\\u{{{:04x}}}", c as u32)
                } else {
                    c.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        return Err(UserIdError::InvalidCharacters { chars });
    }

    Ok(user_id)
}

/// Module ids are authored, so they are held to a stricter slug format:
/// lowercase ASCII letters, digits and `-`.
pub fn is_valid_module_slug(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && !id.starts_with('-')
        && !id.ends_with('-')
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_ids_accepted() {
        assert_eq!(validate_user_id("kX9fQ2mB7tYc1LrPz0aHdE4w8sN3").unwrap(), "kX9fQ2mB7tYc1LrPz0aHdE4w8sN3");
        assert!(validate_user_id("alice@example.org").is_ok());
        assert!(validate_user_id("user_42-test.x").is_ok());
    }

    #[test]
    fn test_user_id_rejections() {
        assert_eq!(validate_user_id(""), Err(UserIdError::Empty));
        assert_eq!(validate_user_id(" alice"), Err(UserIdError::InvalidWhitespace));
        assert_eq!(validate_user_id("../etc/passwd"), Err(UserIdError::PathTraversal));
        assert_eq!(validate_user_id("a\\b"), Err(UserIdError::PathTraversal));
        assert!(matches!(
            validate_user_id("alice:bob"),
            Err(UserIdError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            validate_user_id("line\nbreak"),
            Err(UserIdError::InvalidCharacters { .. })
        ));
        let long = "x".repeat(MAX_USER_ID_LEN + 1);
        assert_eq!(
            validate_user_id(&long),
            Err(UserIdError::TooLong { max: MAX_USER_ID_LEN })
        );
    }

    #[test]
    fn test_module_slug() {
        assert!(is_valid_module_slug("what-is-hiv-aids"));
        assert!(is_valid_module_slug("module2"));
        assert!(!is_valid_module_slug(""));
        assert!(!is_valid_module_slug("Module"));
        assert!(!is_valid_module_slug("a:b"));
        assert!(!is_valid_module_slug("-lead"));
        assert!(!is_valid_module_slug("has space"));
    }
}
