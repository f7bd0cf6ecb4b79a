//! Paste name rules.
//!
//! A paste name is a non-empty string over `[a-z0-9_\-/]`. The set deliberately
//! excludes `\n`, which the flat-file record format reserves as its separator.

use crate::error::AppError;

/// Human-readable form of the accepted name pattern.
pub const NAME_PATTERN: &str = "^[a-z0-9_\\-/]+$";

fn is_name_char(ch: char) -> bool {
    matches!(ch, 'a'..='z' | '0'..='9' | '_' | '-' | '/')
}

/// Return `true` when `name` matches [`NAME_PATTERN`].
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_name_char)
}

/// Validate a paste name before it reaches storage.
///
/// # Returns
/// `Ok(())` when the name is acceptable.
///
/// # Errors
/// Returns [`AppError::InvalidName`] naming the rejected value.
pub fn validate_name(name: &str) -> Result<(), AppError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(AppError::InvalidName(format!(
            "'{}' does not match {}",
            name, NAME_PATTERN
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_digits_and_separators() {
        for name in ["a-b_c/d9", "foo/bar", "a", "0", "--", "x/y/z"] {
            assert!(is_valid_name(name), "name: {}", name);
            assert!(validate_name(name).is_ok());
        }
    }

    #[test]
    fn rejects_spaces_uppercase_and_punctuation() {
        for name in ["Has Spaces", "UPPER", "semi;colon", "", "tab\tname", "line\nbreak", "ünï"] {
            assert!(!is_valid_name(name), "name: {:?}", name);
            assert!(matches!(
                validate_name(name),
                Err(AppError::InvalidName(_))
            ));
        }
    }
}
