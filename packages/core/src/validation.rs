// ABOUTME: Field-level validation helpers shared by entity types
// ABOUTME: Length and range checks that reject malformed input before it reaches the store

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not exceed {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} must be between {min} and {max} (got {actual})")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

/// Reject values longer than `max` characters. Absent values always pass.
pub fn check_max_length(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => {
            let actual = value.chars().count();
            if actual > max {
                Err(ValidationError::TooLong { field, max, actual })
            } else {
                Ok(())
            }
        }
        None => Ok(()),
    }
}

/// Reject values outside the inclusive range `min..=max`
pub fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            actual: value,
        })
    }
}

/// Truncate a string to at most `max_chars` characters
pub fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_check_max_length() {
        assert!(check_max_length("subject", None, 3).is_ok());
        assert!(check_max_length("subject", Some("abc"), 3).is_ok());
        assert_eq!(
            check_max_length("subject", Some("abcd"), 3),
            Err(ValidationError::TooLong {
                field: "subject",
                max: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn test_check_max_length_counts_characters_not_bytes() {
        // four characters, eight bytes
        assert!(check_max_length("subject", Some("äöüß"), 4).is_ok());
    }

    #[test]
    fn test_check_range() {
        assert!(check_range("completionRate", 0, 0, 100).is_ok());
        assert!(check_range("completionRate", 100, 0, 100).is_ok());

        let err = check_range("completionRate", 101, 0, 100).unwrap_err();
        assert_eq!(err.field(), "completionRate");
        assert!(err.to_string().contains("between 0 and 100"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("äöüß", 2), "äö");
        assert_eq!(truncate("", 2), "");
    }
}
