//! Common validation utilities.

use validator::ValidationError;

/// Minimum number of digits in a phone number.
const MIN_PHONE_DIGITS: usize = 6;

/// Maximum number of digits in a phone number (E.164 limit).
const MAX_PHONE_DIGITS: usize = 15;

/// Validates that a string contains at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a loosely formatted phone number.
///
/// Accepts digits, spaces, `+`, `-`, `.` and parentheses, with 6 to 15 digits.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '.' | '(' | ')'));
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();

    if allowed && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must contain 6 to 15 digits".into());
        Err(err)
    }
}
