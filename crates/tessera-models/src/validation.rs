//! Field rules for request DTOs.
//!
//! Used through `#[validate(custom(function = ...))]`; length limits that the
//! `validator` derive can express directly are declared on the fields instead.

use std::borrow::Cow;

use validator::ValidationError;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 100;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Names are 3 to 100 characters of ASCII letters and spaces.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let chars = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(error(
            "name_length",
            "name must be between 3 and 100 characters",
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        return Err(error(
            "name_charset",
            "name must contain only letters or spaces",
        ));
    }
    Ok(())
}

/// User ids travel as decimal strings and must parse to a positive integer.
pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    match user_id.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(()),
        _ => Err(error("user_id", "user_id must be a positive integer")),
    }
}
