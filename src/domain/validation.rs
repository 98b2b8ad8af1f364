//! Form checks that run before anything is sent to the server.

use thiserror::Error;

pub const MOBILE_DIGITS: usize = 10;
pub const OTP_DIGITS: usize = 6;
pub const AADHAAR_DIGITS: usize = 12;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("mobile number must be {} digits", MOBILE_DIGITS)]
    MobileNumber,
    #[error("OTP must be {} digits", OTP_DIGITS)]
    Otp,
    #[error("Aadhaar number must be {} digits", AADHAAR_DIGITS)]
    Aadhaar,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be a positive number")]
    NotPositive(&'static str),
}

fn exact_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Trims and checks a mobile number, returning the normalised form.
pub fn mobile_number(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if exact_digits(trimmed, MOBILE_DIGITS) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::MobileNumber)
    }
}

pub fn otp(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if exact_digits(trimmed, OTP_DIGITS) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::Otp)
    }
}

/// Aadhaar is optional; blank input means none. Spaces between digit groups are allowed.
pub fn aadhaar(raw: &str) -> Result<Option<String>, ValidationError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Ok(None);
    }
    if exact_digits(&digits, AADHAAR_DIGITS) {
        Ok(Some(digits))
    } else {
        Err(ValidationError::Aadhaar)
    }
}

pub fn required(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn positive_area(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(ValidationError::NotPositive(field)),
    }
}

pub fn positive_price(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::NotPositive(field)),
    }
}
