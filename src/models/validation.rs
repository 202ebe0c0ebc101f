//! Field checks run by handlers before anything reaches the repository.
//!
//! Each check returns `AppError::Validation` carrying a message that names the field,
//! ready to be shown next to the form input.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_]{2,32}$").expect("valid code regex"));
static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{2,10}$").expect("valid prefix regex"));
static SKU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{1,63}$").expect("valid sku regex"));
static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Trimmed length, counted in characters, must fall in `min..=max`.
pub fn require_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub fn require_optional_length(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// Lower-case words joined by single hyphens (`running-shoes`).
pub fn require_slug(field: &str, value: &str) -> Result<(), AppError> {
    require_length(field, value, 2, 80)?;
    if !SLUG_RE.is_match(value) {
        return Err(AppError::Validation(format!(
            "{field} may only contain lowercase letters, digits and single hyphens"
        )));
    }
    Ok(())
}

pub fn require_email(field: &str, value: &str) -> Result<(), AppError> {
    if value.len() > 254 || !EMAIL_RE.is_match(value) {
        return Err(AppError::Validation(format!("{field} must be a valid email address")));
    }
    Ok(())
}

/// Upper-case machine code such as `CREDIT_CARD`.
pub fn require_code(field: &str, value: &str) -> Result<(), AppError> {
    if !CODE_RE.is_match(value) {
        return Err(AppError::Validation(format!(
            "{field} must be 2-32 uppercase letters, digits or underscores"
        )));
    }
    Ok(())
}

/// Coupon code prefix of a campaign.
pub fn require_prefix(field: &str, value: &str) -> Result<(), AppError> {
    if !PREFIX_RE.is_match(value) {
        return Err(AppError::Validation(format!(
            "{field} must be 2-10 uppercase letters or digits"
        )));
    }
    Ok(())
}

pub fn require_sku(field: &str, value: &str) -> Result<(), AppError> {
    if !SKU_RE.is_match(value) {
        return Err(AppError::Validation(format!(
            "{field} must be 2-64 letters, digits, hyphens or underscores"
        )));
    }
    Ok(())
}

pub fn require_currency(field: &str, value: &str) -> Result<(), AppError> {
    if !CURRENCY_RE.is_match(value) {
        return Err(AppError::Validation(format!(
            "{field} must be a three-letter ISO currency code"
        )));
    }
    Ok(())
}

pub fn require_range<T>(field: &str, value: T, min: T, max: T) -> Result<(), AppError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max}"
        )));
    }
    Ok(())
}

pub fn require_positive(field: &str, value: i64) -> Result<(), AppError> {
    if value <= 0 {
        return Err(AppError::Validation(format!("{field} must be greater than 0")));
    }
    Ok(())
}

pub fn require_url(field: &str, value: Option<&str>) -> Result<(), AppError> {
    match value {
        Some(v) if !(v.starts_with("https://") || v.starts_with("http://")) => Err(
            AppError::Validation(format!("{field} must be an http(s) URL")),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_trimmed_chars() {
        assert!(require_length("name", "  ab  ", 2, 5).is_ok());
        assert!(require_length("name", "a", 2, 5).is_err());
        assert!(require_length("name", "ééééé", 2, 5).is_ok());
    }

    #[test]
    fn slug_rules() {
        assert!(require_slug("slug", "running-shoes").is_ok());
        assert!(require_slug("slug", "Running-Shoes").is_err());
        assert!(require_slug("slug", "double--hyphen").is_err());
        assert!(require_slug("slug", "-leading").is_err());
    }

    #[test]
    fn code_and_prefix_rules() {
        assert!(require_code("code", "CREDIT_CARD").is_ok());
        assert!(require_code("code", "credit_card").is_err());
        assert!(require_prefix("code_prefix", "SUMMER").is_ok());
        assert!(require_prefix("code_prefix", "SUMMER_SALE").is_err());
    }

    #[test]
    fn validation_message_names_field() {
        let err = require_range("rating", 6, 1, 5).unwrap_err();
        assert_eq!(err.to_string(), "rating must be between 1 and 5");
    }
}
