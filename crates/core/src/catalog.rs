//! Catalog field validation (authors, categories, books, stock languages).

use crate::error::CoreError;
use crate::types::Date;

/// Maximum length of an author's full name.
pub const MAX_AUTHOR_NAME_LENGTH: usize = 120;

/// Maximum length of a category name.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 80;

/// Maximum length of a book title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a publisher name.
pub const MAX_PUBLISHER_LENGTH: usize = 120;

/// Earliest accepted publication year.
pub const MIN_PUBLICATION_YEAR: i32 = 1450;

/// Default stock language when none is supplied.
pub const DEFAULT_LANGUAGE: &str = "fr";

/// Validate a required, bounded, non-blank text field and return it trimmed.
pub fn validate_name(field: &str, value: &str, max_len: usize) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Normalize and validate an ISBN-10 or ISBN-13.
///
/// Hyphens and spaces are stripped. ISBN-10 may end with `X`. Checksums are
/// not verified; libraries routinely hold mis-printed ISBNs.
pub fn normalize_isbn(isbn: &str) -> Result<String, CoreError> {
    let cleaned: String = isbn
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let valid = match cleaned.len() {
        13 => cleaned.chars().all(|c| c.is_ascii_digit()),
        10 => {
            let (body, last) = cleaned.split_at(9);
            body.chars().all(|c| c.is_ascii_digit())
                && last.chars().all(|c| c.is_ascii_digit() || c == 'X')
        }
        _ => false,
    };

    if valid {
        Ok(cleaned)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid ISBN '{isbn}'. Expected 10 or 13 digits"
        )))
    }
}

/// Validate an ISO 639-1 language code (two lowercase ASCII letters).
pub fn validate_language(code: &str) -> Result<(), CoreError> {
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_lowercase()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid language code '{code}'. Expected a two-letter ISO 639-1 code"
        )))
    }
}

/// Validate a publication year against `current_year`.
pub fn validate_publication_year(year: i32, current_year: i32) -> Result<(), CoreError> {
    if year < MIN_PUBLICATION_YEAR || year > current_year {
        return Err(CoreError::Validation(format!(
            "Publication year must be between {MIN_PUBLICATION_YEAR} and {current_year}"
        )));
    }
    Ok(())
}

/// An author cannot die before being born.
pub fn validate_life_dates(birth: Option<Date>, death: Option<Date>) -> Result<(), CoreError> {
    if let (Some(b), Some(d)) = (birth, death) {
        if d < b {
            return Err(CoreError::Validation(
                "Death date must not precede birth date".to_string(),
            ));
        }
    }
    Ok(())
}
