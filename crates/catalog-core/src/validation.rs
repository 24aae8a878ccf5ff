//! Checks a front end applies to raw user input before calling the store.
//!
//! The store itself accepts any string; these rules keep values safe for the
//! CSV interchange format.

use crate::error::{CatalogError, CatalogResult};

pub fn validate_id(id: &str) -> CatalogResult<()> {
    validate_field("id", id)?;
    if id.contains(';') {
        return Err(CatalogError::InvalidArgument("id must not contain ';'".into()));
    }
    Ok(())
}

/// Non-blank and comma-free.
pub fn validate_field(name: &str, value: &str) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidArgument(format!("{name} must not be blank")));
    }
    if value.contains(',') {
        return Err(CatalogError::InvalidArgument(format!("{name} must not contain ','")));
    }
    Ok(())
}

/// Split a tag list on `;` or `,`, trim each tag and drop blanks. Case is
/// kept as written.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// [`split_tags`], then upper-case each tag.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    split_tags(raw).iter().map(|t| t.to_uppercase()).collect()
}

/// `NNNN_YYYY`: four-digit sequence, underscore, four-digit year.
pub fn is_conventional_id(id: &str) -> bool {
    match id.split_once('_') {
        Some((seq, year)) => is_digits(seq, 4) && is_digits(year, 4),
        None => false,
    }
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}
