//! Request validation against the table's column set.

use crate::error::ProviderError;
use crate::schema;
use crate::sql::ContentValues;
use regex::Regex;

pub struct RequestValidator;

impl RequestValidator {
    /// Every requested name must be a known column, named at most once.
    pub fn check_projection(projection: &[&str]) -> Result<(), ProviderError> {
        if let Some(col) = projection.iter().find(|c| !schema::is_column(c)) {
            return Err(ProviderError::UnknownColumn(format!(
                "{} (unknown column in projection)",
                col
            )));
        }
        for (i, col) in projection.iter().enumerate() {
            if projection[..i].contains(col) {
                return Err(ProviderError::Validation(format!(
                    "{} appears more than once in projection",
                    col
                )));
            }
        }
        Ok(())
    }

    /// Value keys become identifiers in SQL, so they must be known columns.
    /// Mandatory fields are not checked here; the NOT NULL constraints reject them.
    pub fn check_values(values: &ContentValues) -> Result<(), ProviderError> {
        let mut unknown: Vec<&str> = values
            .keys()
            .map(String::as_str)
            .filter(|k| !schema::is_column(k))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        Err(ProviderError::UnknownColumn(unknown.join(", ")))
    }

    pub fn check_update_values(values: &ContentValues) -> Result<(), ProviderError> {
        if values.is_empty() {
            return Err(ProviderError::Validation(
                "update requires at least one column value".into(),
            ));
        }
        Self::check_values(values)
    }

    /// Accepts `col [COLLATE name] [ASC|DESC], ...` over known columns and returns
    /// it with quoted identifiers and upper-case keywords. Blank input means no ordering.
    pub fn normalize_sort_order(sort_order: &str) -> Result<Option<String>, ProviderError> {
        if sort_order.trim().is_empty() {
            return Ok(None);
        }
        let re = Regex::new(
            r"(?i)^\s*([a-z_][a-z0-9_]*)(?:\s+collate\s+([a-z_][a-z0-9_]*))?(?:\s+(asc|desc))?\s*$",
        )
        .map_err(|e| ProviderError::InvalidSortOrder(e.to_string()))?;
        let mut terms = Vec::new();
        for term in sort_order.split(',') {
            let caps = re
                .captures(term)
                .ok_or_else(|| ProviderError::InvalidSortOrder(sort_order.to_string()))?;
            let col = &caps[1];
            if !schema::is_column(col) {
                return Err(ProviderError::InvalidSortOrder(format!(
                    "unknown column {}",
                    col
                )));
            }
            let mut normalized = format!("\"{}\"", col);
            if let Some(collation) = caps.get(2) {
                normalized.push_str(" COLLATE ");
                normalized.push_str(&collation.as_str().to_uppercase());
            }
            if let Some(dir) = caps.get(3) {
                normalized.push(' ');
                normalized.push_str(&dir.as_str().to_uppercase());
            }
            terms.push(normalized);
        }
        Ok(Some(terms.join(", ")))
    }
}
