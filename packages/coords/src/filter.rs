//! Splits a delimited coordinate list into valid and invalid tokens.

use crate::{grammar::is_coordinate, location_part};

/// Result of [`filter_invalid_coords`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredCoordinates {
    /// Valid tokens rejoined with the original delimiter, in input order.
    pub cleaned: String,
    /// Tokens that are not coordinates, in input order.
    pub failures: Vec<String>,
}

/// Removes every token that is not a coordinate from `list`.
///
/// Only the location part of a token (before the first `~`) is
/// validated; accepted and rejected tokens are both kept verbatim,
/// alias parts included. Blank tokens (e.g. from a trailing `;`) are
/// dropped without being reported.
#[must_use]
pub fn filter_invalid_coords(list: &str, delimiter: &str) -> FilteredCoordinates {
    let mut valid: Vec<&str> = Vec::new();
    let mut failures = Vec::new();

    for token in list.split(delimiter) {
        if token.trim().is_empty() {
            continue;
        }

        if is_coordinate(location_part(token)) {
            valid.push(token);
        } else {
            log::debug!("Rejecting coordinate token {token:?}");
            failures.push(token.to_string());
        }
    }

    FilteredCoordinates {
        cleaned: valid.join(delimiter),
        failures,
    }
}
