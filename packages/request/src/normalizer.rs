//! Turns tokenized parameters into a [`ParameterMap`].
//!
//! Named parameters are stored under their trimmed, lower-cased name.
//! Coordinate lists are gathered under `coordinates` instead: positional
//! parameters (including address lists the resolver already turned into
//! coordinates) and `coordinates`/alias parameters alike are run through
//! the coordinate filter and appended in encounter order.

use wikimap_coords::{LIST_DELIMITER, filter_invalid_coords};
use wikimap_request_models::{COORDINATES_KEY, ParameterMap, RawParam};

use crate::config::MapsConfig;

/// Output of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedParams {
    /// The normalized parameters.
    pub map: ParameterMap,
    /// Coordinate tokens rejected by the filter, in encounter order.
    pub coord_fails: Vec<String>,
}

/// Normalizes `params` left to right.
///
/// Named parameters with an empty name or value are dropped and later
/// duplicates overwrite earlier ones. Coordinate lists never overwrite
/// each other; their surviving tokens are concatenated.
#[must_use]
pub fn normalize(params: &[RawParam], config: &MapsConfig) -> NormalizedParams {
    let mut map = ParameterMap::new();
    let mut coordinates: Vec<String> = Vec::new();
    let mut coord_fails = Vec::new();

    for param in params {
        let list = match param {
            RawParam::Named { value, .. } => {
                let Some(name) = param.name_key() else {
                    continue;
                };
                let value = value.trim();
                if name.is_empty() || value.is_empty() {
                    continue;
                }
                if !config.in_param_aliases(&name, COORDINATES_KEY) {
                    map.insert(name, value);
                    continue;
                }
                value
            }
            RawParam::Positional(text) => text.trim(),
        };

        if list.is_empty() {
            continue;
        }

        let filtered = filter_invalid_coords(list, LIST_DELIMITER);
        coord_fails.extend(filtered.failures);
        if !filtered.cleaned.is_empty() {
            coordinates.push(filtered.cleaned);
        }
    }

    map.insert(COORDINATES_KEY, coordinates.join(LIST_DELIMITER));

    NormalizedParams { map, coord_fails }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(raw: &[&str]) -> NormalizedParams {
        normalize(&RawParam::parse_all(raw), &MapsConfig::embedded())
    }

    #[test]
    fn positional_becomes_coordinates() {
        let result = run(&["48.8,2.3"]);
        assert_eq!(result.map.get(COORDINATES_KEY), Some("48.8,2.3"));
        assert_eq!(result.map.len(), 1);
        assert!(result.coord_fails.is_empty());
    }

    #[test]
    fn drops_empty_names_and_values() {
        let result = run(&["  =x", "foo=", "   "]);
        assert!(result.map.is_empty());
    }

    #[test]
    fn last_duplicate_wins() {
        let result = run(&["service=a", "service=b"]);
        assert_eq!(result.map.get("service"), Some("b"));
    }

    #[test]
    fn lowercases_and_trims() {
        let result = run(&[" Zoom = 4 ", "TITLE=Hello=World"]);
        assert_eq!(result.map.get("zoom"), Some("4"));
        assert_eq!(result.map.get("title"), Some("Hello=World"));
    }

    #[test]
    fn filters_named_coordinates() {
        let result = run(&["coordinates=48.8,2.3;999,999"]);
        assert_eq!(result.map.get(COORDINATES_KEY), Some("48.8,2.3"));
        assert_eq!(result.coord_fails, vec!["999,999"]);
    }

    #[test]
    fn filters_aliased_coordinates() {
        let result = run(&["Coords=abc;10,20"]);
        assert_eq!(result.map.get(COORDINATES_KEY), Some("10,20"));
        assert!(!result.map.contains("coords"));
        assert_eq!(result.coord_fails, vec!["abc"]);
    }

    #[test]
    fn filters_positional_coordinates() {
        let result = run(&["10,20;nowhere"]);
        assert_eq!(result.map.get(COORDINATES_KEY), Some("10,20"));
        assert_eq!(result.coord_fails, vec!["nowhere"]);
    }

    #[test]
    fn all_invalid_coordinates_leave_no_key() {
        let result = run(&["coordinates=abc;def"]);
        assert!(!result.map.contains(COORDINATES_KEY));
        assert_eq!(result.coord_fails, vec!["abc", "def"]);
    }

    #[test]
    fn accumulates_failures_across_parameters() {
        let result = run(&["coordinates=abc;1,2", "coords=def"]);
        assert_eq!(result.coord_fails, vec!["abc", "def"]);
        assert_eq!(result.map.get(COORDINATES_KEY), Some("1,2"));
        assert!(!result.map.contains("coords"));
    }

    #[test]
    fn invalid_first_positional_does_not_hide_later_ones() {
        let result = run(&["abc", "10,20"]);
        assert_eq!(result.map.get(COORDINATES_KEY), Some("10,20"));
        assert_eq!(result.coord_fails, vec!["abc"]);
    }

    #[test]
    fn positional_lists_are_concatenated_in_order() {
        let result = run(&["", "abc", "10,20~Home", "zoom=4", "30,40;50,60"]);
        assert_eq!(
            result.map.get(COORDINATES_KEY),
            Some("10,20~Home;30,40;50,60")
        );
        assert_eq!(result.map.get("zoom"), Some("4"));
        assert_eq!(result.coord_fails, vec!["abc"]);
    }

    #[test]
    fn named_and_positional_coordinates_are_merged() {
        let result = run(&["coordinates=1,2", "3,4", "coords=5,6"]);
        assert_eq!(result.map.get(COORDINATES_KEY), Some("1,2;3,4;5,6"));
        assert_eq!(result.map.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert_eq!(run(&[]), NormalizedParams::default());
    }
}
