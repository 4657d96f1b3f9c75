//! Coordinate pair grammar.
//!
//! Accepted notations (hemisphere letters are case-insensitive):
//! - Decimal degrees: `48.85, 2.35`, `-33.9 151.2`
//! - Decimal degrees with marks: `48.85° N, 2.35° E`
//! - Degrees and minutes: `55° 45.35' N, 37° 37.06' E`
//! - Degrees, minutes and seconds: `55° 45' 21" N, 37° 37' 4" E`
//!
//! The two halves are separated by a comma or by whitespace. A half may
//! carry either a sign or a hemisphere letter, never both.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::LatLng;

/// Builds the pattern for one half of the pair. Group names are prefixed
/// so the latitude and longitude halves can share the same shape.
fn component(prefix: &str, hemispheres: &str) -> String {
    format!(
        r#"(?P<{prefix}_sign>[+-])?(?P<{prefix}_deg>[0-9]+(?:\.[0-9]+)?)(?:\s*°(?:\s*(?P<{prefix}_min>[0-9]+(?:\.[0-9]+)?)\s*['′](?:\s*(?P<{prefix}_sec>[0-9]+(?:\.[0-9]+)?)\s*(?:"|″|''))?)?)?(?:\s*(?P<{prefix}_hem>[{hemispheres}]))?"#
    )
}

static COORDINATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?i)^\s*{lat}\s*(?:,\s*|\s+){lon}\s*$",
        lat = component("lat", "NS"),
        lon = component("lon", "EW"),
    );
    Regex::new(&pattern).expect("valid regex")
});

/// Returns `true` if `token` is a syntactically valid coordinate pair
/// within the latitude/longitude ranges.
#[must_use]
pub fn is_coordinate(token: &str) -> bool {
    parse_coordinate(token).is_some()
}

/// Parses `token` into decimal degrees.
///
/// Returns `None` for empty, malformed or out-of-range input.
#[must_use]
pub fn parse_coordinate(token: &str) -> Option<LatLng> {
    let caps = COORDINATE_RE.captures(token)?;

    let latitude = decimal_degrees(&caps, "lat", 90.0)?;
    let longitude = decimal_degrees(&caps, "lon", 180.0)?;

    Some(LatLng {
        latitude,
        longitude,
    })
}

/// Folds the captured degree/minute/second groups of one half into a
/// signed decimal value, enforcing `|value| <= max`.
fn decimal_degrees(caps: &Captures<'_>, prefix: &str, max: f64) -> Option<f64> {
    let group = |name: &str| caps.name(&format!("{prefix}_{name}"));
    let number = |name: &str| -> Option<Option<f64>> {
        group(name).map_or(Some(None), |m| m.as_str().parse::<f64>().ok().map(Some))
    };

    let degrees = number("deg")??;
    let minutes = number("min")?;
    let seconds = number("sec")?;

    if minutes.is_some_and(|m| m >= 60.0) || seconds.is_some_and(|s| s >= 60.0) {
        return None;
    }

    let sign = group("sign").map(|m| m.as_str());
    let hemisphere = group("hem").map(|m| m.as_str().to_ascii_uppercase());

    let negative = match (sign, hemisphere.as_deref()) {
        (Some(_), Some(_)) => return None,
        (Some("-"), None) | (None, Some("S" | "W")) => true,
        _ => false,
    };

    let magnitude = degrees + minutes.unwrap_or(0.0) / 60.0 + seconds.unwrap_or(0.0) / 3600.0;
    if magnitude > max {
        return None;
    }

    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: LatLng, latitude: f64, longitude: f64) {
        assert!(
            (actual.latitude - latitude).abs() < 1e-6,
            "latitude {} != {latitude}",
            actual.latitude
        );
        assert!(
            (actual.longitude - longitude).abs() < 1e-6,
            "longitude {} != {longitude}",
            actual.longitude
        );
    }

    #[test]
    fn accepts_decimal_pairs() {
        assert!(is_coordinate("48.85,2.35"));
        assert!(is_coordinate("48.85, 2.35"));
        assert!(is_coordinate("  -33.9 151.2 "));
        assert!(is_coordinate("10,20"));
        assert!(is_coordinate("+10 , -20"));
    }

    #[test]
    fn parses_decimal_pair() {
        assert_close(parse_coordinate("-33.9, 151.2").unwrap(), -33.9, 151.2);
    }

    #[test]
    fn parses_hemisphere_letters() {
        assert_close(
            parse_coordinate("48.85° N, 2.35° W").unwrap(),
            48.85,
            -2.35,
        );
        assert_close(parse_coordinate("33.9 s, 151.2 e").unwrap(), -33.9, 151.2);
    }

    #[test]
    fn parses_degrees_minutes() {
        assert_close(
            parse_coordinate("55° 30' N, 37° 45' E").unwrap(),
            55.5,
            37.75,
        );
    }

    #[test]
    fn parses_degrees_minutes_seconds() {
        assert_close(
            parse_coordinate(r#"55° 45' 36" N, 37° 37' 12" W"#).unwrap(),
            55.76,
            -37.62,
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(!is_coordinate("abc"));
        assert!(!is_coordinate(""));
        assert!(!is_coordinate("   "));
        assert!(!is_coordinate("48.85"));
        assert!(!is_coordinate("1020"));
        assert!(!is_coordinate("Paris, France"));
        assert!(!is_coordinate("48.85,2.35,7"));
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(!is_coordinate("91,200"));
        assert!(!is_coordinate("999,999"));
        assert!(!is_coordinate("45,181"));
        assert!(is_coordinate("90,180"));
        assert!(is_coordinate("-90,-180"));
    }

    #[test]
    fn rejects_sixty_minutes_or_seconds() {
        assert!(!is_coordinate("55° 60' N, 37° 0' E"));
        assert!(!is_coordinate(r#"55° 10' 60" N, 37° 0' E"#));
    }

    #[test]
    fn rejects_sign_combined_with_hemisphere() {
        assert!(!is_coordinate("-48.85 N, 2.35 E"));
    }

    #[test]
    fn rejects_swapped_hemispheres() {
        assert!(!is_coordinate("48.85 E, 2.35 N"));
    }
}
