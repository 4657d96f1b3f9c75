#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate handling for map requests.
//!
//! Map requests carry their locations as `;`-delimited lists of
//! coordinate tokens such as `48.85, 2.35` or `55° 45' 21" N, 37° 37' 4" E`.
//! This crate decides whether a single token is a coordinate pair
//! ([`is_coordinate`] / [`parse_coordinate`]) and strips invalid tokens
//! from a list ([`filter_invalid_coords`]) while reporting what was
//! removed.

pub mod filter;
pub mod grammar;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use filter::{FilteredCoordinates, filter_invalid_coords};
pub use grammar::{is_coordinate, parse_coordinate};

/// Separator between the items of a coordinate or address list.
pub const LIST_DELIMITER: &str = ";";

/// Separator between a location and its trailing alias parts
/// (e.g. `48.85,2.35~Paris~Capital of France`).
pub const ALIAS_SEPARATOR: &str = "~";

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude, `-90.0..=90.0`.
    pub latitude: f64,
    /// Longitude, `-180.0..=180.0`.
    pub longitude: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Renders the pair as `lat,lon`, the form every map service accepts.
impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Returns the location part of a list item, i.e. everything before the
/// first [`ALIAS_SEPARATOR`].
#[must_use]
pub fn location_part(item: &str) -> &str {
    item.split_once(ALIAS_SEPARATOR)
        .map_or(item, |(location, _)| location)
}
