#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for map requests.
//!
//! Turns free-text locations (e.g. `"Eiffel Tower, Paris"`) into
//! coordinate pairs. Backends are selected per request by a
//! *geoservice* identifier and configured via TOML files in `services/`:
//!
//! 1. **Nominatim / OpenStreetMap**: free, 1 req/sec rate limit.
//! 2. **Pelias**: self-hosted, no rate limit. Disabled unless a running
//!    instance is configured.
//!
//! The [`registry::GeocoderRegistry`] resolves a geoservice name (or
//! alias, or the map service's preferred backend) to a [`Geocoder`] and
//! implements [`LocationResolver`], the single call the request pipeline
//! makes per location.

pub mod nominatim;
pub mod pelias;
pub mod registry;
pub mod service_registry;

use thiserror::Error;
use wikimap_coords::LatLng;

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
    /// Which provider resolved this address.
    pub provider: GeocodingProvider,
    /// Whether this was an exact or approximate match.
    pub match_quality: MatchQuality,
}

impl GeocodedAddress {
    /// The resolved position as a coordinate pair.
    #[must_use]
    pub const fn lat_lng(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Which geocoding provider resolved an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodingProvider {
    /// Self-hosted Pelias geocoder.
    Pelias,
    /// Nominatim / OpenStreetMap.
    Nominatim,
    /// A caller-supplied backend registered at runtime.
    Custom,
}

/// Quality of the geocoding match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchQuality {
    /// Exact address match.
    Exact,
    /// Approximate / non-exact match.
    Approximate,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// A geocoding backend.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves a free-form location query.
    ///
    /// Returns `Ok(None)` when the backend answered but found no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;
}

/// Resolves one location of a map request to a coordinate string.
///
/// Failures of any kind (unknown geoservice, provider error, no match)
/// collapse into `None`; callers only learn that the location could not
/// be resolved.
#[async_trait::async_trait]
pub trait LocationResolver: Send + Sync {
    /// Attempts to turn `location` into a `lat,lon` string.
    ///
    /// `geoservice` selects the backend (empty means "provider default"),
    /// `map_service` is the map service the result will be displayed with,
    /// and `is_default_param` is set when the location came from the
    /// unnamed positional parameter, which may already hold coordinates.
    async fn attempt_to_geocode(
        &self,
        location: &str,
        geoservice: &str,
        map_service: &str,
        is_default_param: bool,
    ) -> Option<String>;
}
