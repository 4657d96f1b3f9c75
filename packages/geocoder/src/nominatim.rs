//! Nominatim / OpenStreetMap geocoder client.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum on
//! the public instance. [`NominatimGeocoder`] spaces its own requests
//! according to `rate_limit_ms` from the service TOML configuration.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{GeocodeError, GeocodedAddress, Geocoder, GeocodingProvider, MatchQuality};

/// A rate-limited Nominatim free-form search client.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    country_codes: Option<String>,
    rate_limit: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        country_codes: Option<String>,
        rate_limit: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            country_codes,
            rate_limit,
            last_request: Mutex::new(None),
        }
    }

    /// Sleeps until at least `rate_limit` has passed since the previous
    /// request, then records the new request time.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.rate_limit {
                tokio::time::sleep(self.rate_limit - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait::async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        self.throttle().await;
        geocode_freeform(
            &self.client,
            &self.base_url,
            self.country_codes.as_deref(),
            query,
        )
        .await
    }
}

/// Runs one free-form search. Callers are expected to respect the
/// instance's rate limit; [`NominatimGeocoder`] does so itself.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    country_codes: Option<&str>,
    query: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let mut request = client
        .get(base_url)
        .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")]);
    if let Some(codes) = country_codes {
        request = request.query(&[("countrycodes", codes)]);
    }

    let response = request.send().await?;
    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        log::warn!("Nominatim rate limit hit while geocoding {query:?}");
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = response.json().await?;
    parse_response(body)
}

/// Place rank of individual buildings and house numbers.
const HOUSE_PLACE_RANK: u8 = 30;

/// One `jsonv2` search hit. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: Option<String>,
    #[serde(default)]
    place_rank: u8,
}

impl SearchHit {
    fn into_address(self) -> Result<GeocodedAddress, GeocodeError> {
        let number = |field: &str, text: &str| {
            text.trim().parse::<f64>().map_err(|_| GeocodeError::Parse {
                message: format!("Nominatim {field} is not a number: {text:?}"),
            })
        };

        Ok(GeocodedAddress {
            latitude: number("lat", &self.lat)?,
            longitude: number("lon", &self.lon)?,
            matched_address: self.display_name,
            provider: GeocodingProvider::Nominatim,
            match_quality: if self.place_rank >= HOUSE_PLACE_RANK {
                MatchQuality::Exact
            } else {
                MatchQuality::Approximate
            },
        })
    }
}

fn parse_response(body: serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let hits: Vec<SearchHit> = serde_json::from_value(body).map_err(|e| GeocodeError::Parse {
        message: format!("Unexpected Nominatim response: {e}"),
    })?;

    hits.into_iter().next().map(SearchHit::into_address).transpose()
}
