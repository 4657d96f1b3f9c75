//! Pelias geocoder client.
//!
//! Queries the `/v1/search` endpoint of a Pelias instance (self-hosted or
//! a hosted provider such as geocode.earth) and reads the first feature of
//! the returned `GeoJSON` `FeatureCollection`.
//!
//! Instances behind Cloudflare Zero Trust Access need
//! `CF_ACCESS_CLIENT_ID` and `CF_ACCESS_CLIENT_SECRET` in the environment.
//!
//! See <https://github.com/pelias/documentation/blob/master/search.md>

use serde::Deserialize;

use crate::{GeocodeError, GeocodedAddress, Geocoder, GeocodingProvider, MatchQuality};

/// Confidence at or above which a Pelias hit counts as exact.
const EXACT_CONFIDENCE: f64 = 0.9;

/// Cloudflare Access service token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfAccessCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Reads Cloudflare Access credentials from the environment.
///
/// Returns `Some` only when both variables are set and non-empty.
#[must_use]
pub fn cf_access_credentials_from_env() -> Option<CfAccessCredentials> {
    let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    Some(CfAccessCredentials {
        client_id: read("CF_ACCESS_CLIENT_ID")?,
        client_secret: read("CF_ACCESS_CLIENT_SECRET")?,
    })
}

/// A Pelias search client.
pub struct PeliasGeocoder {
    client: reqwest::Client,
    base_url: String,
    country_code: Option<String>,
    cf_access: Option<CfAccessCredentials>,
}

impl PeliasGeocoder {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        country_code: Option<String>,
        cf_access: Option<CfAccessCredentials>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            country_code,
            cf_access,
        }
    }

    fn search_request(&self, query: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(format!("{}/v1/search", self.base_url))
            .query(&[("text", query), ("size", "1")]);

        if let Some(country) = &self.country_code {
            request = request.query(&[("boundary.country", country)]);
        }

        match &self.cf_access {
            Some(creds) => request
                .header("CF-Access-Client-Id", &creds.client_id)
                .header("CF-Access-Client-Secret", &creds.client_secret),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl Geocoder for PeliasGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        let response = self.search_request(query).send().await?;

        match response.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(GeocodeError::RateLimited),
            status if !status.is_success() => {
                return Err(GeocodeError::Parse {
                    message: format!("Pelias returned status {status}"),
                });
            }
            _ => {}
        }

        let body: serde_json::Value = response.json().await?;
        log::debug!("Pelias answered {query:?}");
        parse_response(body)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[longitude, latitude]`
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    label: Option<String>,
    confidence: Option<f64>,
}

impl Feature {
    fn into_address(self) -> Result<GeocodedAddress, GeocodeError> {
        let [longitude, latitude, ..] = self.geometry.coordinates[..] else {
            return Err(GeocodeError::Parse {
                message: "Pelias feature has fewer than 2 coordinates".to_string(),
            });
        };

        let match_quality = match self.properties.confidence {
            Some(confidence) if confidence >= EXACT_CONFIDENCE => MatchQuality::Exact,
            _ => MatchQuality::Approximate,
        };

        Ok(GeocodedAddress {
            latitude,
            longitude,
            matched_address: self.properties.label,
            provider: GeocodingProvider::Pelias,
            match_quality,
        })
    }
}

/// Reads the best hit out of a search response.
fn parse_response(body: serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let collection: FeatureCollection =
        serde_json::from_value(body).map_err(|e| GeocodeError::Parse {
            message: format!("Unexpected Pelias response: {e}"),
        })?;

    collection
        .features
        .into_iter()
        .next()
        .map(Feature::into_address)
        .transpose()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn feature(coordinates: &serde_json::Value, confidence: f64) -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": coordinates },
                "properties": { "label": "Berlin, Germany", "confidence": confidence }
            }]
        })
    }

    #[test]
    fn reads_first_feature() {
        let hit = parse_response(feature(&json!([13.405, 52.52]), 0.97))
            .unwrap()
            .unwrap();

        assert!((hit.latitude - 52.52).abs() < 1e-9);
        assert!((hit.longitude - 13.405).abs() < 1e-9);
        assert_eq!(hit.matched_address.as_deref(), Some("Berlin, Germany"));
        assert_eq!(hit.provider, GeocodingProvider::Pelias);
        assert_eq!(hit.match_quality, MatchQuality::Exact);
    }

    #[test]
    fn low_confidence_is_approximate() {
        let hit = parse_response(feature(&json!([13.405, 52.52]), 0.4))
            .unwrap()
            .unwrap();
        assert_eq!(hit.match_quality, MatchQuality::Approximate);
    }

    #[test]
    fn missing_properties_are_tolerated() {
        let body = json!({ "features": [{ "geometry": { "coordinates": [1.0, 2.0] } }] });
        let hit = parse_response(body).unwrap().unwrap();
        assert_eq!(hit.matched_address, None);
        assert_eq!(hit.match_quality, MatchQuality::Approximate);
    }

    #[test]
    fn no_features_is_no_match() {
        assert!(parse_response(json!({ "features": [] })).unwrap().is_none());
    }

    #[test]
    fn malformed_responses_are_errors() {
        assert!(parse_response(feature(&json!([13.405]), 0.9)).is_err());
        assert!(parse_response(json!({ "error": "bad request" })).is_err());
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let geocoder = PeliasGeocoder::new(
            reqwest::Client::new(),
            "http://localhost:4000/",
            Some("FRA".to_string()),
            Some(CfAccessCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            }),
        );
        let request = geocoder.search_request("Paris").build().unwrap();

        assert_eq!(request.url().path(), "/v1/search");
        assert_eq!(
            request.url().query(),
            Some("text=Paris&size=1&boundary.country=FRA")
        );
        assert_eq!(request.headers()["CF-Access-Client-Id"], "id");
    }
}
