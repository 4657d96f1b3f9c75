//! Runtime registry of geocoders keyed by geoservice id.
//!
//! Resolution order for the geoservice of a request:
//!
//! 1. the explicit `geoservice` parameter (id or alias),
//! 2. the geoservice preferred by the request's map service,
//! 3. the configured default geoservice.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use wikimap_coords::is_coordinate;

use crate::nominatim::NominatimGeocoder;
use crate::pelias::{PeliasGeocoder, cf_access_credentials_from_env};
use crate::service_registry::{GeocodingService, ProviderConfig};
use crate::{Geocoder, LocationResolver};

/// Geocoders by geoservice id, plus the alias and preference tables used
/// to pick one for a request.
pub struct GeocoderRegistry {
    geocoders: BTreeMap<String, Arc<dyn Geocoder>>,
    /// lower-cased alias -> geoservice id
    aliases: BTreeMap<String, String>,
    /// lower-cased map service id -> geoservice id
    preferred: BTreeMap<String, String>,
    default_geoservice: String,
}

impl GeocoderRegistry {
    /// Creates an empty registry that falls back to `default_geoservice`.
    #[must_use]
    pub fn new(default_geoservice: impl Into<String>) -> Self {
        Self {
            geocoders: BTreeMap::new(),
            aliases: BTreeMap::new(),
            preferred: BTreeMap::new(),
            default_geoservice: default_geoservice.into().to_lowercase(),
        }
    }

    /// Builds a registry with one HTTP geocoder per service definition.
    #[must_use]
    pub fn from_services(
        client: &reqwest::Client,
        services: &[GeocodingService],
        default_geoservice: &str,
    ) -> Self {
        let mut registry = Self::new(default_geoservice);

        for service in services {
            let geocoder: Arc<dyn Geocoder> = match &service.provider {
                ProviderConfig::Nominatim {
                    base_url,
                    rate_limit_ms,
                    country_codes,
                } => Arc::new(NominatimGeocoder::new(
                    client.clone(),
                    base_url.clone(),
                    country_codes.clone(),
                    Duration::from_millis(*rate_limit_ms),
                )),
                ProviderConfig::Pelias {
                    base_url,
                    country_code,
                } => Arc::new(PeliasGeocoder::new(
                    client.clone(),
                    base_url.clone(),
                    country_code.clone(),
                    cf_access_credentials_from_env(),
                )),
            };

            log::debug!("Registering geoservice '{}' ({})", service.id, service.name);
            registry.register(&service.id, &service.aliases, geocoder);
        }

        registry
    }

    /// Registers `geocoder` under `id` and its `aliases`.
    pub fn register(&mut self, id: &str, aliases: &[String], geocoder: Arc<dyn Geocoder>) {
        let id = id.to_lowercase();
        for alias in aliases {
            self.aliases.insert(alias.to_lowercase(), id.clone());
        }
        self.geocoders.insert(id, geocoder);
    }

    /// Makes `geoservice` the default for requests displayed with
    /// `map_service` that don't name a geoservice themselves.
    pub fn prefer_for_map_service(&mut self, map_service: &str, geoservice: &str) {
        self.preferred
            .insert(map_service.to_lowercase(), geoservice.to_lowercase());
    }

    /// Returns the registered geoservice ids.
    pub fn geoservice_ids(&self) -> impl Iterator<Item = &str> {
        self.geocoders.keys().map(String::as_str)
    }

    /// Resolves the geoservice id a request should use, or `None` if the
    /// resolved name is not registered.
    #[must_use]
    pub fn resolve_geoservice(&self, geoservice: &str, map_service: &str) -> Option<&str> {
        let requested = geoservice.trim().to_lowercase();

        let name = if requested.is_empty() {
            self.preferred
                .get(&map_service.trim().to_lowercase())
                .map_or(self.default_geoservice.as_str(), String::as_str)
        } else {
            self.aliases
                .get(&requested)
                .map_or(requested.as_str(), String::as_str)
        };

        self.geocoders.get_key_value(name).map(|(id, _)| id.as_str())
    }
}

#[async_trait::async_trait]
impl LocationResolver for GeocoderRegistry {
    async fn attempt_to_geocode(
        &self,
        location: &str,
        geoservice: &str,
        map_service: &str,
        is_default_param: bool,
    ) -> Option<String> {
        if is_default_param && is_coordinate(location) {
            return Some(location.to_string());
        }

        let Some(id) = self.resolve_geoservice(geoservice, map_service) else {
            log::warn!(
                "No geocoder registered for geoservice '{geoservice}' (map service '{map_service}')"
            );
            return None;
        };

        match self.geocoders[id].geocode(location).await {
            Ok(Some(hit)) => {
                log::debug!(
                    "Geocoded {location:?} via {id}: {} ({:?})",
                    hit.lat_lng(),
                    hit.matched_address
                );
                Some(hit.lat_lng().to_string())
            }
            Ok(None) => {
                log::debug!("No {id} match for {location:?}");
                None
            }
            Err(e) => {
                log::warn!("Geocoding {location:?} via {id} failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{GeocodeError, GeocodedAddress, GeocodingProvider, MatchQuality};

    /// Answers every query with a fixed position and counts the calls.
    struct FixedGeocoder {
        latitude: f64,
        longitude: f64,
        calls: AtomicUsize,
    }

    impl FixedGeocoder {
        fn new(latitude: f64, longitude: f64) -> Arc<Self> {
            Arc::new(Self {
                latitude,
                longitude,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(GeocodedAddress {
                latitude: self.latitude,
                longitude: self.longitude,
                matched_address: None,
                provider: GeocodingProvider::Custom,
                match_quality: MatchQuality::Exact,
            }))
        }
    }

    struct FailingGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for FailingGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
            Err(GeocodeError::RateLimited)
        }
    }

    fn registry() -> (GeocoderRegistry, Arc<FixedGeocoder>, Arc<FixedGeocoder>) {
        let first = FixedGeocoder::new(1.0, 2.0);
        let second = FixedGeocoder::new(3.0, 4.0);
        let mut registry = GeocoderRegistry::new("first");
        registry.register("first", &["one".to_string()], first.clone());
        registry.register("second", &[], second.clone());
        (registry, first, second)
    }

    #[test]
    fn resolves_explicit_alias_and_default() {
        let (mut registry, _, _) = registry();
        registry.prefer_for_map_service("openlayers", "second");

        assert_eq!(registry.resolve_geoservice("Second", ""), Some("second"));
        assert_eq!(registry.resolve_geoservice(" ONE ", ""), Some("first"));
        assert_eq!(registry.resolve_geoservice("", "googlemaps"), Some("first"));
        assert_eq!(registry.resolve_geoservice("", "OpenLayers"), Some("second"));
        assert_eq!(registry.resolve_geoservice("nope", ""), None);
    }

    #[tokio::test]
    async fn geocodes_with_resolved_service() {
        let (registry, first, second) = registry();

        let coords = registry
            .attempt_to_geocode("Paris", "second", "googlemaps", false)
            .await;

        assert_eq!(coords.as_deref(), Some("3,4"));
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn default_param_coordinates_skip_lookup() {
        let (registry, first, _) = registry();

        let coords = registry
            .attempt_to_geocode("48.85, 2.35", "", "", true)
            .await;

        assert_eq!(coords.as_deref(), Some("48.85, 2.35"));
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn named_address_coordinates_are_geocoded() {
        let (registry, first, _) = registry();

        let coords = registry.attempt_to_geocode("48.85, 2.35", "", "", false).await;

        assert_eq!(coords.as_deref(), Some("1,2"));
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_geoservice_fails() {
        let (registry, _, _) = registry();
        assert!(
            registry
                .attempt_to_geocode("Paris", "google", "", false)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn provider_errors_fail_quietly() {
        let mut registry = GeocoderRegistry::new("broken");
        registry.register("broken", &[], Arc::new(FailingGeocoder));
        assert!(
            registry
                .attempt_to_geocode("Paris", "", "", false)
                .await
                .is_none()
        );
    }

    #[test]
    fn builds_from_embedded_services() {
        let services = crate::service_registry::all_services();
        let registry = GeocoderRegistry::from_services(&reqwest::Client::new(), &services, "nominatim");
        let ids: Vec<&str> = registry.geoservice_ids().collect();
        assert_eq!(ids, vec!["nominatim", "pelias"]);
        assert_eq!(registry.resolve_geoservice("osm", ""), Some("nominatim"));
    }
}
