//! Compile-time registry of map service definitions.
//!
//! Each map service is defined in a TOML file under `services/`. Adding a
//! service means creating the TOML file, adding it to the list below and
//! registering a renderer for it.

use wikimap_geocoder::registry::GeocoderRegistry;
use wikimap_request_models::{EntryPoint, MapService};

use crate::ConfigError;
use crate::config::MapsConfig;

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("googlemaps", include_str!("../services/googlemaps.toml")),
    ("yahoomaps", include_str!("../services/yahoomaps.toml")),
    ("openlayers", include_str!("../services/openlayers.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 3;

/// Returns all embedded map service definitions.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by tests.
#[must_use]
pub fn all_services() -> Vec<MapService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse map service '{name}': {e}"))
        })
        .collect()
}

/// Known map services plus the fallback used for unknown names.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    services: Vec<MapService>,
    default_service: String,
}

impl ServiceRegistry {
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDefaultService`] if `default_service`
    /// is not one of `services`.
    pub fn new(services: Vec<MapService>, default_service: &str) -> Result<Self, ConfigError> {
        let default_service = services
            .iter()
            .find(|s| s.answers_to(default_service))
            .map(|s| s.id.clone())
            .ok_or_else(|| ConfigError::UnknownDefaultService {
                service: default_service.to_string(),
            })?;

        Ok(Self {
            services,
            default_service,
        })
    }

    /// Builds the registry from the embedded definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDefaultService`] if the configured
    /// default service is not defined.
    pub fn from_config(config: &MapsConfig) -> Result<Self, ConfigError> {
        Self::new(all_services(), &config.default_service)
    }

    #[must_use]
    pub fn services(&self) -> &[MapService] {
        &self.services
    }

    #[must_use]
    pub fn default_service(&self) -> &str {
        &self.default_service
    }

    /// Finds a service by id or alias.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&MapService> {
        self.services.iter().find(|s| s.answers_to(name))
    }

    /// Resolves `name` to the id of a service that supports
    /// `entry_point`, falling back to the default service when the name
    /// is empty, unknown or unsupported.
    #[must_use]
    pub fn valid_service(&self, name: &str, entry_point: EntryPoint) -> &str {
        match self.find(name) {
            Some(service) if service.supports(entry_point) => &service.id,
            Some(service) => {
                log::debug!(
                    "Service '{}' does not support {entry_point}, using '{}'",
                    service.id,
                    self.default_service
                );
                &self.default_service
            }
            None => {
                if !name.trim().is_empty() {
                    log::debug!(
                        "Unknown service '{name}', using '{}'",
                        self.default_service
                    );
                }
                &self.default_service
            }
        }
    }

    /// Tells `geocoders` which geoservice each map service prefers.
    pub fn apply_geoservice_preferences(&self, geocoders: &mut GeocoderRegistry) {
        for service in &self.services {
            if let Some(geoservice) = &service.geoservice {
                geocoders.prefer_for_map_service(&service.id, geoservice);
            }
        }
    }
}
