//! Compile-time registry of geoservice configurations.
//!
//! Each geocoding backend is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`] and [`enabled_services`].

use serde::Deserialize;

/// A geoservice configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`, `"pelias"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Alternative names accepted for the `geoservice` parameter.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Whether this service can be selected by map requests.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Self-hosted Pelias geocoder.
    Pelias {
        /// API base URL (e.g., `"http://localhost:4000"`).
        base_url: String,
        /// ISO country code for boundary filtering.
        country_code: Option<String>,
    },
    /// Nominatim / `OpenStreetMap` geocoder.
    Nominatim {
        /// API base URL (e.g., `"https://nominatim.openstreetmap.org/search"`).
        base_url: String,
        /// Minimum delay between requests in milliseconds.
        rate_limit_ms: u64,
        /// Comma-separated ISO country codes to restrict results to.
        country_codes: Option<String>,
    },
}

const fn default_true() -> bool {
    true
}

impl GeocodingService {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Pelias { base_url, .. }
            | ProviderConfig::Nominatim { base_url, .. } => base_url,
        }
    }

    /// Returns `true` if `name` is this service's id or one of its
    /// aliases, compared case-insensitively.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        self.id.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("pelias", include_str!("../services/pelias.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Returns all geoservice configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geoservice '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services.
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    all_services().into_iter().filter(|s| s.enabled).collect()
}
