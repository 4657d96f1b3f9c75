//! Process-wide settings for map requests.
//!
//! Built once at startup and passed by reference into every stage of the
//! pipeline. The embedded `config/default.toml` is used unless a file is
//! supplied; `WIKIMAP_DEFAULT_SERVICE` and `WIKIMAP_DEFAULT_GEOSERVICE`
//! override the corresponding values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use wikimap_request_models::{ParameterMap, RawParam};

use crate::ConfigError;

const DEFAULT_SERVICE_ENV: &str = "WIKIMAP_DEFAULT_SERVICE";
const DEFAULT_GEOSERVICE_ENV: &str = "WIKIMAP_DEFAULT_GEOSERVICE";

const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Settings shared by all requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapsConfig {
    /// Map service used when a request names none or an invalid one.
    pub default_service: String,
    /// Geoservice used when neither the request nor its map service
    /// selects one.
    pub default_geoservice: String,
    /// Main parameter name -> alternative names.
    #[serde(default)]
    pub param_aliases: BTreeMap<String, Vec<String>>,
}

impl MapsConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text is not a valid
    /// configuration.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (caught by tests).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {e}"))
    }

    /// Loads the configuration from `path` (or the embedded default) and
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::embedded(),
        };

        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    /// Applies `WIKIMAP_DEFAULT_SERVICE` / `WIKIMAP_DEFAULT_GEOSERVICE`
    /// as returned by `lookup`. Blank values are ignored.
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(service) = non_empty(DEFAULT_SERVICE_ENV) {
            log::debug!("Default service overridden by environment: {service}");
            self.default_service = service;
        }
        if let Some(geoservice) = non_empty(DEFAULT_GEOSERVICE_ENV) {
            log::debug!("Default geoservice overridden by environment: {geoservice}");
            self.default_geoservice = geoservice;
        }
        self
    }

    /// Returns `true` if `name` is the main parameter `main` or one of its
    /// aliases. Comparison is case-insensitive and ignores surrounding
    /// whitespace.
    #[must_use]
    pub fn in_param_aliases(&self, name: &str, main: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(main)
            || self
                .param_aliases
                .get(main)
                .is_some_and(|aliases| aliases.iter().any(|a| a.eq_ignore_ascii_case(name)))
    }

    /// Looks up the value of main parameter `main` in `map`, trying the
    /// main name first and then each alias in configured order.
    #[must_use]
    pub fn param_value<'a>(&self, main: &str, map: &'a ParameterMap) -> Option<&'a str> {
        map.get(main).or_else(|| {
            self.param_aliases
                .get(main)?
                .iter()
                .find_map(|alias| map.get(&alias.to_lowercase()))
        })
    }

    /// Same lookup as [`Self::param_value`], but over raw parameters: the
    /// main name wins over its aliases, and for one name the last
    /// non-empty occurrence wins. The returned value is trimmed.
    #[must_use]
    pub fn raw_param_value<'a>(&self, main: &str, params: &'a [RawParam]) -> Option<&'a str> {
        let last_value = |wanted: &str| {
            params.iter().rev().find_map(|param| match param {
                RawParam::Named { value, .. }
                    if param.name_key().as_deref() == Some(wanted) && !value.trim().is_empty() =>
                {
                    Some(value.trim())
                }
                _ => None,
            })
        };

        last_value(main).or_else(|| {
            self.param_aliases
                .get(main)?
                .iter()
                .find_map(|alias| last_value(&alias.to_lowercase()))
        })
    }
}
