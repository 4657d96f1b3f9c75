#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types shared by the map request pipeline.
//!
//! A markup host hands the pipeline an ordered list of raw parameter
//! strings ([`RawParam`]). The pipeline normalizes them into a
//! [`ParameterMap`], wraps it in a [`MapRequest`] for a rendering
//! provider and returns a [`RenderedOutput`] to the host.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Reserved key under which the unnamed positional parameter is stored.
pub const COORDINATES_KEY: &str = "coordinates";

/// Key holding the resolved map service.
pub const SERVICE_KEY: &str = "service";

/// Key selecting the geocoding backend.
pub const GEOSERVICE_KEY: &str = "geoservice";

/// Parameter names whose values are address lists.
pub const ADDRESS_KEYS: &[&str] = &["address", "addresses"];

/// One raw parameter as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawParam {
    /// `name=value`. Both sides are kept verbatim; the value keeps any
    /// further `=` characters.
    Named {
        /// Text before the first `=`.
        name: String,
        /// Text after the first `=`.
        value: String,
    },
    /// A bare value without `=`.
    Positional(String),
}

impl RawParam {
    /// Tokenizes one raw parameter string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split_once('=').map_or_else(
            || Self::Positional(raw.to_string()),
            |(name, value)| Self::Named {
                name: name.to_string(),
                value: value.to_string(),
            },
        )
    }

    /// Tokenizes every raw parameter string, preserving order.
    #[must_use]
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Vec<Self> {
        raw.iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    /// The trimmed, lower-cased parameter name, or `None` for positional
    /// parameters.
    #[must_use]
    pub fn name_key(&self) -> Option<String> {
        match self {
            Self::Named { name, .. } => Some(name.trim().to_lowercase()),
            Self::Positional(_) => None,
        }
    }
}

/// Splits a host invocation such as `48.85,2.35|service=layers|zoom=4`
/// into raw parameter strings.
#[must_use]
pub fn split_invocation(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('|').map(ToString::to_string).collect()
}

/// Renders the parameter back into its raw `name=value` form.
impl fmt::Display for RawParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, value } => write!(f, "{name}={value}"),
            Self::Positional(text) => f.write_str(text),
        }
    }
}

/// Normalized parameters keyed by lower-cased name.
///
/// Neither keys nor values are ever empty; later inserts overwrite
/// earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterMap(BTreeMap<String, String>);

impl ParameterMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `name`, returning `false` (and storing
    /// nothing) if either is empty.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        if name.is_empty() || value.is_empty() {
            return false;
        }
        self.0.insert(name, value);
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The markup macro that triggered a request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntryPoint {
    /// `{{#display_map:...}}`
    DisplayMap,
    /// `{{#display_point:...}}`
    DisplayPoint,
    /// `{{#display_points:...}}`
    DisplayPoints,
    /// `{{#display_address:...}}`
    DisplayAddress,
    /// `{{#display_addresses:...}}`
    DisplayAddresses,
}

impl EntryPoint {
    pub const ALL: &[Self] = &[
        Self::DisplayMap,
        Self::DisplayPoint,
        Self::DisplayPoints,
        Self::DisplayAddress,
        Self::DisplayAddresses,
    ];
}

/// A map service definition, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapService {
    /// Unique identifier (e.g., `"googlemaps"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Alternative names accepted for the `service` parameter.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Macros this service can render.
    pub entry_points: Vec<EntryPoint>,
    /// Geoservice used for requests that don't name one.
    pub geoservice: Option<String>,
}

impl MapService {
    /// Returns `true` if `name` is this service's id or one of its
    /// aliases, compared case-insensitively.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        self.id.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn supports(&self, entry_point: EntryPoint) -> bool {
        self.entry_points.contains(&entry_point)
    }
}

/// A normalized request handed to a rendering provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRequest {
    /// Macro that triggered the request.
    pub entry_point: EntryPoint,
    /// Resolved map service id; also stored in `parameters`.
    pub service: String,
    /// All normalized parameters, including `coordinates` and `service`.
    pub parameters: ParameterMap,
}

/// Terminal state of a request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// A provider rendered the map, possibly with failure annotations.
    Rendered,
    /// Nothing could be displayed; annotations explain why.
    FailedWithDiagnostics,
    /// No coordinates were supplied at all.
    FailedEmpty,
}

/// What the host receives back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedOutput {
    /// Final markup.
    pub text: String,
    /// The host must not run markup parsing on `text` again.
    pub no_parse: bool,
    /// `text` is raw HTML.
    pub is_html: bool,
    /// Which terminal state produced `text`.
    pub outcome: Outcome,
}

impl RenderedOutput {
    /// Wraps `text` as pre-rendered HTML.
    #[must_use]
    pub const fn html(text: String, outcome: Outcome) -> Self {
        Self {
            text,
            no_parse: true,
            is_html: true,
            outcome,
        }
    }
}
