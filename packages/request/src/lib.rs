#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map parser function pipeline.
//!
//! One invocation runs the raw parameters through three stages:
//!
//! 1. [`resolver::change_addresses_to_coords`] geocodes address lists.
//! 2. [`normalizer::normalize`] builds the parameter map and filters
//!    coordinate lists.
//! 3. [`MapsParserFunctions::build_output`] hands the map to a renderer,
//!    or explains why nothing could be rendered.

pub mod config;
pub mod messages;
pub mod normalizer;
pub mod render;
pub mod resolver;
pub mod services;

use std::sync::Arc;

use wikimap_geocoder::LocationResolver;
use wikimap_request_models::{
    COORDINATES_KEY, EntryPoint, MapRequest, Outcome, RawParam, RenderedOutput, SERVICE_KEY,
};

use crate::config::MapsConfig;
use crate::messages::{EnglishMessages, MessageFormatter, MessageKey, escape_html};
use crate::render::RendererRegistry;
use crate::services::ServiceRegistry;

/// Errors loading configuration or service definitions.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Default service '{service}' is not a known map service")]
    UnknownDefaultService { service: String },
}

/// Errors that abort a request instead of producing a notice.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unknown entry point: {name}")]
    UnknownEntryPoint { name: String },

    #[error("No renderer registered for service '{service}' and entry point {entry_point}")]
    UnknownProvider {
        service: String,
        entry_point: EntryPoint,
    },

    #[error("Renderer failed: {message}")]
    Provider { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Entry point for the map parser functions of a markup host.
pub struct MapsParserFunctions {
    config: MapsConfig,
    services: ServiceRegistry,
    renderers: RendererRegistry,
    resolver: Arc<dyn LocationResolver>,
    messages: Box<dyn MessageFormatter>,
}

impl MapsParserFunctions {
    #[must_use]
    pub fn new(
        config: MapsConfig,
        services: ServiceRegistry,
        renderers: RendererRegistry,
        resolver: Arc<dyn LocationResolver>,
    ) -> Self {
        Self {
            config,
            services,
            renderers,
            resolver,
            messages: Box::new(EnglishMessages),
        }
    }

    /// Replaces the built-in English wording.
    #[must_use]
    pub fn with_messages(mut self, messages: Box<dyn MessageFormatter>) -> Self {
        self.messages = messages;
        self
    }

    /// Runs one invocation of the macro named `entry_point`.
    ///
    /// # Errors
    ///
    /// * [`RenderError::UnknownEntryPoint`] if `entry_point` names no macro
    /// * any error from [`Self::build_output_for`]
    pub async fn build_output<S: AsRef<str> + Sync>(
        &self,
        raw_params: &[S],
        entry_point: &str,
    ) -> Result<RenderedOutput, RenderError> {
        let entry_point: EntryPoint =
            entry_point
                .trim()
                .parse()
                .map_err(|_| RenderError::UnknownEntryPoint {
                    name: entry_point.to_string(),
                })?;

        self.build_output_for(raw_params, entry_point).await
    }

    /// Runs one invocation for an already parsed entry point.
    ///
    /// Unusable coordinates and addresses never fail the call; they are
    /// reported in the returned text.
    ///
    /// # Errors
    ///
    /// * [`RenderError::UnknownProvider`] if no renderer is registered for
    ///   the resolved service
    /// * any error returned by the renderer itself
    pub async fn build_output_for<S: AsRef<str> + Sync>(
        &self,
        raw_params: &[S],
        entry_point: EntryPoint,
    ) -> Result<RenderedOutput, RenderError> {
        let params = RawParam::parse_all(raw_params);

        let resolved = resolver::change_addresses_to_coords(
            &params,
            &self.config,
            &self.services,
            entry_point,
            self.resolver.as_ref(),
        )
        .await;
        let geo_fails = resolved.failures;
        let service = resolved.service;

        let normalized = normalizer::normalize(&resolved.params, &self.config);
        let coord_fails = normalized.coord_fails;
        let mut parameters = normalized.map;

        let has_coordinates = self
            .config
            .param_value(COORDINATES_KEY, &parameters)
            .is_some_and(|coords| !coords.trim().is_empty());

        if has_coordinates {
            parameters.insert(SERVICE_KEY, service.as_str());

            log::debug!("Rendering {entry_point} with service '{service}'");
            let renderer = self.renderers.create(&service, entry_point)?;
            let request = MapRequest {
                entry_point,
                service,
                parameters,
            };

            let mut text = renderer.display_map(&request)?;
            if !coord_fails.is_empty() {
                text.push_str(&self.notice(MessageKey::MapsUnrecognizedCoordsFor, &coord_fails));
            }
            if !geo_fails.is_empty() {
                text.push_str(&self.notice(MessageKey::MapsGeocodingFailedFor, &geo_fails));
            }

            return Ok(RenderedOutput::html(text, Outcome::Rendered));
        }

        if !coord_fails.is_empty() || !geo_fails.is_empty() {
            log::debug!(
                "Nothing to render for {entry_point}: {} coordinate and {} geocoding failures",
                coord_fails.len(),
                geo_fails.len()
            );
            let mut text = String::new();
            if !coord_fails.is_empty() {
                text.push_str(&self.notice(MessageKey::MapsUnrecognizedCoords, &coord_fails));
            }
            if !geo_fails.is_empty() {
                text.push_str(&self.notice(MessageKey::MapsGeocodingFailed, &geo_fails));
            }
            text.push_str(&self.notice(MessageKey::MapsMapCannotBeDisplayed, &[]));

            return Ok(RenderedOutput::html(text, Outcome::FailedWithDiagnostics));
        }

        Ok(RenderedOutput::html(
            self.notice(MessageKey::MapsCoordinatesMissing, &[]),
            Outcome::FailedEmpty,
        ))
    }

    fn notice(&self, key: MessageKey, items: &[String]) -> String {
        format!("<i>{}</i>", escape_html(&self.messages.format(key, items)))
    }
}
