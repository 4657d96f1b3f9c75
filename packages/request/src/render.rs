//! Rendering providers and their registry.
//!
//! A provider turns a normalized [`MapRequest`] into markup. Providers
//! are registered per `(service, entry point)` as factories; asking for
//! an unregistered pair is an error rather than a silent fallback.

use std::collections::BTreeMap;

use wikimap_request_models::{EntryPoint, MapRequest};

use crate::RenderError;
use crate::messages::escape_html;
use crate::services::ServiceRegistry;

/// Renders a map request.
pub trait MapRenderer: Send + Sync {
    /// Produces the markup for `request`. The output is inserted into the
    /// page as-is.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the request cannot be rendered.
    fn display_map(&self, request: &MapRequest) -> Result<String, RenderError>;
}

/// Creates a renderer for one request.
pub type RendererFactory = Box<dyn Fn() -> Box<dyn MapRenderer> + Send + Sync>;

/// Renderer factories keyed by service id and entry point.
#[derive(Default)]
pub struct RendererRegistry {
    factories: BTreeMap<(String, EntryPoint), RendererFactory>,
}

impl RendererRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an [`EmbedRenderer`] for every entry point each service
    /// supports.
    #[must_use]
    pub fn with_defaults(services: &ServiceRegistry) -> Self {
        let mut registry = Self::new();
        for service in services.services() {
            for entry_point in &service.entry_points {
                registry.register(
                    &service.id,
                    *entry_point,
                    Box::new(|| -> Box<dyn MapRenderer> { Box::new(EmbedRenderer) }),
                );
            }
        }
        registry
    }

    /// Registers (or replaces) the factory for `service` and `entry_point`.
    pub fn register(&mut self, service: &str, entry_point: EntryPoint, factory: RendererFactory) {
        self.factories
            .insert((service.to_lowercase(), entry_point), factory);
    }

    /// Instantiates the renderer for `service` and `entry_point`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownProvider`] if no factory is
    /// registered for the pair.
    pub fn create(
        &self,
        service: &str,
        entry_point: EntryPoint,
    ) -> Result<Box<dyn MapRenderer>, RenderError> {
        self.factories
            .get(&(service.to_lowercase(), entry_point))
            .map(|factory| factory())
            .ok_or_else(|| RenderError::UnknownProvider {
                service: service.to_string(),
                entry_point,
            })
    }
}

/// Emits a placeholder element that a client-side map script picks up.
///
/// The normalized parameters travel as JSON in `data-parameters`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbedRenderer;

impl MapRenderer for EmbedRenderer {
    fn display_map(&self, request: &MapRequest) -> Result<String, RenderError> {
        let parameters = serde_json::to_string(&request.parameters)?;
        Ok(format!(
            r#"<div class="wikimap wikimap-{service}" data-entry-point="{entry_point}" data-parameters="{parameters}"></div>"#,
            service = escape_html(&request.service),
            entry_point = request.entry_point,
            parameters = escape_html(&parameters),
        ))
    }
}
