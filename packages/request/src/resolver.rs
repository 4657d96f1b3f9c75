//! Replaces address lists in the raw parameters with coordinates.
//!
//! Address-bearing parameters are `address=...`, `addresses=...` and the
//! unnamed positional parameter. Their values are `;`-separated items of
//! the form `location~alias~alias...`; each location is geocoded and the
//! alias parts are carried over untouched.

use wikimap_coords::{ALIAS_SEPARATOR, LIST_DELIMITER};
use wikimap_geocoder::LocationResolver;
use wikimap_request_models::{ADDRESS_KEYS, EntryPoint, GEOSERVICE_KEY, RawParam, SERVICE_KEY};

use crate::config::MapsConfig;
use crate::services::ServiceRegistry;

/// Output of [`change_addresses_to_coords`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddresses {
    /// The input parameters with every address-bearing entry rewritten as
    /// a positional coordinate list, in the original positions.
    pub params: Vec<RawParam>,
    /// Locations that could not be geocoded, in encounter order.
    pub failures: Vec<String>,
    /// Map service the addresses were geocoded for. The request is
    /// rendered with the same service.
    pub service: String,
}

/// Map service and geoservice a request's addresses are geocoded for.
struct GeocodingTarget {
    service: String,
    geoservice: String,
}

impl GeocodingTarget {
    fn scan(
        params: &[RawParam],
        config: &MapsConfig,
        services: &ServiceRegistry,
        entry_point: EntryPoint,
    ) -> Self {
        let requested = config
            .raw_param_value(SERVICE_KEY, params)
            .unwrap_or_default();

        Self {
            service: services.valid_service(requested, entry_point).to_string(),
            geoservice: config
                .raw_param_value(GEOSERVICE_KEY, params)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

fn is_address_key(param: &RawParam) -> bool {
    param
        .name_key()
        .is_some_and(|name| ADDRESS_KEYS.contains(&name.as_str()))
}

/// Geocodes every address-bearing parameter.
///
/// Each qualifying entry is replaced by a positional parameter holding
/// the `;`-joined resolved items; an entry that resolves nothing becomes
/// an empty positional parameter so positions stay stable. Items with an
/// empty location are skipped without being reported. Locations are
/// geocoded one at a time, in order.
pub async fn change_addresses_to_coords(
    params: &[RawParam],
    config: &MapsConfig,
    services: &ServiceRegistry,
    entry_point: EntryPoint,
    resolver: &dyn LocationResolver,
) -> ResolvedAddresses {
    let target = GeocodingTarget::scan(params, config, services, entry_point);
    log::debug!(
        "Geocoding addresses for service '{}' with geoservice '{}'",
        target.service,
        target.geoservice
    );

    let mut resolved_params = Vec::with_capacity(params.len());
    let mut failures = Vec::new();

    for param in params {
        let (list, is_default) = match param {
            RawParam::Positional(text) => (text.as_str(), true),
            RawParam::Named { value, .. } if is_address_key(param) => (value.as_str(), false),
            RawParam::Named { .. } => {
                resolved_params.push(param.clone());
                continue;
            }
        };

        let mut resolved = Vec::new();

        for item in list.split(LIST_DELIMITER) {
            let mut parts = item.split(ALIAS_SEPARATOR);
            let location = parts.next().unwrap_or_default().trim();
            if location.is_empty() {
                continue;
            }

            match resolver
                .attempt_to_geocode(location, &target.geoservice, &target.service, is_default)
                .await
            {
                Some(coords) => {
                    let rebuilt: Vec<&str> = std::iter::once(coords.as_str()).chain(parts).collect();
                    resolved.push(rebuilt.join(ALIAS_SEPARATOR));
                }
                None => {
                    log::debug!("Could not geocode {location:?}");
                    failures.push(location.to_string());
                }
            }
        }

        resolved_params.push(RawParam::Positional(resolved.join(LIST_DELIMITER)));
    }

    ResolvedAddresses {
        params: resolved_params,
        failures,
        service: target.service,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Resolves from a fixed table and records every call.
    struct TableResolver {
        table: Vec<(&'static str, &'static str)>,
        calls: Mutex<Vec<(String, String, String, bool)>>,
    }

    impl TableResolver {
        fn new(table: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                table,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LocationResolver for TableResolver {
        async fn attempt_to_geocode(
            &self,
            location: &str,
            geoservice: &str,
            map_service: &str,
            is_default_param: bool,
        ) -> Option<String> {
            self.calls.lock().unwrap().push((
                location.to_string(),
                geoservice.to_string(),
                map_service.to_string(),
                is_default_param,
            ));
            if is_default_param && wikimap_coords::is_coordinate(location) {
                return Some(location.to_string());
            }
            self.table
                .iter()
                .find(|(name, _)| *name == location)
                .map(|(_, coords)| (*coords).to_string())
        }
    }

    fn paris_resolver() -> TableResolver {
        TableResolver::new(vec![("Paris", "48.85,2.35"), ("Berlin", "52.52,13.4")])
    }

    async fn resolve(raw: &[&str], resolver: &TableResolver) -> ResolvedAddresses {
        let config = MapsConfig::embedded();
        let services = ServiceRegistry::from_config(&config).unwrap();
        change_addresses_to_coords(
            &RawParam::parse_all(raw),
            &config,
            &services,
            EntryPoint::DisplayPoints,
            resolver,
        )
        .await
    }

    #[tokio::test]
    async fn geocodes_address_list() {
        let resolver = paris_resolver();
        let result = resolve(&["address=Paris;Nowhereville"], &resolver).await;

        assert_eq!(
            result.params,
            vec![RawParam::Positional("48.85,2.35".to_string())]
        );
        assert_eq!(result.failures, vec!["Nowhereville"]);
    }

    #[tokio::test]
    async fn keeps_alias_parts() {
        let resolver = paris_resolver();
        let result = resolve(&["addresses= Paris ~City of Light~France; Berlin"], &resolver).await;

        assert_eq!(
            result.params,
            vec![RawParam::Positional(
                "48.85,2.35~City of Light~France;52.52,13.4".to_string()
            )]
        );
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn skips_empty_locations() {
        let resolver = paris_resolver();
        let result = resolve(&["address=;  ~alias only;Paris;"], &resolver).await;

        assert_eq!(
            result.params,
            vec![RawParam::Positional("48.85,2.35".to_string())]
        );
        assert!(result.failures.is_empty());
        assert_eq!(resolver.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unresolved_entry_becomes_empty_positional() {
        let resolver = paris_resolver();
        let result = resolve(&["zoom=4", "address=Atlantis", "width=300"], &resolver).await;

        assert_eq!(
            result.params,
            vec![
                RawParam::parse("zoom=4"),
                RawParam::Positional(String::new()),
                RawParam::parse("width=300"),
            ]
        );
        assert_eq!(result.failures, vec!["Atlantis"]);
    }

    #[tokio::test]
    async fn positional_coordinates_pass_through() {
        let resolver = paris_resolver();
        let result = resolve(&["48.8,2.3;Paris~Home"], &resolver).await;

        assert_eq!(
            result.params,
            vec![RawParam::Positional("48.8,2.3;48.85,2.35~Home".to_string())]
        );
        let calls = resolver.calls.lock().unwrap();
        assert!(calls.iter().all(|(_, _, _, is_default)| *is_default));
    }

    #[tokio::test]
    async fn named_address_is_not_default_param() {
        let resolver = paris_resolver();
        resolve(&["ADDRESS = Paris"], &resolver).await;

        let calls = resolver.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].3);
    }

    #[tokio::test]
    async fn passes_service_and_geoservice() {
        let resolver = paris_resolver();
        resolve(
            &["address=Paris", " Map_Service = layers", "geoservice= osm "],
            &resolver,
        )
        .await;

        let calls = resolver.calls.lock().unwrap();
        assert_eq!(calls[0].1, "osm");
        assert_eq!(calls[0].2, "openlayers");
    }

    #[tokio::test]
    async fn service_key_wins_over_its_aliases() {
        let resolver = paris_resolver();
        let result = resolve(
            &["address=Paris", "service=layers", "map_service=yahoo"],
            &resolver,
        )
        .await;

        assert_eq!(result.service, "openlayers");
        assert_eq!(resolver.calls.lock().unwrap()[0].2, "openlayers");
    }

    #[tokio::test]
    async fn defaults_service_and_geoservice() {
        let resolver = paris_resolver();
        resolve(&["address=Paris"], &resolver).await;

        let calls = resolver.calls.lock().unwrap();
        assert_eq!(calls[0].1, "");
        assert_eq!(calls[0].2, "googlemaps");
    }

    #[tokio::test]
    async fn concatenates_failures_across_parameters() {
        let resolver = paris_resolver();
        let result = resolve(
            &["address=Atlantis;Paris", "El Dorado", "addresses=Shangri-La"],
            &resolver,
        )
        .await;

        assert_eq!(result.failures, vec!["Atlantis", "El Dorado", "Shangri-La"]);
        assert_eq!(result.params.len(), 3);
    }

    #[tokio::test]
    async fn other_named_parameters_are_untouched() {
        let resolver = paris_resolver();
        let result = resolve(&["coordinates=Paris", "title=A=B"], &resolver).await;

        assert_eq!(result.params, RawParam::parse_all(&["coordinates=Paris", "title=A=B"]));
        assert!(resolver.calls.lock().unwrap().is_empty());
    }
}
