//! User-facing notices attached to map output.
//!
//! The pipeline only decides *which* message to show and with which
//! items; wording is delegated to a [`MessageFormatter`] so hosts can
//! plug in their own localization.

use strum_macros::{AsRefStr, Display};

/// Message identifiers, named after the host's localization keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MessageKey {
    /// Some coordinates were dropped from a rendered map.
    MapsUnrecognizedCoordsFor,
    /// Some addresses were dropped from a rendered map.
    MapsGeocodingFailedFor,
    /// Coordinates were rejected and nothing was rendered.
    MapsUnrecognizedCoords,
    /// Addresses could not be geocoded and nothing was rendered.
    MapsGeocodingFailed,
    MapsMapCannotBeDisplayed,
    MapsCoordinatesMissing,
}

/// Produces the text for a message.
///
/// `items` are the failed coordinates or addresses the message is about;
/// it is empty for messages that take no arguments.
pub trait MessageFormatter: Send + Sync {
    fn format(&self, key: MessageKey, items: &[String]) -> String;
}

/// Built-in English wording.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

impl MessageFormatter for EnglishMessages {
    fn format(&self, key: MessageKey, items: &[String]) -> String {
        let list = list_to_text(items);
        let plural = items.len() != 1;
        let (coordinates_were, addresses, have) = if plural {
            ("coordinates were", "addresses", "have")
        } else {
            ("coordinate was", "address", "has")
        };

        match key {
            MessageKey::MapsUnrecognizedCoordsFor => format!(
                "The following {coordinates_were} not recognized and {have} been omitted from the map: {list}."
            ),
            MessageKey::MapsGeocodingFailedFor => format!(
                "The following {addresses} could not be geocoded and {have} been omitted from the map: {list}."
            ),
            MessageKey::MapsUnrecognizedCoords => {
                format!("The following {coordinates_were} not recognized: {list}.")
            }
            MessageKey::MapsGeocodingFailed => {
                format!("The following {addresses} could not be geocoded: {list}.")
            }
            MessageKey::MapsMapCannotBeDisplayed => "The map cannot be displayed.".to_string(),
            MessageKey::MapsCoordinatesMissing => "No coordinates provided for the map.".to_string(),
        }
    }
}

/// Joins items as `a, b and c`.
#[must_use]
pub fn list_to_text(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Escapes text for inclusion in HTML content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
