//! Style resolution — the small set of presentation knobs the card forwards
//! to the host renderer.
//!
//! `font_size` is the only value with teeth: it is validated against a CSS
//! length allowlist and never forwarded unsanitized. Color and height are
//! passthrough; the host resolves theme variables itself.

use serde::Serialize;
use tracing::warn;

use crate::models::card::CardConfig;

/// Default row height when the config does not set one.
pub const DEFAULT_ROW_HEIGHT: &str = "1.5em";

/// CSS length units accepted for `font_size`.
const FONT_SIZE_UNITS: &[&str] = &[
    "px", "em", "rem", "%", "ex", "ch", "vw", "vh", "vmin", "vmax", "pt", "pc", "in", "cm", "mm",
];

/// Resolved presentation values for one card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    pub row_height: String,
}

/// Derives the card's style from its normalized configuration.
///
/// An invalid `font_size` is dropped with a diagnostic and the theme default
/// applies; it is never forwarded as-is.
pub fn resolve_style(config: &CardConfig) -> CardStyle {
    let font_size = config
        .font_size
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| {
            if is_valid_font_size(s) {
                Some(s.to_string())
            } else {
                warn!("invalid font_size value `{s}`; falling back to theme default");
                None
            }
        });

    let cascade_color = config
        .cascade_color
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let row_height = config
        .height
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ROW_HEIGHT)
        .to_string();

    CardStyle {
        cascade_color,
        font_size,
        row_height,
    }
}

/// Accepts `<number><unit>`: one or more digits/dots, optional whitespace,
/// then a unit from the allowlist (case-insensitive). Nothing else.
fn is_valid_font_size(s: &str) -> bool {
    let numeric_end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    if numeric_end == 0 {
        return false;
    }
    let unit = s[numeric_end..].trim_start();
    FONT_SIZE_UNITS.iter().any(|u| unit.eq_ignore_ascii_case(u))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
