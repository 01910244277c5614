//! Card configuration model — raw duck-typed wire shapes and the canonical form.
//!
//! Dashboard configs arrive in several historical shapes (bare string, list of
//! strings, list of objects). The raw shapes are sum types at the boundary;
//! `cascade::normalize` folds them into `CardConfig` once, and nothing
//! downstream branches on wire shape again.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ────────────────────────────────────────────────────────────────────────────
// Justify mode
// ────────────────────────────────────────────────────────────────────────────

/// Horizontal grouping category for a content item within its line.
///
/// `flex-start` / `flex-end` are accepted on input for compatibility with the
/// original card's wire names; canonical output always uses `start` / `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JustifyMode {
    #[default]
    #[serde(alias = "flex-start")]
    Start,
    Center,
    #[serde(alias = "flex-end")]
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

impl JustifyMode {
    /// Parses a wire name, falling back to `Start` for anything unrecognized.
    /// Malformed justify values must never drop an item, so this cannot fail.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "start" | "flex-start" => JustifyMode::Start,
            "center" => JustifyMode::Center,
            "end" | "flex-end" => JustifyMode::End,
            "space-between" => JustifyMode::SpaceBetween,
            "space-around" => JustifyMode::SpaceAround,
            "space-evenly" => JustifyMode::SpaceEvenly,
            _ => JustifyMode::Start,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Canonical configuration
// ────────────────────────────────────────────────────────────────────────────

/// A single normalized content item. All four fields are always populated:
/// `line >= 1`, `center_position` in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub text: String,
    pub justify: JustifyMode,
    pub line: u32,
    pub center_position: f64,
}

impl Default for ContentItem {
    fn default() -> Self {
        ContentItem {
            text: String::new(),
            justify: JustifyMode::Start,
            line: 1,
            center_position: 50.0,
        }
    }
}

/// Canonical card configuration produced by `cascade::normalize`.
///
/// Unknown top-level keys ride along in `extra` unchanged — the host may
/// attach its own metadata and expects it back on the config-changed path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Raw wire shapes
// ────────────────────────────────────────────────────────────────────────────

/// Raw card configuration as posted by the host. `content` is kept as a raw
/// JSON value so a wrong-shaped `content` surfaces as a `ConfigError` rather
/// than an opaque body-deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCardConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub cascade_color: Option<String>,
    #[serde(default)]
    pub font_size: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The two representable `content` shapes: a list of items, or the legacy
/// bare string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawContent {
    Items(Vec<RawItem>),
    Legacy(String),
}

/// One raw content entry. `Other` catches any non-string, non-object entry
/// (`null`, numbers, nested arrays) — those become empty-text placeholders.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawItem {
    Text(String),
    Entry(RawEntry),
    Other(Value),
}

/// Raw object-shaped entry. Every field deserializes leniently so a single
/// malformed field (e.g. `line: "two"`, `justify: 42`) falls back to its
/// default instead of discarding the whole item and its text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_justify")]
    pub justify: Option<JustifyMode>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub line: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub center_position: Option<f64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field deserializers
// ────────────────────────────────────────────────────────────────────────────

/// Accepts a JSON string; anything else yields `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Accepts a JSON number or a numeric string (the editor posts form values
/// as strings); anything else yields `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Accepts a justify wire name via `JustifyMode::from_wire`; non-string
/// values yield `None`.
fn lenient_justify<'de, D>(deserializer: D) -> Result<Option<JustifyMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(JustifyMode::from_wire(&s)),
        _ => None,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
