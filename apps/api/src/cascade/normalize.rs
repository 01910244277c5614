//! Configuration normalizer — folds every accepted wire shape into the
//! canonical [`CardConfig`].
//!
//! Only a missing or unrepresentable `content` is fatal. Malformed entries
//! inside the list degrade to empty-text placeholders so one bad item never
//! takes down the card.

use thiserror::Error;
use tracing::debug;

use crate::models::card::{CardConfig, ContentItem, RawCardConfig, RawContent, RawEntry, RawItem};

/// Fatal configuration failure. Aborts card initialization; everything else
/// in this module degrades instead of failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing `content` in card config; content should be a list of items")]
    MissingContent,
    #[error("`content` must be a list of items or a string")]
    InvalidContent,
}

/// Normalizes a raw card configuration.
///
/// Idempotent: normalizing the serialized form of a normalized config is the
/// identity. Unknown top-level keys pass through unchanged.
pub fn normalize(raw: RawCardConfig) -> Result<CardConfig, ConfigError> {
    let content = raw.content.ok_or(ConfigError::MissingContent)?;
    let content: RawContent =
        serde_json::from_value(content).map_err(|_| ConfigError::InvalidContent)?;

    let content = match content {
        RawContent::Items(items) => normalize_items(items),
        RawContent::Legacy(text) => split_legacy(&text),
    };

    Ok(CardConfig {
        title: raw.title,
        content,
        cascade_color: raw.cascade_color,
        font_size: raw.font_size,
        height: raw.height,
        extra: raw.extra,
    })
}

fn normalize_items(items: Vec<RawItem>) -> Vec<ContentItem> {
    let mut placeholders = 0usize;
    let normalized = items
        .into_iter()
        .map(|item| match item {
            RawItem::Text(text) => ContentItem {
                text,
                ..ContentItem::default()
            },
            RawItem::Entry(entry) => normalize_entry(entry),
            RawItem::Other(_) => {
                placeholders += 1;
                ContentItem::default()
            }
        })
        .collect();
    if placeholders > 0 {
        debug!("coerced {placeholders} malformed content item(s) to empty placeholders");
    }
    normalized
}

fn normalize_entry(entry: RawEntry) -> ContentItem {
    ContentItem {
        text: entry.text.unwrap_or_default(),
        justify: entry.justify.unwrap_or_default(),
        line: entry.line.map(coerce_line).unwrap_or(1),
        center_position: entry.center_position.map(clamp_position).unwrap_or(50.0),
    }
}

/// Coerces a raw line number to a positive integer; anything that cannot be
/// one (zero, negatives, NaN) falls back to line 1.
fn coerce_line(raw: f64) -> u32 {
    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    if raw >= u32::MAX as f64 {
        return u32::MAX;
    }
    raw as u32
}

/// Clamps a center position into [0, 100]; NaN falls back to the midpoint.
fn clamp_position(raw: f64) -> f64 {
    if raw.is_nan() {
        return 50.0;
    }
    raw.clamp(0.0, 100.0)
}

/// Legacy bare-string content: one start-justified item per line, numbered
/// sequentially from 1. A single-line entity id keeps resolving through the
/// evaluator's whole-field shorthand, so the deprecated passthrough form
/// needs no special case here.
fn split_legacy(text: &str) -> Vec<ContentItem> {
    text.lines()
        .enumerate()
        .map(|(index, line)| ContentItem {
            text: line.to_string(),
            line: index as u32 + 1,
            ..ContentItem::default()
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::card::JustifyMode;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawCardConfig {
        serde_json::from_value(value).expect("raw config fixture")
    }

    #[test]
    fn test_missing_content_is_config_error() {
        let err = normalize(raw(json!({"title": "t"}))).unwrap_err();
        assert_eq!(err, ConfigError::MissingContent);
    }

    #[test]
    fn test_null_content_is_config_error() {
        let err = normalize(raw(json!({"content": null}))).unwrap_err();
        assert_eq!(err, ConfigError::MissingContent);
    }

    #[test]
    fn test_non_list_non_string_content_is_config_error() {
        assert_eq!(
            normalize(raw(json!({"content": 42}))).unwrap_err(),
            ConfigError::InvalidContent
        );
        assert_eq!(
            normalize(raw(json!({"content": {"text": "x"}}))).unwrap_err(),
            ConfigError::InvalidContent
        );
    }

    #[test]
    fn test_string_entries_become_start_items_on_line_1() {
        let config = normalize(raw(json!({"content": ["a", "b"]}))).unwrap();
        assert_eq!(config.content.len(), 2);
        for (item, text) in config.content.iter().zip(["a", "b"]) {
            assert_eq!(item.text, text);
            assert_eq!(item.justify, JustifyMode::Start);
            assert_eq!(item.line, 1);
            assert_eq!(item.center_position, 50.0);
        }
    }

    #[test]
    fn test_object_entry_fills_missing_fields_with_defaults() {
        let config = normalize(raw(json!({"content": [{"text": "only text"}]}))).unwrap();
        let item = &config.content[0];
        assert_eq!(item.text, "only text");
        assert_eq!(item.justify, JustifyMode::Start);
        assert_eq!(item.line, 1);
        assert_eq!(item.center_position, 50.0);
    }

    #[test]
    fn test_malformed_entries_become_placeholders_not_errors() {
        let config =
            normalize(raw(json!({"content": [null, 42, {"text": "ok"}]}))).unwrap();
        assert_eq!(config.content.len(), 3);
        assert_eq!(config.content[0].text, "");
        assert_eq!(config.content[1].text, "");
        assert_eq!(config.content[2].text, "ok");
    }

    #[test]
    fn test_line_coercion() {
        let config = normalize(raw(json!({"content": [
            {"text": "zero", "line": 0},
            {"text": "negative", "line": -3},
            {"text": "fractional", "line": 2.7},
            {"text": "stringy", "line": "4"},
            {"text": "garbage", "line": "two"}
        ]})))
        .unwrap();
        let lines: Vec<u32> = config.content.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![1, 1, 2, 4, 1]);
    }

    #[test]
    fn test_center_position_clamped() {
        let config = normalize(raw(json!({"content": [
            {"text": "low", "justify": "center", "center_position": -5},
            {"text": "high", "justify": "center", "center_position": 150},
            {"text": "zero", "justify": "center", "center_position": 0},
            {"text": "default", "justify": "center"}
        ]})))
        .unwrap();
        let positions: Vec<f64> = config.content.iter().map(|i| i.center_position).collect();
        assert_eq!(positions, vec![0.0, 100.0, 0.0, 50.0]);
    }

    #[test]
    fn test_unknown_justify_coerces_to_start_keeping_text() {
        let config =
            normalize(raw(json!({"content": [{"text": "kept", "justify": "middle"}]}))).unwrap();
        assert_eq!(config.content[0].justify, JustifyMode::Start);
        assert_eq!(config.content[0].text, "kept");
    }

    #[test]
    fn test_flex_aliases_accepted() {
        let config = normalize(raw(json!({"content": [
            {"text": "l", "justify": "flex-start"},
            {"text": "r", "justify": "flex-end"}
        ]})))
        .unwrap();
        assert_eq!(config.content[0].justify, JustifyMode::Start);
        assert_eq!(config.content[1].justify, JustifyMode::End);
    }

    #[test]
    fn test_legacy_string_splits_on_newlines() {
        let config = normalize(raw(json!({"content": "one\ntwo\nthree"}))).unwrap();
        assert_eq!(config.content.len(), 3);
        for (index, item) in config.content.iter().enumerate() {
            assert_eq!(item.line, index as u32 + 1);
            assert_eq!(item.justify, JustifyMode::Start);
        }
        assert_eq!(config.content[2].text, "three");
    }

    #[test]
    fn test_legacy_single_line_entity_id() {
        let config = normalize(raw(json!({"content": "sensor.x"}))).unwrap();
        assert_eq!(config.content.len(), 1);
        assert_eq!(config.content[0].text, "sensor.x");
        assert_eq!(config.content[0].line, 1);
    }

    #[test]
    fn test_unknown_top_level_keys_pass_through() {
        let config = normalize(raw(json!({
            "content": [],
            "theme": "lcars",
            "grid_options": {"columns": 12}
        })))
        .unwrap();
        assert_eq!(config.extra["theme"], json!("lcars"));
        assert_eq!(config.extra["grid_options"], json!({"columns": 12}));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let first = normalize(raw(json!({
            "title": "Cascade",
            "content": [
                "bare string",
                {"text": "centered", "justify": "center", "center_position": 20, "line": 2},
                {"text": "right", "justify": "flex-end", "line": 2}
            ],
            "font_size": "1rem",
            "custom_key": true
        })))
        .unwrap();

        let round_tripped = raw(serde_json::to_value(&first).unwrap());
        let second = normalize(round_tripped).unwrap();
        assert_eq!(first, second);
    }
}
