//! Layout resolver — turns normalized content items plus a state snapshot
//! into positioned rows.
//!
//! Pure and idempotent: no caching, no ordering assumptions between calls.
//! The host re-invokes it on every state or config change.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cascade::template::render_template;
use crate::models::card::{ContentItem, JustifyMode};
use crate::models::store::StateStore;

/// A center-bucket entry: rendered text plus its own horizontal position as
/// a percentage of the row width. Positions are independent; two center
/// items on one line may overlap, which is accepted behavior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterItem {
    pub text: String,
    pub position: f64,
}

/// One rendered row. `start` and `end` keep original relative order;
/// `cascade_group` is the 1..=7 animation bucket the host keys its keyframe
/// sets on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineRow {
    pub line: u32,
    pub cascade_group: u8,
    pub start: Vec<String>,
    pub center: Vec<CenterItem>,
    pub end: Vec<String>,
}

#[derive(Default)]
struct LineBuckets {
    start: Vec<String>,
    center: Vec<CenterItem>,
    end: Vec<String>,
}

/// The animation group for a line number: cycles 1..=7 (line 8 wraps back
/// to group 1).
pub fn cascade_group(line: u32) -> u8 {
    (line.saturating_sub(1) % 7 + 1) as u8
}

/// Renders each item's text through the template evaluator and groups the
/// results by line and justification.
///
/// Lines come out in ascending numeric order; lines no item references are
/// absent, not zero-filled. Within a bucket, items keep the relative order
/// they had in the config. Every justify mode other than `start` and
/// `center` lands in the end bucket — the visual distribution nuance is the
/// renderer's concern.
pub fn resolve_layout(items: &[ContentItem], store: &dyn StateStore) -> Vec<LineRow> {
    let mut lines: BTreeMap<u32, LineBuckets> = BTreeMap::new();

    for item in items {
        let rendered = render_template(&item.text, store);
        let buckets = lines.entry(item.line).or_default();
        match item.justify {
            JustifyMode::Start => buckets.start.push(rendered),
            JustifyMode::Center => buckets.center.push(CenterItem {
                text: rendered,
                position: item.center_position,
            }),
            _ => buckets.end.push(rendered),
        }
    }

    lines
        .into_iter()
        .map(|(line, buckets)| LineRow {
            line,
            cascade_group: cascade_group(line),
            start: buckets.start,
            center: buckets.center,
            end: buckets.end,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
