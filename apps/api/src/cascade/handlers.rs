//! HTTP handlers for the card API: deserialize, call the pure core, map
//! `ConfigError` into the error envelope.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::cascade::layout::{resolve_layout, LineRow};
use crate::cascade::normalize::normalize;
use crate::cascade::style::{resolve_style, CardStyle};
use crate::errors::AppError;
use crate::models::card::{CardConfig, ContentItem, JustifyMode, RawCardConfig};
use crate::models::store::StateSnapshot;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub config: RawCardConfig,
    /// Entity-state snapshot the templates resolve against. Optional: a
    /// config-only preview renders with every lookup coming back `unknown`.
    #[serde(default)]
    pub states: StateSnapshot,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    /// The canonical configuration actually rendered — also the payload the
    /// host persists on config change.
    pub config: CardConfig,
    pub style: CardStyle,
    pub rows: Vec<LineRow>,
}

/// POST /api/v1/cards/render
pub async fn handle_render(
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    let config = normalize(req.config)?;
    let style = resolve_style(&config);
    let rows = resolve_layout(&config.content, &req.states);
    Ok(Json(RenderResponse {
        config,
        style,
        rows,
    }))
}

/// POST /api/v1/cards/normalize
///
/// The config-changed path: the host editor posts every raw mutation here
/// and persists the canonical result.
pub async fn handle_normalize(
    Json(raw): Json<RawCardConfig>,
) -> Result<Json<CardConfig>, AppError> {
    Ok(Json(normalize(raw)?))
}

/// GET /api/v1/cards/sample
///
/// Starter configuration for first-run editors: one item per justify
/// family, a templated attribute with a filter, and a filled line stack.
pub async fn handle_sample() -> Json<CardConfig> {
    Json(sample_config())
}

fn sample_config() -> CardConfig {
    let item = |text: &str, justify, line, center_position| ContentItem {
        text: text.to_string(),
        justify,
        line,
        center_position,
    };
    CardConfig {
        title: Some("Data Cascade".to_string()),
        content: vec![
            item(
                "L1 Start: {{ states('sensor.example_left') }}",
                JustifyMode::Start,
                1,
                50.0,
            ),
            item(
                "L1 End: {{ states('sensor.example_right') }}",
                JustifyMode::End,
                1,
                50.0,
            ),
            item(
                "L2 Center: {{ states('sensor.example_center') }}",
                JustifyMode::Center,
                2,
                50.0,
            ),
            item(
                "L3 Center: {{ state_attr('weather.home', 'temperature') | round(1) }}°",
                JustifyMode::Center,
                3,
                45.0,
            ),
            item("L3 End: {{ states('sensor.example_right') }}", JustifyMode::End, 3, 50.0),
            item("L4 Start", JustifyMode::Start, 4, 50.0),
            item("L5 Start", JustifyMode::Start, 5, 50.0),
            item("L6 Start", JustifyMode::Start, 6, 50.0),
            item("L7 Start", JustifyMode::Start, 7, 50.0),
        ],
        cascade_color: Some("var(--primary-color)".to_string()),
        font_size: Some("1rem".to_string()),
        height: Some("1.8em".to_string()),
        extra: Default::default(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::build_router;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let response = build_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_render_happy_path() {
        let (status, body) = post_json(
            "/api/v1/cards/render",
            json!({
                "config": {
                    "content": [
                        {"text": "Power: {{ states('sensor.x') }}", "line": 1},
                        {"text": "mid", "justify": "center", "line": 1, "center_position": 30}
                    ],
                    "height": "2em"
                },
                "states": {"sensor.x": {"state": "42"}}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][0]["start"][0], json!("Power: 42"));
        assert_eq!(body["rows"][0]["center"][0]["position"], json!(30.0));
        assert_eq!(body["rows"][0]["cascade_group"], json!(1));
        assert_eq!(body["style"]["row_height"], json!("2em"));
    }

    #[tokio::test]
    async fn test_render_without_states_resolves_unknown() {
        let (status, body) = post_json(
            "/api/v1/cards/render",
            json!({"config": {"content": ["{{ states('sensor.x') }}"]}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][0]["start"][0], json!("unknown"));
    }

    #[tokio::test]
    async fn test_render_missing_content_is_400() {
        let (status, body) =
            post_json("/api/v1/cards/render", json!({"config": {"title": "t"}})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("INVALID_CONFIG"));
    }

    #[tokio::test]
    async fn test_normalize_returns_canonical_config() {
        let (status, body) = post_json(
            "/api/v1/cards/normalize",
            json!({"content": ["bare", {"text": "r", "justify": "flex-end"}], "theme": "lcars"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["content"][0],
            json!({"text": "bare", "justify": "start", "line": 1, "center_position": 50.0})
        );
        assert_eq!(body["content"][1]["justify"], json!("end"));
        // Unknown keys survive the round trip.
        assert_eq!(body["theme"], json!("lcars"));
    }

    #[tokio::test]
    async fn test_sample_config_normalizes_to_itself() {
        let response = build_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/cards/sample")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let sample: Value = serde_json::from_slice(&bytes).unwrap();

        // The shipped sample must already be canonical.
        let raw: crate::models::card::RawCardConfig =
            serde_json::from_value(sample.clone()).unwrap();
        let normalized = crate::cascade::normalize::normalize(raw).unwrap();
        assert_eq!(serde_json::to_value(&normalized).unwrap(), sample);
    }
}
