//! Template mini-language evaluator.
//!
//! Scans a text string for `{{ ... }}` expressions and splices in values
//! resolved from the [`StateStore`]. The grammar is deliberately tiny:
//!
//! ```text
//! expression := call [ '|' filter ]
//! call       := "states(" quoted ")"
//!             | "state_attr(" quoted "," quoted ")"
//!             | entity_id                      (shorthand for states)
//! filter     := "round(" digits ")"
//! entity_id  := [a-z_]+ "." [a-z0-9_]+        (case-insensitive)
//! ```
//!
//! Parsing is an explicit scanner over the expression text, not a regex.
//! A failure inside one expression renders inline as `Error: <message>` at
//! that expression's position and never aborts the rest of the template.

use serde_json::Value;
use thiserror::Error;

use crate::models::store::StateStore;

/// State string substituted for entities absent from the store.
pub const MISSING_STATE: &str = "unknown";

/// Failure evaluating a single `{{ ... }}` expression. Always recovered at
/// expression granularity; the `Display` text is what the card shows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("unrecognized expression `{0}`")]
    UnrecognizedCall(String),
    #[error("malformed `{name}` call: {reason}")]
    MalformedCall { name: &'static str, reason: String },
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),
    #[error("malformed `round` filter: {0}")]
    MalformedFilter(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Template rendering
// ────────────────────────────────────────────────────────────────────────────

/// Renders a template by evaluating every `{{ ... }}` expression in it.
///
/// Text outside delimiters passes through untouched; an unterminated `{{`
/// is treated as plain text. A string with no delimiters that is exactly a
/// bare entity id resolves as a direct state lookup (legacy whole-field
/// shorthand) — but only when no substitution took place, so already
/// templated output is never resolved twice.
pub fn render_template(template: &str, store: &dyn StateStore) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut substituted = false;

    while let Some(open) = rest.find("{{") {
        // Non-greedy: close at the first `}}` after the opener.
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..open]);
        let expr = rest[open + 2..open + 2 + close].trim();
        match evaluate_expression(expr, store) {
            Ok(value) => out.push_str(&render_value(value)),
            Err(e) => out.push_str(&format!("Error: {e}")),
        }
        substituted = true;
        rest = &rest[open + 2 + close + 2..];
    }
    out.push_str(rest);

    if !substituted && is_entity_id(template.trim()) {
        return lookup_state(template.trim(), store);
    }
    out
}

/// Evaluates one expression interior (already trimmed of `{{ }}` and
/// surrounding whitespace). An empty interior renders as the empty string.
fn evaluate_expression(expr: &str, store: &dyn StateStore) -> Result<Value, ExpressionError> {
    if expr.is_empty() {
        return Ok(Value::String(String::new()));
    }
    // Split once: a second `|` stays inside the filter text and is reported
    // as a malformed filter rather than silently dropped.
    let (call, filter) = match expr.split_once('|') {
        Some((call, filter)) => (call.trim(), Some(filter.trim())),
        None => (expr, None),
    };

    let mut value = evaluate_call(call, store)?;
    if let Some(filter) = filter {
        value = apply_filter(filter, value)?;
    }
    Ok(value)
}

// ────────────────────────────────────────────────────────────────────────────
// Calls
// ────────────────────────────────────────────────────────────────────────────

fn evaluate_call(call: &str, store: &dyn StateStore) -> Result<Value, ExpressionError> {
    if let Some((name, interior)) = split_call(call) {
        return match name {
            "states" => {
                let args = parse_quoted_args(interior)
                    .map_err(|reason| ExpressionError::MalformedCall { name: "states", reason })?;
                let [entity_id] = args.as_slice() else {
                    return Err(ExpressionError::MalformedCall {
                        name: "states",
                        reason: format!("expected 1 argument, found {}", args.len()),
                    });
                };
                Ok(Value::String(lookup_state(entity_id, store)))
            }
            "state_attr" => {
                let args = parse_quoted_args(interior).map_err(|reason| {
                    ExpressionError::MalformedCall { name: "state_attr", reason }
                })?;
                let [entity_id, attr] = args.as_slice() else {
                    return Err(ExpressionError::MalformedCall {
                        name: "state_attr",
                        reason: format!("expected 2 arguments, found {}", args.len()),
                    });
                };
                Ok(store
                    .get(entity_id)
                    .and_then(|entity| entity.attributes.get(attr))
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            _ => Err(ExpressionError::UnrecognizedCall(call.to_string())),
        };
    }
    // Bare dotted identifier: shorthand for states(...), checked only after
    // the function forms fail to match.
    if is_entity_id(call) {
        return Ok(Value::String(lookup_state(call, store)));
    }
    Err(ExpressionError::UnrecognizedCall(call.to_string()))
}

fn lookup_state(entity_id: &str, store: &dyn StateStore) -> String {
    store
        .get(entity_id)
        .map(|entity| entity.state.clone())
        .unwrap_or_else(|| MISSING_STATE.to_string())
}

/// Splits `name( interior )` into its parts if the text has exactly that
/// shape (trailing `)` required). Returns `None` for anything else.
fn split_call(call: &str) -> Option<(&str, &str)> {
    let open = call.find('(')?;
    if !call.ends_with(')') || call.len() < open + 2 {
        return None;
    }
    let name = call[..open].trim_end();
    let interior = &call[open + 1..call.len() - 1];
    Some((name, interior))
}

/// Parses a comma-separated list of quoted string literals. Single or double
/// quotes, no escape sequences (a quote of the other kind is plain content).
fn parse_quoted_args(interior: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut rest = interior.trim();
    while !rest.is_empty() {
        let Some(quote) = rest.chars().next().filter(|c| *c == '\'' || *c == '"') else {
            return Err(format!("expected a quoted argument, found `{rest}`"));
        };
        let body = &rest[1..];
        let Some(end) = body.find(quote) else {
            return Err("unterminated string literal".to_string());
        };
        args.push(body[..end].to_string());
        rest = body[end + 1..].trim_start();
        if rest.is_empty() {
            break;
        }
        rest = match rest.strip_prefix(',') {
            Some(after) => after.trim_start(),
            None => return Err(format!("expected `,` between arguments, found `{rest}`")),
        };
        if rest.is_empty() {
            return Err("trailing `,` without an argument".to_string());
        }
    }
    Ok(args)
}

/// Matches `^[a-z_]+\.[a-z0-9_]+$`, case-insensitive: an entity id like
/// `sensor.outdoor_temp`. The domain part takes no digits and no second dot.
fn is_entity_id(s: &str) -> bool {
    let Some((domain, object_id)) = s.split_once('.') else {
        return false;
    };
    !domain.is_empty()
        && !object_id.is_empty()
        && domain
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '_')
        && object_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ────────────────────────────────────────────────────────────────────────────
// Filters
// ────────────────────────────────────────────────────────────────────────────

fn apply_filter(filter: &str, value: Value) -> Result<Value, ExpressionError> {
    let Some((name, interior)) = split_call(filter) else {
        return Err(ExpressionError::UnknownFilter(filter.to_string()));
    };
    if name != "round" {
        return Err(ExpressionError::UnknownFilter(filter.to_string()));
    }
    let digits: u32 = interior.trim().parse().map_err(|_| {
        ExpressionError::MalformedFilter(format!(
            "expected a non-negative integer digit count, found `{}`",
            interior.trim()
        ))
    })?;
    Ok(round_value(value, digits))
}

/// Standard half-away-from-zero rounding to `digits` decimal places.
/// Non-numeric values pass through unchanged.
fn round_value(value: Value, digits: u32) -> Value {
    let numeric = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = numeric else {
        return value;
    };
    let factor = 10f64.powi(digits.min(i32::MAX as u32) as i32);
    if !factor.is_finite() {
        return value;
    }
    let rounded = (number * factor).round() / factor;
    // f64 Display prints the shortest round-trip form: `21.4`, and `21`
    // rather than `21.0`.
    Value::String(format!("{rounded}"))
}

/// Renders an evaluated value for display. Missing attributes (`null`)
/// render as the empty string; compound values render as JSON.
fn render_value(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        compound => compound.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
