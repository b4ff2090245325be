//! Normalization pipeline for raw model output
//!
//! `strip_fences → parse_strict → parse_braced → fallback`. Each stage is a
//! pure function; only [`normalize`] composes them, and it never fails.

use super::result::{AnalysisResult, DrowsinessLevel};
use serde_json::{Map, Value};
use tracing::warn;

/// Normalize a raw model reply into an [`AnalysisResult`].
///
/// Unparseable output yields [`AnalysisResult::fallback`] rather than an error.
pub fn normalize(raw: &str) -> AnalysisResult {
    let text = strip_fences(raw);

    if let Some(result) = parse_strict(text).or_else(|| parse_braced(text)) {
        return result;
    }

    warn!(
        "Could not parse model output ({} bytes), using fallback result",
        raw.len()
    );
    AnalysisResult::fallback()
}

/// Remove markdown code-fence markers (```` ``` ```` / ```` ```json ````) around the payload.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string (e.g. "json") along with the opening fence line
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Parse `text` as a single JSON object.
pub fn parse_strict(text: &str) -> Option<AnalysisResult> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(from_object(&map)),
        _ => None,
    }
}

/// Parse the substring between the first `{` and the last `}` of `text`.
pub fn parse_braced(text: &str) -> Option<AnalysisResult> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_strict(&text[start..=end])
}

fn from_object(map: &Map<String, Value>) -> AnalysisResult {
    let level = field(map, &["drowsiness_level", "drowsinessLevel"])
        .and_then(Value::as_str)
        .map(DrowsinessLevel::from_label)
        .unwrap_or(DrowsinessLevel::Unknown);

    let confidence = field(map, &["confidence"])
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .unwrap_or(0.0);

    let observations = match field(map, &["observations"]) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    };

    let recommended_action = field(map, &["recommended_action", "recommendedAction"])
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    AnalysisResult::new(level, confidence, observations, recommended_action)
}

fn field<'a>(map: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| map.get(*name))
}
