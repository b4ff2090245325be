// Tests for normalizing raw model output into AnalysisResult
//
// The parser must never fail: structured output is normalized, anything
// else becomes the deterministic fallback result.

use drowsiness_stream::analysis::{normalize, AnalysisResult, DrowsinessLevel};

#[test]
fn test_normalize_plain_json() {
    let raw = r#"{
        "drowsiness_level": "mildly drowsy",
        "confidence": 0.64,
        "observations": ["slow blinking", "slight head tilt"],
        "recommended_action": "consider a break soon"
    }"#;

    let result = normalize(raw);
    assert_eq!(result.drowsiness_level, DrowsinessLevel::MildlyDrowsy);
    assert_eq!(result.confidence, 0.64);
    assert_eq!(result.observations, vec!["slow blinking", "slight head tilt"]);
    assert_eq!(result.recommended_action, "consider a break soon");
}

#[test]
fn test_normalize_markdown_fenced_json() {
    let raw = "```json\n{\"drowsiness_level\": \"awake\", \"confidence\": 0.9, \"observations\": [], \"recommended_action\": \"none\"}\n```";

    let result = normalize(raw);
    assert_eq!(result.drowsiness_level, DrowsinessLevel::Awake);
    assert_eq!(result.confidence, 0.9);
    assert!(result.observations.is_empty());
}

#[test]
fn test_normalize_json_embedded_in_prose() {
    let raw = "Sure! Based on the image: {\"drowsiness_level\": \"moderately_drowsy\", \"confidence\": 0.75} Let me know if you need more.";

    let result = normalize(raw);
    assert_eq!(result.drowsiness_level, DrowsinessLevel::ModeratelyDrowsy);
    assert_eq!(result.confidence, 0.75);
    assert!(!result.is_fallback());
}

#[test]
fn test_normalize_clamps_confidence() {
    let cases = [
        (r#"{"confidence": 1.5}"#, 1.0),
        (r#"{"confidence": -0.3}"#, 0.0),
        (r#"{"confidence": 0.0}"#, 0.0),
        (r#"{"confidence": 1}"#, 1.0),
        (r#"{"confidence": "0.42"}"#, 0.42),
        (r#"{"confidence": null}"#, 0.0),
        (r#"{}"#, 0.0),
    ];

    for (raw, expected) in cases {
        let result = normalize(raw);
        assert_eq!(result.confidence, expected, "input {}", raw);
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}

#[test]
fn test_normalize_maps_levels_onto_enumeration() {
    let cases = [
        ("awake", DrowsinessLevel::Awake),
        ("AWAKE", DrowsinessLevel::Awake),
        ("mildly drowsy", DrowsinessLevel::MildlyDrowsy),
        ("Mildly-Drowsy", DrowsinessLevel::MildlyDrowsy),
        ("moderately_drowsy", DrowsinessLevel::ModeratelyDrowsy),
        (" highly drowsy ", DrowsinessLevel::HighlyDrowsy),
        ("unknown", DrowsinessLevel::Unknown),
        ("asleep", DrowsinessLevel::Unknown),
        ("", DrowsinessLevel::Unknown),
    ];

    for (label, expected) in cases {
        let raw = format!(r#"{{"drowsiness_level": "{}", "confidence": 0.5}}"#, label);
        assert_eq!(normalize(&raw).drowsiness_level, expected, "label {:?}", label);
    }

    // Non-string level
    assert_eq!(
        normalize(r#"{"drowsiness_level": 3}"#).drowsiness_level,
        DrowsinessLevel::Unknown
    );
}

#[test]
fn test_normalize_unparseable_yields_fallback() {
    let inputs = [
        "",
        "   ",
        "I cannot assess drowsiness from this image.",
        r#"{"drowsiness_level": "awake", "confidence": 0.9"#,
        "}{",
        "```json\n```",
        "[\"awake\", 0.9]",
        "null",
    ];

    for raw in inputs {
        let result = normalize(raw);
        assert_eq!(result, AnalysisResult::fallback(), "input {:?}", raw);
    }
}

#[test]
fn test_fallback_contents() {
    let fallback = AnalysisResult::fallback();
    assert_eq!(fallback.drowsiness_level, DrowsinessLevel::Unknown);
    assert_eq!(fallback.confidence, 0.0);
    assert_eq!(fallback.observations, vec!["parse failure"]);
    assert_eq!(fallback.recommended_action, "manual review required");
}

#[test]
fn test_analysis_result_serialization() {
    let result = AnalysisResult::new(
        DrowsinessLevel::ModeratelyDrowsy,
        0.8,
        vec!["yawning".to_string()],
        "take a break".to_string(),
    );

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["drowsiness_level"], "moderately_drowsy");
    assert_eq!(json["confidence"], 0.8);
    assert_eq!(json["observations"][0], "yawning");
    assert_eq!(json["recommended_action"], "take a break");
}

#[test]
fn test_analysis_result_new_clamps() {
    let result = AnalysisResult::new(DrowsinessLevel::Awake, f64::NAN, vec![], String::new());
    assert_eq!(result.confidence, 0.0);

    let result = AnalysisResult::new(DrowsinessLevel::Awake, 7.0, vec![], String::new());
    assert_eq!(result.confidence, 1.0);
}
