use serde::{Deserialize, Serialize};

/// Five-valued drowsiness classification for one analyzed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrowsinessLevel {
    Awake,
    MildlyDrowsy,
    ModeratelyDrowsy,
    HighlyDrowsy,
    Unknown,
}

impl DrowsinessLevel {
    /// Map a free-form label from the model onto one of the five levels.
    ///
    /// Case, surrounding whitespace, and the separator between words
    /// (space, hyphen, underscore) are ignored. Anything else is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match key.as_str() {
            "awake" => Self::Awake,
            "mildly_drowsy" => Self::MildlyDrowsy,
            "moderately_drowsy" => Self::ModeratelyDrowsy,
            "highly_drowsy" => Self::HighlyDrowsy,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awake => "awake",
            Self::MildlyDrowsy => "mildly_drowsy",
            Self::ModeratelyDrowsy => "moderately_drowsy",
            Self::HighlyDrowsy => "highly_drowsy",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DrowsinessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of analyzing one frame
///
/// `confidence` is always within `[0.0, 1.0]` and `drowsiness_level` is always
/// one of the enumerated levels; [`AnalysisResult::new`] enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub drowsiness_level: DrowsinessLevel,

    /// Model's confidence in the assessment (0.0 to 1.0)
    pub confidence: f64,

    /// Specific observations, in the order the model reported them
    pub observations: Vec<String>,

    pub recommended_action: String,
}

impl AnalysisResult {
    pub fn new(
        drowsiness_level: DrowsinessLevel,
        confidence: f64,
        observations: Vec<String>,
        recommended_action: String,
    ) -> Self {
        Self {
            drowsiness_level,
            confidence: clamp_confidence(confidence),
            observations,
            recommended_action,
        }
    }

    /// Result reported when the model's output could not be parsed at all
    pub fn fallback() -> Self {
        Self {
            drowsiness_level: DrowsinessLevel::Unknown,
            confidence: 0.0,
            observations: vec!["parse failure".to_string()],
            recommended_action: "manual review required".to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
