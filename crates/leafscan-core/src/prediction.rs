//! Detection results handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Category;

/// Label used when the predicted index has no entry in the class map.
pub const UNKNOWN_LABEL: &str = "Unknown Disease";

/// Advice used when the label has no entry in the prevention map.
pub const NO_ADVICE: &str = "No prevention advice available.";

/// Resolved output of one model run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Argmax position in `raw_scores`.
    pub category_index: usize,
    /// Score at `category_index`, exactly as the model produced it.
    pub confidence: f32,
    pub label: String,
    pub raw_scores: Vec<f32>,
    pub low_confidence: bool,
}

/// One row of the detailed probability view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScore {
    pub index: usize,
    pub label: String,
    pub score: f32,
}

/// A [`Prediction`] with advice and translations attached.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedResult {
    pub category: Category,
    pub prediction: Prediction,
    /// Label with underscores replaced by spaces.
    pub display_label: String,
    pub advice: String,
    pub translated_label: String,
    pub translated_advice: String,
    pub target_language: String,
    /// Set when the class map or the advice map could not be loaded.
    pub degraded_metadata: bool,
    pub probabilities: Vec<ClassScore>,
    pub predicted_at: DateTime<Utc>,
}

/// Turn a raw class label such as `Early_blight` into `Early blight`.
pub fn display_label(label: &str) -> String {
    label.replace('_', " ")
}
