//! Per-plant label metadata: class maps and prevention advice.
//!
//! A class map is written by the training side as a JSON object mapping each
//! disease label to its output index (`{"Apple_scab": 0, "healthy": 1}`).
//! Inference needs the reverse direction, so [`ClassMap::invert`] builds an
//! [`IndexToLabel`] from it.

use std::collections::HashMap;

use leafscan_core::{ClassScore, NO_ADVICE, UNKNOWN_LABEL};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object at the top level")]
    NotObject,
    #[error("label {label:?} has non-integer index {value}")]
    BadIndex { label: String, value: Value },
    #[error("advice for {label:?} is not a string")]
    BadAdvice { label: String },
}

/// Label → index pairs, in the order they appear in the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMap {
    entries: Vec<(String, usize)>,
}

impl ClassMap {
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, usize)>) -> Self {
        Self {
            entries: pairs.into_iter().map(|(l, i)| (l.into(), i)).collect(),
        }
    }

    /// Parse a class map file, keeping the file's key order.
    pub fn from_json_str(text: &str) -> Result<Self, LabelError> {
        let Value::Object(map) = serde_json::from_str::<Value>(text)? else {
            return Err(LabelError::NotObject);
        };

        let mut entries = Vec::with_capacity(map.len());
        for (label, value) in map {
            let index = value
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| LabelError::BadIndex {
                    label: label.clone(),
                    value: value.clone(),
                })?;
            entries.push((label, index));
        }
        Ok(Self { entries })
    }

    /// Build the index → label map.
    ///
    /// Pairs are applied in source order, so when two labels share an index
    /// the later one wins.
    pub fn invert(&self) -> IndexToLabel {
        let mut labels = HashMap::with_capacity(self.entries.len());
        for (label, index) in &self.entries {
            labels.insert(*index, label.clone());
        }
        IndexToLabel { labels }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Model output index → disease label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexToLabel {
    labels: HashMap<usize, String>,
}

impl IndexToLabel {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    /// Label for `index`, or [`UNKNOWN_LABEL`].
    pub fn label_or_unknown(&self, index: usize) -> &str {
        self.get(index).unwrap_or(UNKNOWN_LABEL)
    }

    /// Pair every score with its label, falling back to `Class {i}`.
    pub fn class_scores(&self, scores: &[f32]) -> Vec<ClassScore> {
        scores
            .iter()
            .enumerate()
            .map(|(index, &score)| ClassScore {
                index,
                label: self
                    .get(index)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Class {index}")),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Disease label → prevention and cure advice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdviceMap {
    advice: HashMap<String, String>,
}

impl AdviceMap {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            advice: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, LabelError> {
        let Value::Object(map) = serde_json::from_str::<Value>(text)? else {
            return Err(LabelError::NotObject);
        };

        let mut advice = HashMap::with_capacity(map.len());
        for (label, value) in map {
            match value {
                Value::String(text) => {
                    advice.insert(label, text);
                }
                _ => return Err(LabelError::BadAdvice { label }),
            }
        }
        Ok(Self { advice })
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.advice.get(label).map(String::as_str)
    }

    /// Advice for `label`, or [`NO_ADVICE`].
    pub fn advice_or_default(&self, label: &str) -> &str {
        self.get(label).unwrap_or(NO_ADVICE)
    }

    pub fn len(&self) -> usize {
        self.advice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advice.is_empty()
    }
}
