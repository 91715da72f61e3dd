use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::Category;

/// Errors that abort a single detection request.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown plant category: {category}")]
    InvalidCategory { category: String },

    #[error("{resource} unavailable for category {category}")]
    ResourceUnavailable {
        category: Category,
        resource: ResourceKind,
    },

    #[error("inference failed for category {category}: {reason}")]
    Inference { category: Category, reason: String },

    #[error("image error: {0}")]
    Image(String),
}

/// The per-category resources loaded from the model directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Model,
    ClassMap,
    Advice,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::ClassMap => "class map",
            Self::Advice => "prevention advice",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum WarningReason {
    /// The backing file does not exist.
    Missing,
    /// The file exists but could not be read, parsed, or deserialised.
    Invalid(String),
}

/// Advisory notice produced while loading a category's resources.
///
/// Never aborts a request: the affected resource falls back to an empty map
/// or an absent predictor.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{resource} {} for {category} ({})", reason_text(.reason), .path.display())]
pub struct LoadWarning {
    pub category: Category,
    pub resource: ResourceKind,
    pub path: PathBuf,
    pub reason: WarningReason,
}

impl LoadWarning {
    pub fn missing(category: &Category, resource: ResourceKind, path: PathBuf) -> Self {
        Self {
            category: category.clone(),
            resource,
            path,
            reason: WarningReason::Missing,
        }
    }

    pub fn invalid(
        category: &Category,
        resource: ResourceKind,
        path: PathBuf,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            category: category.clone(),
            resource,
            path,
            reason: WarningReason::Invalid(detail.into()),
        }
    }
}

fn reason_text(reason: &WarningReason) -> String {
    match reason {
        WarningReason::Missing => "missing".to_string(),
        WarningReason::Invalid(detail) => format!("invalid: {detail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_message_names_resource_and_category() {
        let w = LoadWarning::missing(
            &Category::new("tea"),
            ResourceKind::ClassMap,
            PathBuf::from("models/tea_class_map.json"),
        );
        assert_eq!(
            w.to_string(),
            "class map missing for tea (models/tea_class_map.json)"
        );
    }

    #[test]
    fn resource_unavailable_message() {
        let err = PipelineError::ResourceUnavailable {
            category: Category::new("corn"),
            resource: ResourceKind::Model,
        };
        assert_eq!(err.to_string(), "model unavailable for category corn");
    }
}
