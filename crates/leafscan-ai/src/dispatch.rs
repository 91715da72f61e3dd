//! Runs a plant's model and resolves the score vector into a [`Prediction`].

use std::sync::Arc;

use leafscan_core::config::DEFAULT_LOW_CONFIDENCE_THRESHOLD;
use leafscan_core::{Category, InputTensor, PipelineError, Prediction, ResourceKind};
use tracing::debug;

use crate::store::{CategoryResources, ResourceStore};

#[derive(Clone)]
pub struct InferenceDispatcher {
    store: Arc<ResourceStore>,
    low_confidence_threshold: f32,
}

impl InferenceDispatcher {
    pub fn new(store: Arc<ResourceStore>) -> Self {
        Self {
            store,
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
        }
    }

    /// Scores strictly below `threshold` get the low-confidence flag.
    pub fn with_low_confidence_threshold(mut self, threshold: f32) -> Self {
        self.low_confidence_threshold = threshold;
        self
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    /// Classify `input` with the model registered for `category`.
    pub fn classify(
        &self,
        category: &Category,
        input: &InputTensor,
    ) -> Result<Prediction, PipelineError> {
        let resources = self.store.get_resources(category)?;
        self.classify_with(&resources, input)
    }

    /// Like [`classify`](Self::classify), for callers already holding the
    /// category's resources.
    pub fn classify_with(
        &self,
        resources: &CategoryResources,
        input: &InputTensor,
    ) -> Result<Prediction, PipelineError> {
        let category = &resources.category;
        let predictor =
            resources
                .predictor
                .as_ref()
                .ok_or_else(|| PipelineError::ResourceUnavailable {
                    category: category.clone(),
                    resource: ResourceKind::Model,
                })?;

        let scores = predictor
            .infer(input)
            .map_err(|e| PipelineError::Inference {
                category: category.clone(),
                reason: format!("{e:#}"),
            })?;

        let (category_index, confidence) =
            argmax(&scores).ok_or_else(|| PipelineError::Inference {
                category: category.clone(),
                reason: "model returned no usable scores".to_string(),
            })?;

        let label = resources
            .index_to_label
            .label_or_unknown(category_index)
            .to_string();
        let low_confidence = confidence < self.low_confidence_threshold;

        debug!(
            category = %category,
            index = category_index,
            confidence,
            label = %label,
            low_confidence,
            "classified"
        );

        Ok(Prediction {
            category_index,
            confidence,
            label,
            raw_scores: scores,
            low_confidence,
        })
    }
}

/// Index and value of the highest score.
///
/// Ties go to the lowest index. NaN never wins; an empty or all-NaN slice
/// yields `None`.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best
}
