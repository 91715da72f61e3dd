use std::path::Path;
use std::sync::Arc;

use leafscan_core::InputTensor;

/// A trained model that maps one input batch to a score per class.
///
/// Scores are returned as the model produced them; callers do not apply
/// softmax or any other calibration.
pub trait Predictor: Send + Sync {
    fn infer(&self, input: &InputTensor) -> anyhow::Result<Vec<f32>>;
}

/// Deserialises a model artifact into a [`Predictor`].
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> anyhow::Result<Arc<dyn Predictor>>;
}
