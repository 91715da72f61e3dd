//! Model registry and inference: cached per-plant resources, ONNX Runtime
//! predictors, and score-to-label resolution.

pub mod diagnostics;
pub mod dispatch;
pub mod labels;
pub mod predictor;
pub mod store;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::{OnnxLoader, OnnxPredictor};

pub use diagnostics::{DiagnosticSink, RecordingSink, TracingSink};
pub use dispatch::{InferenceDispatcher, argmax};
pub use labels::{AdviceMap, ClassMap, IndexToLabel, LabelError};
pub use predictor::{ModelLoader, Predictor};
pub use store::{CategoryResources, FsSource, ResourceSource, ResourceStore};
