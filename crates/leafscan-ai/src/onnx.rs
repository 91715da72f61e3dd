//! ONNX Runtime predictor for per-plant image classifiers.
//!
//! Each plant model takes one NHWC batch `[1, H, W, 3]` of `f32` pixels in
//! `[0, 1]` and returns a `[1, num_classes]` score tensor.

use std::path::Path;
use std::sync::{Arc, Mutex};

use leafscan_core::InputTensor;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::predictor::{ModelLoader, Predictor};

/// A single ONNX classifier session.
///
/// Sessions run through `&mut`, so calls on the same plant are serialised by
/// a mutex. Different plants own different sessions and run in parallel.
pub struct OnnxPredictor {
    session: Mutex<Session>,
    num_classes: Option<usize>,
}

impl OnnxPredictor {
    /// Load an ONNX classifier from a `.onnx` file.
    pub fn load(model_path: &Path) -> anyhow::Result<Self> {
        anyhow::ensure!(model_path.exists(), "model not found: {model_path:?}");

        let session = Session::builder()?.commit_from_file(model_path)?;
        let num_classes = infer_num_classes(session.outputs()[0].dtype());

        info!(
            num_classes = ?num_classes,
            model = %model_path.display(),
            "loaded classifier model"
        );
        Ok(Self {
            session: Mutex::new(session),
            num_classes,
        })
    }

    /// Number of classes declared by the model's output, when static.
    pub fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }
}

impl Predictor for OnnxPredictor {
    fn infer(&self, input: &InputTensor) -> anyhow::Result<Vec<f32>> {
        let tensor = Tensor::from_array((input.shape_i64(), input.data.clone().into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        let outputs = session.run(ort::inputs![tensor])?;

        // Scores: [1, num_classes]; take the single batch row.
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        check_output_shape(output_shape, self.num_classes)?;

        Ok(output_data.to_vec())
    }
}

/// Output must be exactly `[1, num_classes]`, matching the declared class
/// count when the model declares one.
fn check_output_shape(dims: &[i64], num_classes: Option<usize>) -> anyhow::Result<()> {
    anyhow::ensure!(
        dims.len() == 2 && dims[0] == 1 && dims[1] > 0,
        "unexpected output shape: {dims:?}, expected [1, num_classes]"
    );
    if let Some(n) = num_classes {
        anyhow::ensure!(
            dims[1] as usize == n,
            "unexpected output shape: {dims:?}, expected [1, {n}]"
        );
    }
    Ok(())
}

/// [`ModelLoader`] producing [`OnnxPredictor`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxLoader;

impl ModelLoader for OnnxLoader {
    fn load(&self, path: &Path) -> anyhow::Result<Arc<dyn Predictor>> {
        Ok(Arc::new(OnnxPredictor::load(path)?))
    }
}

/// Try to read the class count from the ONNX model output type.
fn infer_num_classes(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
