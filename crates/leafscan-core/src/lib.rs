pub mod category;
pub mod config;
pub mod error;
pub mod prediction;
pub mod tensor;

pub use category::{Category, CategoryRegistry, DEFAULT_CATEGORIES};
pub use config::{ConfigError, ImageSize, Settings};
pub use error::{LoadWarning, PipelineError, ResourceKind, WarningReason};
pub use prediction::{ClassScore, EnrichedResult, NO_ADVICE, Prediction, UNKNOWN_LABEL, display_label};
pub use tensor::{InputTensor, preprocess};
