//! Detection pipeline: validate the plant, run its model, and enrich the
//! result with advice and translations.

mod pipeline;
mod setup;

pub use pipeline::Pipeline;
pub use setup::translation_service;
