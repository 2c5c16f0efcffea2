//! Masked language modeling pipeline.
//!
//! Fill-mask predicts the most likely word(s) for a `[MASK]` token in text and
//! returns them ranked by probability.

pub mod builder;
pub mod model;
pub mod pipeline;

pub use builder::{FillMaskPipelineBuilder, MaskedLmOptions};
pub use model::FillMaskModel;
pub use pipeline::{FillMaskPipeline, FillMaskPrediction};
