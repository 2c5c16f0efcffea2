pub mod bert;
pub mod distilbert;
mod layers;
mod masked_lm;

pub use masked_lm::MaskedLanguageModel;
