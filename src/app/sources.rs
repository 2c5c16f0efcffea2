//! Where the menu actions get their tokenizers and fill-mask pipelines from.
//!
//! The Hub-backed implementations are what the binary uses; tests plug in
//! in-memory sources through the same traits.

use crate::core::{DemoError, Result};
use crate::loaders::TokenizerLoader;
use crate::models::MaskedLanguageModel;
use crate::pipelines::fill_mask::{
    FillMaskModel, FillMaskPipeline, FillMaskPipelineBuilder, FillMaskPrediction,
};
use crate::pipelines::utils::DeviceRequest;
use tokenizers::Tokenizer;

pub trait TokenizerSource {
    async fn load(&self, repo: &str) -> Result<Tokenizer>;
}

/// Something that ranks candidates for a single `[MASK]`.
pub trait FillMask {
    fn top_k(&self, text: &str, k: usize) -> Result<Vec<FillMaskPrediction>>;
}

pub trait FillMaskProvider {
    type Pipeline: FillMask;

    async fn load(&self, model_id: &str) -> Result<Self::Pipeline>;
}

impl<M: FillMaskModel> FillMask for FillMaskPipeline<M> {
    fn top_k(&self, text: &str, k: usize) -> Result<Vec<FillMaskPrediction>> {
        self.predict_top_k(text, k)
            .map_err(|e| DemoError::Inference(format!("{e:#}")))
    }
}

/// Downloads `tokenizer.json` files from the Hugging Face Hub.
#[derive(Debug, Clone, Copy, Default)]
pub struct HubTokenizers;

impl TokenizerSource for HubTokenizers {
    async fn load(&self, repo: &str) -> Result<Tokenizer> {
        TokenizerLoader::new(repo, "tokenizer.json")
            .load()
            .await
            .map_err(|e| DemoError::Download(format!("{e:#}")))
    }
}

/// Builds BERT-family fill-mask pipelines from Hugging Face Hub checkpoints.
#[derive(Clone, Default)]
pub struct HubFillMask {
    device: DeviceRequest,
}

impl HubFillMask {
    pub fn new(device: DeviceRequest) -> Self {
        Self { device }
    }
}

impl FillMaskProvider for HubFillMask {
    type Pipeline = FillMaskPipeline<MaskedLanguageModel>;

    async fn load(&self, model_id: &str) -> Result<Self::Pipeline> {
        FillMaskPipelineBuilder::from_hub(model_id)
            .device_request(self.device.clone())
            .build()
            .await
            .map_err(|e| DemoError::Download(format!("{e:#}")))
    }
}
