use super::model::FillMaskModel;
use super::pipeline::FillMaskPipeline;
use crate::core::{global_cache, ModelOptions};
use crate::pipelines::utils::{build_cache_key, DeviceRequest};

/// Hub repository of a masked-LM checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedLmOptions {
    pub model_id: String,
}

impl MaskedLmOptions {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

impl ModelOptions for MaskedLmOptions {
    fn cache_key(&self) -> String {
        self.model_id.clone()
    }
}

pub struct FillMaskPipelineBuilder<M: FillMaskModel> {
    options: M::Options,
    device_request: DeviceRequest,
}

impl<M: FillMaskModel> FillMaskPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
        }
    }

    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    pub fn cuda_device(mut self, index: usize) -> Self {
        self.device_request = DeviceRequest::Cuda(index);
        self
    }

    pub fn device(mut self, device: candle_core::Device) -> Self {
        self.device_request = DeviceRequest::Explicit(device);
        self
    }

    pub fn device_request(mut self, request: DeviceRequest) -> Self {
        self.device_request = request;
        self
    }

    pub async fn build(self) -> anyhow::Result<FillMaskPipeline<M>>
    where
        M: Clone + Send + Sync + 'static,
        M::Options: ModelOptions,
    {
        let device = self.device_request.resolve()?;
        let key = build_cache_key(&self.options, &device);
        let model = global_cache()
            .get_or_create(&key, || M::new(self.options.clone(), device.clone()))
            .await?;
        let tokenizer = M::get_tokenizer(self.options).await?;
        FillMaskPipeline::new(model, tokenizer)
    }
}

impl FillMaskPipelineBuilder<crate::models::MaskedLanguageModel> {
    /// Builder for a BERT-family checkpoint hosted on the Hub.
    pub fn from_hub(model_id: &str) -> Self {
        Self::new(MaskedLmOptions::new(model_id))
    }
}
