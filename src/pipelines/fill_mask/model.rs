use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// A masked language model usable behind a [`FillMaskPipeline`](super::FillMaskPipeline).
pub trait FillMaskModel {
    type Options: std::fmt::Debug + Clone;

    async fn new(options: Self::Options, device: Device) -> anyhow::Result<Self>
    where
        Self: Sized;

    async fn get_tokenizer(options: Self::Options) -> anyhow::Result<Tokenizer>;

    /// Vocabulary logits shaped `(batch, seq_len, vocab_size)`.
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor>;

    fn device(&self) -> &Device;
}
