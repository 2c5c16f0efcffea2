use super::model::FillMaskModel;
use crate::core::config::MASK_TOKEN;
use anyhow::{Error as E, Result};
use candle_core::{DType, IndexOp, Tensor};
use tokenizers::Tokenizer;

/// Mask tokens understood by the supported tokenizers, in lookup order.
const MASK_TOKEN_CANDIDATES: [&str; 2] = ["[MASK]", "<mask>"];

/// A predicted token with its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct FillMaskPrediction {
    /// Decoded, trimmed token text.
    pub word: String,
    /// Softmax probability at the masked position (0.0 to 1.0).
    pub score: f32,
}

/// Predicts tokens for a single `[MASK]` placeholder in text.
///
/// ```rust,no_run
/// use tokenise::models::MaskedLanguageModel;
/// use tokenise::pipelines::fill_mask::{FillMaskPipelineBuilder, MaskedLmOptions};
///
/// # async fn run() -> anyhow::Result<()> {
/// let pipeline = FillMaskPipelineBuilder::<MaskedLanguageModel>::new(MaskedLmOptions::new("google-bert/bert-base-uncased"))
///     .cpu()
///     .build()
///     .await?;
///
/// for prediction in pipeline.predict_top_k("The cat [MASK] on the mat.", 3)? {
///     println!("{}: {:.4}", prediction.word, prediction.score);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FillMaskPipeline<M: FillMaskModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
    mask_token: String,
    mask_token_id: u32,
}

impl<M: FillMaskModel> FillMaskPipeline<M> {
    /// Pairs a model with its tokenizer. Fails if the tokenizer has no mask token.
    pub fn new(model: M, tokenizer: Tokenizer) -> Result<Self> {
        let (mask_token, mask_token_id) = MASK_TOKEN_CANDIDATES
            .iter()
            .find_map(|token| {
                tokenizer
                    .token_to_id(token)
                    .map(|id| (token.to_string(), id))
            })
            .ok_or_else(|| E::msg("Tokenizer does not contain a mask token."))?;

        Ok(Self {
            model,
            tokenizer,
            mask_token,
            mask_token_id,
        })
    }

    /// Return the top prediction for the masked token.
    pub fn predict(&self, text: &str) -> Result<FillMaskPrediction> {
        self.predict_top_k(text, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| E::msg("No predictions returned"))
    }

    /// Return the `k` most probable tokens for the `[MASK]` in `text`, best first.
    pub fn predict_top_k(&self, text: &str, k: usize) -> Result<Vec<FillMaskPrediction>> {
        if text.matches(MASK_TOKEN).count() != 1 {
            anyhow::bail!("Input text must contain exactly one '{MASK_TOKEN}' token.");
        }
        let text = text.replace(MASK_TOKEN, &self.mask_token);

        let encoding = self.tokenizer.encode(text.as_str(), true).map_err(E::msg)?;
        let token_ids = encoding.get_ids();
        let mask_index = token_ids
            .iter()
            .position(|&id| id == self.mask_token_id)
            .ok_or_else(|| {
                E::msg(format!(
                    "Could not find mask token ID {} in tokenized input.",
                    self.mask_token_id
                ))
            })?;

        let device = self.model.device();
        let input_ids = Tensor::new(token_ids, device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let logits = self
            .model
            .forward(&input_ids, &attention_mask)?
            .to_dtype(DType::F32)?;
        let logits_at_mask = logits.i((0, mask_index))?.contiguous()?;
        let probabilities = candle_nn::ops::softmax_last_dim(&logits_at_mask.unsqueeze(0)?)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        let mut ranked: Vec<(u32, f32)> = probabilities
            .into_iter()
            .enumerate()
            .map(|(id, p)| (id as u32, p))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);

        ranked
            .into_iter()
            .map(|(id, score)| {
                let word = self.tokenizer.decode(&[id], true).map_err(E::msg)?;
                Ok(FillMaskPrediction {
                    word: word.trim().to_string(),
                    score,
                })
            })
            .collect()
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}
