//! Traced building blocks shared by the BERT-family encoders.
//!
//! Thin wrappers around `candle_nn` layers that add a tracing span per call, plus
//! the attention block and masking helpers both encoders use.

use candle_core::{DType, Module, Result, Tensor, D};
use candle_nn::{ops::softmax_last_dim, VarBuilder};

#[derive(Debug, Clone)]
pub struct Embedding {
    inner: candle_nn::Embedding,
    span: tracing::Span,
}

impl Embedding {
    pub fn new(vocab_size: usize, hidden_size: usize, vb: VarBuilder) -> Result<Self> {
        let inner = candle_nn::embedding(vocab_size, hidden_size, vb)?;
        let span = tracing::span!(tracing::Level::TRACE, "embedding");
        Ok(Self { inner, span })
    }

    pub fn embeddings(&self) -> &Tensor {
        self.inner.embeddings()
    }
}

impl Module for Embedding {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let _enter = self.span.enter();
        self.inner.forward(xs)
    }
}

#[derive(Debug, Clone)]
pub struct Linear {
    inner: candle_nn::Linear,
    span: tracing::Span,
}

impl Linear {
    pub fn new(in_dim: usize, out_dim: usize, vb: VarBuilder) -> Result<Self> {
        let inner = candle_nn::linear(in_dim, out_dim, vb)?;
        let span = tracing::span!(tracing::Level::TRACE, "linear");
        Ok(Self { inner, span })
    }

    /// Output projection whose weight is shared with the word embeddings.
    pub fn tied(weight: Tensor, bias: Tensor) -> Self {
        let inner = candle_nn::Linear::new(weight, Some(bias));
        let span = tracing::span!(tracing::Level::TRACE, "tied-linear");
        Self { inner, span }
    }
}

impl Module for Linear {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let _enter = self.span.enter();
        self.inner.forward(xs)
    }
}

/// Layer norm that accepts both the `weight`/`bias` and the legacy `gamma`/`beta`
/// parameter names found in older BERT checkpoints.
pub fn layer_norm(size: usize, eps: f64, vb: VarBuilder) -> Result<candle_nn::LayerNorm> {
    let (weight, bias) = match (vb.get(size, "weight"), vb.get(size, "bias")) {
        (Ok(weight), Ok(bias)) => (weight, bias),
        (Err(err), _) | (_, Err(err)) => {
            match (vb.get(size, "gamma"), vb.get(size, "beta")) {
                (Ok(weight), Ok(bias)) => (weight, bias),
                _ => return Err(err),
            }
        }
    };
    Ok(candle_nn::LayerNorm::new(weight, bias, eps))
}

/// Turns a `(batch, seq_len)` mask of ones and zeros into an additive
/// `(batch, 1, 1, seq_len)` bias: 0 for visible positions, a large negative value for padding.
pub fn additive_attention_mask(attention_mask: &Tensor, dtype: DType) -> Result<Tensor> {
    let mask = attention_mask.to_dtype(DType::F32)?;
    let mask = (mask.affine(-1.0, 1.0)? * f32::MIN as f64)?;
    mask.unsqueeze(1)?.unsqueeze(1)?.to_dtype(dtype)
}

/// Bidirectional multi-head self-attention with separate query/key/value projections.
#[derive(Debug, Clone)]
pub struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    num_attention_heads: usize,
    attention_head_size: usize,
    span: tracing::Span,
}

impl SelfAttention {
    pub fn new(
        query: Linear,
        key: Linear,
        value: Linear,
        hidden_size: usize,
        num_attention_heads: usize,
    ) -> Self {
        Self {
            query,
            key,
            value,
            num_attention_heads,
            attention_head_size: hidden_size / num_attention_heads,
            span: tracing::span!(tracing::Level::TRACE, "self-attn"),
        }
    }

    fn split_heads(&self, xs: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = xs.dims3()?;
        xs.reshape((
            batch,
            seq_len,
            self.num_attention_heads,
            self.attention_head_size,
        ))?
        .transpose(1, 2)?
        .contiguous()
    }

    /// Returns the attended context, before the output projection.
    pub fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let _enter = self.span.enter();
        let (batch, seq_len, hidden_size) = hidden_states.dims3()?;

        let q = self.split_heads(&hidden_states.apply(&self.query)?)?;
        let k = self.split_heads(&hidden_states.apply(&self.key)?)?;
        let v = self.split_heads(&hidden_states.apply(&self.value)?)?;

        let scale = (self.attention_head_size as f64).powf(-0.5);
        let scores = (q.matmul(&k.t()?)? * scale)?;
        let scores = scores.broadcast_add(attention_mask)?;
        let probs = softmax_last_dim(&scores)?;

        probs
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq_len, hidden_size))
    }
}

/// Picks the hidden activation named in a checkpoint config.
pub fn activation(name: &str, xs: &Tensor) -> Result<Tensor> {
    match name {
        "gelu_new" | "gelu_pytorch_tanh" => xs.gelu(),
        "relu" => xs.relu(),
        _ => xs.gelu_erf(),
    }
}

/// Position ids `0..seq_len` shaped `(1, seq_len)`.
pub fn position_ids(input_ids: &Tensor) -> Result<Tensor> {
    let seq_len = input_ids.dim(D::Minus1)?;
    Tensor::arange(0u32, seq_len as u32, input_ids.device())?.unsqueeze(0)
}
