//! DistilBERT encoder with its masked language modeling head.
//!
//! Used as the smaller fallback checkpoint (`distilbert/distilbert-base-uncased`).

use super::layers::{
    activation, additive_attention_mask, layer_norm, position_ids, Embedding, Linear,
    SelfAttention,
};
use candle_core::{Module, Result, Tensor};
use candle_nn::{LayerNorm, VarBuilder};
use serde::Deserialize;

const LAYER_NORM_EPS: f64 = 1e-12;

fn default_activation() -> String {
    "gelu".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub dim: usize,
    pub n_layers: usize,
    pub n_heads: usize,
    pub hidden_dim: usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_activation")]
    pub activation: String,
    #[serde(default)]
    pub pad_token_id: u32,
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            word_embeddings: Embedding::new(
                config.vocab_size,
                config.dim,
                vb.pp("word_embeddings"),
            )?,
            position_embeddings: Embedding::new(
                config.max_position_embeddings,
                config.dim,
                vb.pp("position_embeddings"),
            )?,
            layer_norm: layer_norm(config.dim, LAYER_NORM_EPS, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let words = self.word_embeddings.forward(input_ids)?;
        let positions = self.position_embeddings.forward(&position_ids(input_ids)?)?;
        words.broadcast_add(&positions)?.apply(&self.layer_norm)
    }
}

#[derive(Debug, Clone)]
struct TransformerBlock {
    attention: SelfAttention,
    out_lin: Linear,
    sa_layer_norm: LayerNorm,
    lin1: Linear,
    lin2: Linear,
    output_layer_norm: LayerNorm,
    activation: String,
}

impl TransformerBlock {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let dim = config.dim;
        let attn_vb = vb.pp("attention");
        let attention = SelfAttention::new(
            Linear::new(dim, dim, attn_vb.pp("q_lin"))?,
            Linear::new(dim, dim, attn_vb.pp("k_lin"))?,
            Linear::new(dim, dim, attn_vb.pp("v_lin"))?,
            dim,
            config.n_heads,
        );

        Ok(Self {
            attention,
            out_lin: Linear::new(dim, dim, attn_vb.pp("out_lin"))?,
            sa_layer_norm: layer_norm(dim, LAYER_NORM_EPS, vb.pp("sa_layer_norm"))?,
            lin1: Linear::new(dim, config.hidden_dim, vb.pp("ffn.lin1"))?,
            lin2: Linear::new(config.hidden_dim, dim, vb.pp("ffn.lin2"))?,
            output_layer_norm: layer_norm(dim, LAYER_NORM_EPS, vb.pp("output_layer_norm"))?,
            activation: config.activation.clone(),
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attended = self
            .attention
            .forward(hidden_states, attention_mask)?
            .apply(&self.out_lin)?;
        let hidden_states = (attended + hidden_states)?.apply(&self.sa_layer_norm)?;

        let ffn =
            activation(&self.activation, &hidden_states.apply(&self.lin1)?)?.apply(&self.lin2)?;
        (ffn + hidden_states)?.apply(&self.output_layer_norm)
    }
}

#[derive(Debug, Clone)]
pub struct DistilBertForMaskedLM {
    embeddings: Embeddings,
    layers: Vec<TransformerBlock>,
    vocab_transform: Linear,
    vocab_layer_norm: LayerNorm,
    vocab_projector: Linear,
    activation: String,
    span: tracing::Span,
}

impl DistilBertForMaskedLM {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let encoder_vb = if vb.contains_tensor("distilbert.embeddings.word_embeddings.weight") {
            vb.pp("distilbert")
        } else {
            vb.clone()
        };

        let embeddings = Embeddings::load(encoder_vb.pp("embeddings"), config)?;
        let layers = (0..config.n_layers)
            .map(|index| {
                TransformerBlock::load(encoder_vb.pp(format!("transformer.layer.{index}")), config)
            })
            .collect::<Result<Vec<_>>>()?;

        let projector_weight = if vb.contains_tensor("vocab_projector.weight") {
            vb.get((config.vocab_size, config.dim), "vocab_projector.weight")?
        } else {
            embeddings.word_embeddings.embeddings().clone()
        };
        let projector_bias = vb.get(config.vocab_size, "vocab_projector.bias")?;

        Ok(Self {
            vocab_transform: Linear::new(config.dim, config.dim, vb.pp("vocab_transform"))?,
            vocab_layer_norm: layer_norm(config.dim, LAYER_NORM_EPS, vb.pp("vocab_layer_norm"))?,
            vocab_projector: Linear::tied(projector_weight, projector_bias),
            activation: config.activation.clone(),
            embeddings,
            layers,
            span: tracing::span!(tracing::Level::TRACE, "distilbert-mlm"),
        })
    }

    /// Returns vocabulary logits shaped `(batch, seq_len, vocab_size)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let _enter = self.span.enter();
        let mut hidden_states = self.embeddings.forward(input_ids)?;
        let mask = additive_attention_mask(attention_mask, hidden_states.dtype())?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &mask)?;
        }

        let xs = activation(&self.activation, &hidden_states.apply(&self.vocab_transform)?)?;
        xs.apply(&self.vocab_layer_norm)?.apply(&self.vocab_projector)
    }
}
