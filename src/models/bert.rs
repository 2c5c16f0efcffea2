//! BERT encoder with its masked language modeling head.
//!
//! Loads checkpoints laid out like `google-bert/bert-base-uncased`: the encoder lives
//! under `bert.*` and the prediction head under `cls.predictions.*`. Older checkpoints
//! using `gamma`/`beta` layer norm names load as well.

use super::layers::{
    activation, additive_attention_mask, layer_norm, position_ids, Embedding, Linear,
    SelfAttention,
};
use candle_core::{Module, Result, Tensor};
use candle_nn::{LayerNorm, VarBuilder};
use serde::Deserialize;

fn default_layer_norm_eps() -> f64 {
    1e-12
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

fn default_type_vocab_size() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default)]
    pub pad_token_id: u32,
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            word_embeddings: Embedding::new(
                config.vocab_size,
                config.hidden_size,
                vb.pp("word_embeddings"),
            )?,
            position_embeddings: Embedding::new(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type_embeddings: Embedding::new(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let words = self.word_embeddings.forward(input_ids)?;
        let positions = self.position_embeddings.forward(&position_ids(input_ids)?)?;
        let token_types = self.token_type_embeddings.forward(&input_ids.zeros_like()?)?;
        words
            .broadcast_add(&positions)?
            .broadcast_add(&token_types)?
            .apply(&self.layer_norm)
    }
}

#[derive(Debug, Clone)]
struct Layer {
    attention: SelfAttention,
    attention_output: Linear,
    attention_norm: LayerNorm,
    intermediate: Linear,
    output: Linear,
    output_norm: LayerNorm,
    hidden_act: String,
}

impl Layer {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let hidden = config.hidden_size;
        let self_vb = vb.pp("attention.self");
        let attention = SelfAttention::new(
            Linear::new(hidden, hidden, self_vb.pp("query"))?,
            Linear::new(hidden, hidden, self_vb.pp("key"))?,
            Linear::new(hidden, hidden, self_vb.pp("value"))?,
            hidden,
            config.num_attention_heads,
        );

        Ok(Self {
            attention,
            attention_output: Linear::new(hidden, hidden, vb.pp("attention.output.dense"))?,
            attention_norm: layer_norm(
                hidden,
                config.layer_norm_eps,
                vb.pp("attention.output.LayerNorm"),
            )?,
            intermediate: Linear::new(
                hidden,
                config.intermediate_size,
                vb.pp("intermediate.dense"),
            )?,
            output: Linear::new(config.intermediate_size, hidden, vb.pp("output.dense"))?,
            output_norm: layer_norm(hidden, config.layer_norm_eps, vb.pp("output.LayerNorm"))?,
            hidden_act: config.hidden_act.clone(),
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attended = self
            .attention
            .forward(hidden_states, attention_mask)?
            .apply(&self.attention_output)?;
        let hidden_states = (attended + hidden_states)?.apply(&self.attention_norm)?;

        let intermediate = activation(&self.hidden_act, &hidden_states.apply(&self.intermediate)?)?;
        let output = intermediate.apply(&self.output)?;
        (output + hidden_states)?.apply(&self.output_norm)
    }
}

/// Prediction head mapping hidden states back onto the vocabulary.
#[derive(Debug, Clone)]
struct MaskedLMHead {
    dense: Linear,
    norm: LayerNorm,
    decoder: Linear,
    hidden_act: String,
}

impl MaskedLMHead {
    fn load(vb: VarBuilder, config: &Config, word_embeddings: &Tensor) -> Result<Self> {
        let transform = vb.pp("transform");
        let dense = Linear::new(config.hidden_size, config.hidden_size, transform.pp("dense"))?;
        let norm = layer_norm(
            config.hidden_size,
            config.layer_norm_eps,
            transform.pp("LayerNorm"),
        )?;

        let decoder_weight = if vb.contains_tensor("decoder.weight") {
            vb.get((config.vocab_size, config.hidden_size), "decoder.weight")?
        } else {
            word_embeddings.clone()
        };
        let decoder_bias = vb.get(config.vocab_size, "bias")?;

        Ok(Self {
            dense,
            norm,
            decoder: Linear::tied(decoder_weight, decoder_bias),
            hidden_act: config.hidden_act.clone(),
        })
    }
}

impl Module for MaskedLMHead {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = activation(&self.hidden_act, &xs.apply(&self.dense)?)?;
        xs.apply(&self.norm)?.apply(&self.decoder)
    }
}

#[derive(Debug, Clone)]
pub struct BertForMaskedLM {
    embeddings: Embeddings,
    layers: Vec<Layer>,
    head: MaskedLMHead,
    span: tracing::Span,
}

impl BertForMaskedLM {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let encoder_vb = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            vb.pp("bert")
        } else {
            vb.clone()
        };

        let embeddings = Embeddings::load(encoder_vb.pp("embeddings"), config)?;
        let layers = (0..config.num_hidden_layers)
            .map(|index| Layer::load(encoder_vb.pp(format!("encoder.layer.{index}")), config))
            .collect::<Result<Vec<_>>>()?;
        let head = MaskedLMHead::load(
            vb.pp("cls.predictions"),
            config,
            embeddings.word_embeddings.embeddings(),
        )?;

        Ok(Self {
            embeddings,
            layers,
            head,
            span: tracing::span!(tracing::Level::TRACE, "bert-mlm"),
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
        hidden_states.apply(&self.head)
    }
}
