use super::{bert, distilbert};
use crate::loaders::{CheckpointLoader, TokenizerLoader};
use crate::pipelines::fill_mask::model::FillMaskModel;
use crate::pipelines::fill_mask::MaskedLmOptions;
use anyhow::{Error as E, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use serde::Deserialize;
use std::path::Path;
use tokenizers::Tokenizer;

#[derive(Deserialize)]
struct ModelTypeProbe {
    model_type: Option<String>,
}

#[derive(Debug, Clone)]
enum Architecture {
    Bert(bert::BertForMaskedLM),
    DistilBert(distilbert::DistilBertForMaskedLM),
}

/// A pretrained BERT-family checkpoint with its masked-LM head, picked from the
/// `model_type` in the checkpoint's `config.json`.
#[derive(Debug, Clone)]
pub struct MaskedLanguageModel {
    architecture: Architecture,
    device: Device,
}

impl MaskedLanguageModel {
    pub fn from_files(config_path: &Path, weights_path: &Path, device: Device) -> Result<Self> {
        let config_content = std::fs::read_to_string(config_path).map_err(|e| {
            E::msg(format!(
                "Failed to read config file {:?}: {}",
                config_path, e
            ))
        })?;

        let probe: ModelTypeProbe = serde_json::from_str(&config_content)?;

        let vb = if weights_path
            .extension()
            .is_some_and(|ext| ext == "safetensors")
        {
            // SAFETY: the file is only read while the model is alive and is not modified by us.
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? }
        } else if weights_path.extension().is_some_and(|ext| ext == "bin") {
            VarBuilder::from_pth(weights_path, DType::F32, &device)?
        } else {
            anyhow::bail!("Unsupported weight file format: {:?}", weights_path);
        };

        let architecture = match probe.model_type.as_deref() {
            Some("distilbert") => {
                let config: distilbert::Config = serde_json::from_str(&config_content)?;
                Architecture::DistilBert(distilbert::DistilBertForMaskedLM::load(vb, &config)?)
            }
            Some("bert") | None => {
                let config: bert::Config = serde_json::from_str(&config_content)?;
                Architecture::Bert(bert::BertForMaskedLM::load(vb, &config)?)
            }
            Some(other) => anyhow::bail!("Unsupported masked-LM architecture: {other}"),
        };

        tracing::info!(config = %config_path.display(), ?device, "loaded masked language model");

        Ok(Self {
            architecture,
            device,
        })
    }
}

impl FillMaskModel for MaskedLanguageModel {
    type Options = MaskedLmOptions;

    async fn new(options: Self::Options, device: Device) -> Result<Self> {
        let files = CheckpointLoader::new(&options.model_id).load().await?;
        Self::from_files(&files.config, &files.weights, device)
    }

    async fn get_tokenizer(options: Self::Options) -> Result<Tokenizer> {
        TokenizerLoader::new(&options.model_id, "tokenizer.json")
            .load()
            .await
    }

    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        match &self.architecture {
            Architecture::Bert(model) => model.forward(input_ids, attention_mask),
            Architecture::DistilBert(model) => model.forward(input_ids, attention_mask),
        }
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const VOCAB: usize = 12;
    const HIDDEN: usize = 8;
    const INTERMEDIATE: usize = 16;
    const POSITIONS: usize = 16;

    /// Small random checkpoint written with candle's safetensors writer.
    #[derive(Default)]
    struct Checkpoint {
        tensors: HashMap<String, Tensor>,
    }

    impl Checkpoint {
        fn random(&mut self, name: &str, shape: &[usize]) -> &mut Self {
            let tensor = Tensor::randn(0f32, 0.02, shape, &Device::Cpu).unwrap();
            self.tensors.insert(name.to_string(), tensor);
            self
        }

        fn linear(&mut self, prefix: &str, in_dim: usize, out_dim: usize) -> &mut Self {
            self.random(&format!("{prefix}.weight"), &[out_dim, in_dim])
                .random(&format!("{prefix}.bias"), &[out_dim])
        }

        fn norm(&mut self, prefix: &str, weight: &str, bias: &str) -> &mut Self {
            let ones = Tensor::ones(HIDDEN, DType::F32, &Device::Cpu).unwrap();
            let zeros = Tensor::zeros(HIDDEN, DType::F32, &Device::Cpu).unwrap();
            self.tensors.insert(format!("{prefix}.{weight}"), ones);
            self.tensors.insert(format!("{prefix}.{bias}"), zeros);
            self
        }

        fn bert() -> Self {
            let mut checkpoint = Self::default();
            checkpoint
                .random("bert.embeddings.word_embeddings.weight", &[VOCAB, HIDDEN])
                .random("bert.embeddings.position_embeddings.weight", &[POSITIONS, HIDDEN])
                .random("bert.embeddings.token_type_embeddings.weight", &[2, HIDDEN])
                .norm("bert.embeddings.LayerNorm", "gamma", "beta");
            let layer = "bert.encoder.layer.0";
            for name in ["query", "key", "value"] {
                checkpoint.linear(&format!("{layer}.attention.self.{name}"), HIDDEN, HIDDEN);
            }
            checkpoint
                .linear(&format!("{layer}.attention.output.dense"), HIDDEN, HIDDEN)
                .norm(&format!("{layer}.attention.output.LayerNorm"), "weight", "bias")
                .linear(&format!("{layer}.intermediate.dense"), HIDDEN, INTERMEDIATE)
                .linear(&format!("{layer}.output.dense"), INTERMEDIATE, HIDDEN)
                .norm(&format!("{layer}.output.LayerNorm"), "weight", "bias")
                .linear("cls.predictions.transform.dense", HIDDEN, HIDDEN)
                .norm("cls.predictions.transform.LayerNorm", "weight", "bias")
                .random("cls.predictions.bias", &[VOCAB]);
            checkpoint
        }

        fn distilbert() -> Self {
            let mut checkpoint = Self::default();
            checkpoint
                .random("distilbert.embeddings.word_embeddings.weight", &[VOCAB, HIDDEN])
                .random(
                    "distilbert.embeddings.position_embeddings.weight",
                    &[POSITIONS, HIDDEN],
                )
                .norm("distilbert.embeddings.LayerNorm", "weight", "bias");
            let layer = "distilbert.transformer.layer.0";
            for name in ["q_lin", "k_lin", "v_lin", "out_lin"] {
                checkpoint.linear(&format!("{layer}.attention.{name}"), HIDDEN, HIDDEN);
            }
            checkpoint
                .norm(&format!("{layer}.sa_layer_norm"), "weight", "bias")
                .linear(&format!("{layer}.ffn.lin1"), HIDDEN, INTERMEDIATE)
                .linear(&format!("{layer}.ffn.lin2"), INTERMEDIATE, HIDDEN)
                .norm(&format!("{layer}.output_layer_norm"), "weight", "bias")
                .linear("vocab_transform", HIDDEN, HIDDEN)
                .norm("vocab_layer_norm", "weight", "bias")
                .linear("vocab_projector", HIDDEN, VOCAB);
            checkpoint
        }

        fn save(&self, path: &Path) {
            candle_core::safetensors::save(&self.tensors, path).unwrap();
        }
    }

    fn bert_config(model_type: Option<&str>) -> String {
        let model_type = model_type
            .map(|name| format!(r#""model_type": "{name}","#))
            .unwrap_or_default();
        format!(
            r#"{{{model_type} "vocab_size": {VOCAB}, "hidden_size": {HIDDEN},
                "num_hidden_layers": 1, "num_attention_heads": 2,
                "intermediate_size": {INTERMEDIATE}, "max_position_embeddings": {POSITIONS}}}"#
        )
    }

    fn distilbert_config() -> String {
        format!(
            r#"{{"model_type": "distilbert", "vocab_size": {VOCAB}, "dim": {HIDDEN},
                "n_layers": 1, "n_heads": 2, "hidden_dim": {INTERMEDIATE},
                "max_position_embeddings": {POSITIONS}}}"#
        )
    }

    fn load(
        config: &str,
        checkpoint: &Checkpoint,
        weights_name: &str,
    ) -> Result<MaskedLanguageModel> {
        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("config.json");
        let weights_path = dir.path().join(weights_name);
        std::fs::write(&config_path, config)?;
        checkpoint.save(&weights_path);
        MaskedLanguageModel::from_files(&config_path, &weights_path, Device::Cpu)
    }

    fn assert_logits_shape(model: &MaskedLanguageModel) {
        let input_ids = Tensor::new(&[[1u32, 4, 5, 2]], &Device::Cpu).unwrap();
        let attention_mask = Tensor::new(&[[1u32, 1, 1, 1]], &Device::Cpu).unwrap();
        let logits = model.forward(&input_ids, &attention_mask).unwrap();
        assert_eq!(logits.dims(), &[1, 4, VOCAB]);
    }

    #[test]
    fn loads_bert_checkpoints() {
        let model =
            load(&bert_config(Some("bert")), &Checkpoint::bert(), "model.safetensors").unwrap();
        assert!(matches!(model.architecture, Architecture::Bert(_)));
        assert_logits_shape(&model);
    }

    #[test]
    fn missing_model_type_means_bert() {
        let model = load(&bert_config(None), &Checkpoint::bert(), "model.safetensors").unwrap();
        assert!(matches!(model.architecture, Architecture::Bert(_)));
    }

    #[test]
    fn loads_distilbert_checkpoints() {
        let model =
            load(&distilbert_config(), &Checkpoint::distilbert(), "model.safetensors").unwrap();
        assert!(matches!(model.architecture, Architecture::DistilBert(_)));
        assert_logits_shape(&model);
    }

    #[test]
    fn misshapen_decoder_weight_is_an_error() {
        let mut checkpoint = Checkpoint::bert();
        checkpoint.random("cls.predictions.decoder.weight", &[VOCAB, HIDDEN + 1]);
        assert!(load(&bert_config(Some("bert")), &checkpoint, "model.safetensors").is_err());
    }

    #[test]
    fn rejects_unknown_architectures() {
        let err = load(&bert_config(Some("roberta")), &Checkpoint::bert(), "model.safetensors")
            .unwrap_err();
        assert!(err.to_string().contains("roberta"));
    }

    #[test]
    fn rejects_unknown_weight_formats() {
        let err = load(&bert_config(Some("bert")), &Checkpoint::bert(), "weights.txt").unwrap_err();
        assert!(err.to_string().contains("Unsupported weight file format"));
    }
}
