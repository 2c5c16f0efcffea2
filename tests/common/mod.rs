// Shared fakes for the integration tests: in-memory tokenizers and a scripted
// fill-mask provider, so the menu and actions run without touching the Hub.

#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use tokenise::app::{FillMask, FillMaskProvider, TokenizerSource};
use tokenise::core::{DemoConfig, DemoError, Result, TokenizerSpec};
use tokenise::pipelines::fill_mask::FillMaskPrediction;
use tokenizers::Tokenizer;

pub const SENTENCE_VOCAB: [&str; 12] = [
    "[UNK]", "The", "cat", "sat", "on", "the", "mat", "because", "it", "was", "tired", ".",
];

/// A WordLevel tokenizer that splits on whitespace and punctuation.
pub fn word_level_json(vocab: &[&str]) -> String {
    let entries = vocab
        .iter()
        .enumerate()
        .map(|(id, token)| format!("\"{token}\": {id}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {{"type": "Whitespace"}},
            "post_processor": null,
            "decoder": null,
            "model": {{"type": "WordLevel", "vocab": {{{entries}}}, "unk_token": "[UNK]"}}
        }}"#
    )
}

pub fn sentence_tokenizer() -> Tokenizer {
    Tokenizer::from_str(&word_level_json(&SENTENCE_VOCAB)).unwrap()
}

/// Serves tokenizers for the repos it knows; every other repo fails to load.
#[derive(Default)]
pub struct InMemoryTokenizers {
    repos: HashMap<String, String>,
}

impl InMemoryTokenizers {
    pub fn with(mut self, repo: &str, json: String) -> Self {
        self.repos.insert(repo.to_string(), json);
        self
    }
}

impl TokenizerSource for InMemoryTokenizers {
    async fn load(&self, repo: &str) -> Result<Tokenizer> {
        let json = self
            .repos
            .get(repo)
            .ok_or_else(|| DemoError::Download(format!("{repo} is unreachable")))?;
        Ok(Tokenizer::from_str(json)?)
    }
}

/// Returns canned candidates depending on which word is masked.
pub struct ScriptedPipeline;

impl FillMask for ScriptedPipeline {
    fn top_k(&self, text: &str, k: usize) -> Result<Vec<FillMaskPrediction>> {
        let candidates: &[(&str, f32)] = if text.contains("cat [MASK]") {
            &[("sat", 0.6123), ("lay", 0.1987), ("slept", 0.0912), ("ran", 0.01)]
        } else {
            &[("was", 0.7345), ("felt", 0.1234), ("danced", 0.0421), ("is", 0.02)]
        };
        Ok(candidates
            .iter()
            .take(k)
            .map(|(word, score)| FillMaskPrediction {
                word: word.to_string(),
                score: *score,
            })
            .collect())
    }
}

/// Loads [`ScriptedPipeline`] for the models listed as available and records
/// every load attempt.
pub struct ScriptedFillMask {
    available: Vec<String>,
    pub attempts: Mutex<Vec<String>>,
}

impl ScriptedFillMask {
    pub fn available(models: &[&str]) -> Self {
        Self {
            available: models.iter().map(|m| m.to_string()).collect(),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl FillMaskProvider for ScriptedFillMask {
    type Pipeline = ScriptedPipeline;

    async fn load(&self, model_id: &str) -> Result<ScriptedPipeline> {
        self.attempts.lock().unwrap().push(model_id.to_string());
        if self.available.iter().any(|m| m == model_id) {
            Ok(ScriptedPipeline)
        } else {
            Err(DemoError::Download(format!("{model_id} is unreachable")))
        }
    }
}

pub const PRIMARY: &str = "test/primary-mlm";
pub const FALLBACK: &str = "test/fallback-mlm";

pub fn test_config(output_dir: &std::path::Path) -> DemoConfig {
    DemoConfig::default()
        .with_tokenizers(vec![
            TokenizerSpec::new("Word level (first)", "test/first"),
            TokenizerSpec::new("Word level (missing)", "test/missing"),
            TokenizerSpec::new("Word level (third)", "test/third"),
        ])
        .with_models(PRIMARY, FALLBACK)
        .with_output_path(output_dir.join("prediction.json"))
        .with_pause(Duration::ZERO)
}

pub fn test_tokenizers() -> InMemoryTokenizers {
    InMemoryTokenizers::default()
        .with("test/first", word_level_json(&SENTENCE_VOCAB))
        .with("test/third", word_level_json(&SENTENCE_VOCAB))
}
