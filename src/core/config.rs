use crate::core::{DemoError, Result};
use crate::pipelines::utils::DeviceRequest;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SENTENCE: &str = "The cat sat on the mat because it was tired.";
pub const MASK_TOKEN: &str = "[MASK]";

/// A tokenizer shown in the inspection action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerSpec {
    /// Human readable label, e.g. `WordPiece (bert-base-uncased)`.
    pub label: String,
    /// Hub repository holding `tokenizer.json`.
    pub repo: String,
}

impl TokenizerSpec {
    pub fn new(label: &str, repo: &str) -> Self {
        Self {
            label: label.into(),
            repo: repo.into(),
        }
    }
}

/// Everything the demo runs against. [`Default`] holds the built-in demo values.
#[derive(Clone)]
pub struct DemoConfig {
    pub sentence: String,
    pub tokenizers: Vec<TokenizerSpec>,
    /// Words of `sentence` masked one at a time, in mask order.
    pub masked_words: Vec<String>,
    pub primary_model: String,
    pub fallback_model: String,
    pub top_k: usize,
    pub output_path: PathBuf,
    /// Delay before the menu is shown again after an action.
    pub pause: Duration,
    pub device: DeviceRequest,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            sentence: DEFAULT_SENTENCE.to_string(),
            tokenizers: vec![
                TokenizerSpec::new("BPE (bert-base-cased)", "google-bert/bert-base-cased"),
                TokenizerSpec::new(
                    "WordPiece (bert-base-uncased)",
                    "google-bert/bert-base-uncased",
                ),
                TokenizerSpec::new(
                    "SentencePiece (xlm-roberta-base)",
                    "FacebookAI/xlm-roberta-base",
                ),
            ],
            masked_words: vec!["sat".to_string(), "was".to_string()],
            primary_model: "google-bert/bert-base-uncased".to_string(),
            fallback_model: "distilbert/distilbert-base-uncased".to_string(),
            top_k: 3,
            output_path: PathBuf::from("prediction.json"),
            pause: Duration::from_secs(1),
            device: DeviceRequest::Default,
        }
    }
}

impl DemoConfig {
    pub fn with_tokenizers(mut self, tokenizers: Vec<TokenizerSpec>) -> Self {
        self.tokenizers = tokenizers;
        self
    }

    pub fn with_models(mut self, primary: &str, fallback: &str) -> Self {
        self.primary_model = primary.into();
        self.fallback_model = fallback.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_device(mut self, device: DeviceRequest) -> Self {
        self.device = device;
        self
    }

    /// One sentence per entry of `masked_words`, each with only that word masked.
    pub fn single_mask_variants(&self) -> Result<Vec<String>> {
        self.masked_words
            .iter()
            .map(|word| mask_word(&self.sentence, word))
            .collect()
    }

    /// The sentence with every entry of `masked_words` masked.
    pub fn masked_template(&self) -> Result<String> {
        self.masked_words
            .iter()
            .try_fold(self.sentence.clone(), |sentence, word| mask_word(&sentence, word))
    }
}

/// Replaces the first whole-word occurrence of `word` in `sentence` with `[MASK]`.
pub fn mask_word(sentence: &str, word: &str) -> Result<String> {
    let is_word_char = |c: char| c.is_alphanumeric() || c == '\'';

    let found = sentence.match_indices(word).find(|(start, _)| {
        let end = start + word.len();
        let before_ok = sentence[..*start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after_ok = sentence[end..].chars().next().map_or(true, |c| !is_word_char(c));
        before_ok && after_ok
    });

    match found {
        Some((start, _)) => Ok(format!(
            "{}{}{}",
            &sentence[..start],
            MASK_TOKEN,
            &sentence[start + word.len()..]
        )),
        None => Err(DemoError::Config(format!(
            "`{word}` does not occur as a word in \"{sentence}\""
        ))),
    }
}
