//! Tokenizer inspection: how each tokenizer splits the demo sentence.

use super::sources::TokenizerSource;
use crate::core::{DemoConfig, Result};
use std::io::Write;
use tokenizers::Tokenizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBreakdown {
    pub ids: Vec<u32>,
    /// Each id decoded on its own, special tokens included.
    pub tokens: Vec<String>,
}

/// Result for one configured tokenizer. A failure is kept as its message so the
/// remaining tokenizers still run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerOutcome {
    pub label: String,
    pub result: std::result::Result<TokenBreakdown, String>,
}

/// Encodes `sentence` with special tokens and decodes every id individually.
/// Ids that fail to decode are shown as `[id]`.
pub fn break_down(tokenizer: &Tokenizer, sentence: &str) -> Result<TokenBreakdown> {
    let encoding = tokenizer.encode(sentence, true)?;
    let ids = encoding.get_ids().to_vec();
    let tokens = ids
        .iter()
        .map(|&id| {
            tokenizer
                .decode(&[id], false)
                .unwrap_or_else(|_| format!("[{id}]"))
        })
        .collect();
    Ok(TokenBreakdown { ids, tokens })
}

/// Prints the breakdown of every configured tokenizer on `out`. Failures go to
/// `err` and the next tokenizer still runs.
pub async fn run_tokenizer_analysis<T, W, E>(
    source: &T,
    config: &DemoConfig,
    out: &mut W,
    err: &mut E,
) -> std::io::Result<Vec<TokenizerOutcome>>
where
    T: TokenizerSource,
    W: Write,
    E: Write,
{
    writeln!(out, "\n🔤 TOKENIZER ANALYSIS")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "📝 Input sentence: \"{}\"", config.sentence)?;

    let mut outcomes = Vec::with_capacity(config.tokenizers.len());
    for spec in &config.tokenizers {
        writeln!(out, "\n🔠 Tokenizer: {}", spec.label)?;
        writeln!(out, "{}", "-".repeat(40))?;

        let result = match source.load(&spec.repo).await {
            Ok(tokenizer) => break_down(&tokenizer, &config.sentence),
            Err(e) => Err(e),
        };

        match &result {
            Ok(breakdown) => {
                writeln!(out, "🔢 Token IDs: {:?}", breakdown.ids)?;
                writeln!(out, "📏 Token Count: {}", breakdown.ids.len())?;
                writeln!(out, "🧩 Tokens: {:?}", breakdown.tokens)?;
            }
            Err(e) => {
                tracing::warn!(tokenizer = %spec.repo, error = %e, "tokenizer inspection failed");
                writeln!(err, "❌ Error with {}: {}", spec.label, e)?;
            }
        }

        outcomes.push(TokenizerOutcome {
            label: spec.label.clone(),
            result: result.map_err(|e| e.to_string()),
        });
    }

    Ok(outcomes)
}
