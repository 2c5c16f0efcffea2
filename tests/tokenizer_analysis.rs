mod common;

use common::{sentence_tokenizer, test_config, test_tokenizers};
use tokenise::app::{break_down, run_tokenizer_analysis};
use tokenise::core::config::DEFAULT_SENTENCE;

#[test]
fn break_down_decodes_each_id() {
    let breakdown = break_down(&sentence_tokenizer(), DEFAULT_SENTENCE).unwrap();
    assert_eq!(breakdown.ids, (1..=11).collect::<Vec<u32>>());
    assert_eq!(
        breakdown.tokens,
        vec!["The", "cat", "sat", "on", "the", "mat", "because", "it", "was", "tired", "."]
    );
}

#[test]
fn unknown_words_map_to_unk() {
    let breakdown = break_down(&sentence_tokenizer(), "The dog sat").unwrap();
    assert_eq!(breakdown.ids, vec![1, 0, 3]);
    assert_eq!(breakdown.tokens[1], "[UNK]");
}

#[tokio::test]
async fn a_failing_tokenizer_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let mut out = Vec::new();
    let mut err = Vec::new();

    let outcomes = run_tokenizer_analysis(&test_tokenizers(), &config, &mut out, &mut err)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].result.is_ok());
    assert!(outcomes[1]
        .result
        .as_ref()
        .unwrap_err()
        .contains("test/missing is unreachable"));
    assert_eq!(outcomes[2].result.as_ref().unwrap().ids.len(), 11);

    let out = String::from_utf8(out).unwrap();
    let err = String::from_utf8(err).unwrap();
    assert!(err.contains("❌ Error with Word level (missing)"));
    assert!(out.contains("📏 Token Count: 11"));
    assert_eq!(out.matches("🔠 Tokenizer:").count(), 3);
}
