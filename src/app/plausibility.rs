//! Canned commentary on how well a predicted word fits the demo sentence.
//!
//! The table is hand-written for "The cat sat on the mat because it was tired." and
//! its two masked positions. It is illustrative text, not derived from the model.

/// Comment for `token` predicted at `mask_position` (1-based).
pub fn plausibility_comment(mask_position: usize, token: &str) -> String {
    let comment = match (mask_position, token) {
        // verb
        (1, "sat") => "Highly plausible - original word, perfect grammatical fit",
        (1, "lay") => "Plausible - cats do lay on mats, good alternative",
        (1, "slept") => "Very plausible - cats often sleep on mats",
        (1, "stood") => "Less plausible - unusual for cats to stand on mats",
        (1, "walked") => "Less plausible - doesn't fit the context well",
        (1, "jumped") => "Moderately plausible - cats can jump on mats",
        (1, "rested") => "Very plausible - similar meaning to the original context",
        // auxiliary verb / state
        (2, "was") => "Highly plausible - original word, explains the resting behavior perfectly",
        (2, "felt") => "Very plausible - similar meaning, fits context perfectly",
        (2, "seemed") => "Very plausible - explains why cat chose the mat",
        (2, "got") => "Moderately plausible - \"got tired\" is common usage, fits context",
        (2, "looked") => "Less plausible - \"looked tired\" changes meaning, less natural",
        (2, "became") => "Plausible - \"became tired\" fits the causal relationship",
        (2, "grew") => "Moderately plausible - \"grew tired\" is acceptable but less common",
        (2, "appeared") => "Moderately plausible - \"appeared tired\" suggests observation",
        _ => {
            return format!(
                "Context-dependent - \"{token}\" may fit depending on intended meaning"
            )
        }
    };
    comment.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pairs_return_canned_text() {
        assert_eq!(
            plausibility_comment(1, "sat"),
            "Highly plausible - original word, perfect grammatical fit"
        );
        assert_eq!(
            plausibility_comment(2, "got"),
            "Moderately plausible - \"got tired\" is common usage, fits context"
        );
    }

    #[test]
    fn table_is_keyed_by_position() {
        assert_eq!(
            plausibility_comment(2, "sat"),
            "Context-dependent - \"sat\" may fit depending on intended meaning"
        );
        assert_eq!(
            plausibility_comment(3, "was"),
            "Context-dependent - \"was\" may fit depending on intended meaning"
        );
    }

    #[test]
    fn unknown_tokens_fall_back_with_their_text() {
        let comment = plausibility_comment(1, "danced");
        assert!(comment.starts_with("Context-dependent"));
        assert!(comment.contains("\"danced\""));
    }

    #[test]
    fn lookup_is_exact() {
        assert!(plausibility_comment(1, "Sat").starts_with("Context-dependent"));
    }
}
