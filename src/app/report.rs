use super::plausibility::plausibility_comment;
use crate::core::Result;
use crate::pipelines::fill_mask::FillMaskPrediction;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Rounds `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Key of one mask group, written as `mask_<position>` and ordered by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaskKey(pub usize);

impl fmt::Display for MaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mask_{}", self.0)
    }
}

impl Serialize for MaskKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MaskKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.strip_prefix("mask_")
            .and_then(|position| position.parse().ok())
            .map(MaskKey)
            .ok_or_else(|| de::Error::custom(format!("invalid mask key `{key}`")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPrediction {
    /// 1-based.
    pub rank: usize,
    pub token: String,
    /// Probability exactly as the model returned it.
    pub score: f32,
    pub confidence_percentage: f64,
    pub plausibility_comment: String,
}

impl RankedPrediction {
    pub fn new(rank: usize, mask_position: usize, prediction: &FillMaskPrediction) -> Self {
        Self {
            rank,
            token: prediction.word.clone(),
            score: prediction.score,
            confidence_percentage: round_to(f64::from(prediction.score) * 100.0, 2),
            plausibility_comment: plausibility_comment(mask_position, &prediction.word),
        }
    }
}

/// Outcome of one mask-prediction run, as printed and as saved to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub masked_input: String,
    pub original_sentence: String,
    pub model_used: String,
    pub predictions: BTreeMap<MaskKey, Vec<RankedPrediction>>,
}

impl PredictionReport {
    pub fn new(masked_input: &str, original_sentence: &str, model_used: &str) -> Self {
        Self {
            masked_input: masked_input.into(),
            original_sentence: original_sentence.into(),
            model_used: model_used.into(),
            predictions: BTreeMap::new(),
        }
    }

    /// Ranked predictions for the 1-based `mask_position`, if it was added.
    pub fn mask(&self, mask_position: usize) -> Option<&[RankedPrediction]> {
        self.predictions
            .get(&MaskKey(mask_position))
            .map(Vec::as_slice)
    }

    /// Ranks `predictions` (already ordered best first) for the given mask.
    pub fn add_mask(&mut self, mask_position: usize, predictions: &[FillMaskPrediction]) {
        let ranked = predictions
            .iter()
            .enumerate()
            .map(|(index, prediction)| RankedPrediction::new(index + 1, mask_position, prediction))
            .collect();
        self.predictions.insert(MaskKey(mask_position), ranked);
    }

    pub fn render<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "\n📊 PREDICTION RESULTS")?;
        writeln!(out, "{}", "=".repeat(50))?;
        for (mask_key, predictions) in &self.predictions {
            writeln!(out, "\n🔠 {}:", mask_key.to_string().to_uppercase())?;
            for p in predictions {
                writeln!(out, "  {}. \"{}\" ({}%)", p.rank, p.token, p.confidence_percentage)?;
                writeln!(out, "     💭 {}", p.plausibility_comment)?;
            }
        }
        Ok(())
    }

    /// Writes the report as pretty-printed JSON, replacing `path` only once the
    /// whole document is on disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, path)?;
        tracing::info!(path = %path.display(), "saved predictions");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
