//! Mask prediction: fill each masked word of the demo sentence and save the report.

use super::report::PredictionReport;
use super::sources::{FillMask, FillMaskProvider};
use crate::core::{DemoConfig, DemoError, Result};
use std::io::Write;

/// Loads the primary model, or the fallback once if the primary fails.
async fn load_pipeline<P: FillMaskProvider, W: Write>(
    provider: &P,
    config: &DemoConfig,
    out: &mut W,
) -> Result<(P::Pipeline, String)> {
    match provider.load(&config.primary_model).await {
        Ok(pipeline) => Ok((pipeline, config.primary_model.clone())),
        Err(primary_err) => {
            tracing::warn!(model = %config.primary_model, error = %primary_err, "primary model unavailable");
            writeln!(out, "Trying alternative model...")?;
            match provider.load(&config.fallback_model).await {
                Ok(pipeline) => Ok((pipeline, config.fallback_model.clone())),
                Err(fallback_err) => Err(DemoError::ModelUnavailable {
                    primary: config.primary_model.clone(),
                    fallback: config.fallback_model.clone(),
                    reason: fallback_err.to_string(),
                }),
            }
        }
    }
}

/// Runs the action end to end. The report file is written only when every mask
/// was predicted.
pub async fn run_mask_prediction<P, W>(
    provider: &P,
    config: &DemoConfig,
    out: &mut W,
) -> Result<PredictionReport>
where
    P: FillMaskProvider,
    W: Write,
{
    let masked_input = config.masked_template()?;
    let variants = config.single_mask_variants()?;

    writeln!(out, "\n🎭 MASK PREDICTION")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "📝 Original: \"{}\"", config.sentence)?;
    writeln!(out, "🎭 Masked: \"{masked_input}\"")?;
    writeln!(out)?;
    writeln!(out, "⏳ Loading fill-mask pipeline...")?;

    let (pipeline, model_used) = load_pipeline(provider, config, out).await?;
    tracing::info!(model = %model_used, "fill-mask pipeline ready");

    writeln!(out, "🔍 Predicting masked tokens...\n")?;

    let mut report = PredictionReport::new(&masked_input, &config.sentence, &model_used);
    for (index, text) in variants.iter().enumerate() {
        let mask_position = index + 1;
        writeln!(out, "Processing mask {mask_position}: {text}")?;
        let predictions = pipeline.top_k(text, config.top_k)?;
        report.add_mask(mask_position, &predictions);
    }

    report.render(out)?;
    report.save(&config.output_path)?;
    writeln!(
        out,
        "\n💾 Predictions saved to {}",
        config.output_path.display()
    )?;

    Ok(report)
}
