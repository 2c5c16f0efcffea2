//! The interactive menu and the two actions behind it.

pub mod inspect;
pub mod plausibility;
pub mod predict;
pub mod report;
pub mod sources;

pub use inspect::{break_down, run_tokenizer_analysis, TokenBreakdown, TokenizerOutcome};
pub use plausibility::plausibility_comment;
pub use predict::run_mask_prediction;
pub use report::{MaskKey, PredictionReport, RankedPrediction};
pub use sources::{FillMask, FillMaskProvider, HubFillMask, HubTokenizers, TokenizerSource};

use crate::core::DemoConfig;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    TokenizerAnalysis,
    MaskPrediction,
    Exit,
}

impl MenuChoice {
    /// Parses one line of user input; surrounding whitespace is ignored.
    pub fn from_input(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::TokenizerAnalysis),
            "2" => Some(MenuChoice::MaskPrediction),
            "3" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

pub struct App<T, P> {
    config: DemoConfig,
    tokenizers: T,
    fill_mask: P,
}

impl App<HubTokenizers, HubFillMask> {
    /// The app as the binary runs it: everything comes from the Hugging Face Hub.
    pub fn from_hub(config: DemoConfig) -> Self {
        let fill_mask = HubFillMask::new(config.device.clone());
        Self::new(config, HubTokenizers, fill_mask)
    }
}

impl<T: TokenizerSource, P: FillMaskProvider> App<T, P> {
    pub fn new(config: DemoConfig, tokenizers: T, fill_mask: P) -> Self {
        Self {
            config,
            tokenizers,
            fill_mask,
        }
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    fn show_menu<W: Write>(out: &mut W) -> std::io::Result<()> {
        writeln!(out, "\n🤖 NLP TOKENIZER & MASK PREDICTION CLI")?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "1. 🔤 Tokenizer Types Analysis")?;
        writeln!(out, "2. 🎭 Mask & Predict")?;
        writeln!(out, "3. 🚪 Exit")?;
        writeln!(out, "{}", "=".repeat(50))
    }

    /// Runs the menu until the user picks "3" or input ends.
    ///
    /// Action failures are reported on `err` and never end the loop; only errors
    /// reading `input` or writing the output streams are returned.
    pub async fn run<R, W, E>(&self, mut input: R, out: &mut W, err: &mut E) -> std::io::Result<()>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        writeln!(out, "🚀 Starting NLP CLI Application...")?;

        loop {
            Self::show_menu(out)?;
            write!(out, "\n🔍 Enter your choice (1-3): ")?;
            out.flush()?;

            // Undecodable bytes are just another invalid choice.
            let mut raw = Vec::new();
            if input.read_until(b'\n', &mut raw)? == 0 {
                tracing::debug!("input closed");
                writeln!(out, "\n👋 Goodbye!")?;
                return Ok(());
            }

            match MenuChoice::from_input(&String::from_utf8_lossy(&raw)) {
                Some(MenuChoice::Exit) => {
                    writeln!(out, "\n👋 Goodbye!")?;
                    return Ok(());
                }
                Some(choice) => self.dispatch(choice, out, err).await?,
                None => writeln!(out, "\n❌ Invalid choice. Please select 1, 2, or 3.")?,
            }

            if !self.config.pause.is_zero() {
                tokio::time::sleep(self.config.pause).await;
            }
        }
    }

    /// Runs one action. [`MenuChoice::Exit`] does nothing here.
    pub async fn dispatch<W, E>(
        &self,
        choice: MenuChoice,
        out: &mut W,
        err: &mut E,
    ) -> std::io::Result<()>
    where
        W: Write,
        E: Write,
    {
        match choice {
            MenuChoice::TokenizerAnalysis => {
                run_tokenizer_analysis(&self.tokenizers, &self.config, out, err).await?;
            }
            MenuChoice::MaskPrediction => {
                if let Err(e) = run_mask_prediction(&self.fill_mask, &self.config, out).await {
                    tracing::error!(error = %e, "mask prediction failed");
                    writeln!(err, "❌ Error loading model or making predictions: {e}")?;
                    writeln!(
                        out,
                        "❌ Cannot proceed without a working model. Please check your internet connection or model availability."
                    )?;
                }
            }
            MenuChoice::Exit => {}
        }
        Ok(())
    }
}
