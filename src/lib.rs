//! Interactive demo of pretrained tokenizers and BERT fill-mask predictions.
//!
//! The binary shows a menu with two actions: inspect how three tokenizers split a
//! fixed sentence, and predict two masked words of that sentence with a BERT-family
//! model running locally on Candle. See [`app::App`].

pub mod app;
pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;

pub use app::{App, MenuChoice, PredictionReport};
pub use core::{DemoConfig, DemoError, TokenizerSpec};
