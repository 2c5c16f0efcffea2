//! Model and tokenizer loading utilities for Hugging Face Hub integration.
//!
//! - [`HfLoader`] - Generic Hugging Face file loader with retry logic
//! - [`TokenizerLoader`] - Loads `tokenizer.json` from a repository
//! - [`CheckpointLoader`] - Fetches `config.json` plus the weight file of a masked-LM checkpoint
//!
//! All loaders go through the async Hub API and retry when the local cache lock is
//! held by another download.

use hf_hub::api::tokio::Api as HfApi;
use std::future::Future;
use std::path::PathBuf;
use tokenizers::Tokenizer;

const MAX_RETRIES: u32 = 3;

/// Weight files tried in order.
const WEIGHT_FILES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub async fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api: HfApi = hf_hub::api::tokio::ApiBuilder::new()
            .with_chunk_size(None)
            .build()?;
        let hf_repo = hf_api.model(self.repo.clone());

        let mut attempt = 0;
        loop {
            match hf_repo.get(self.filename.as_str()).await {
                Ok(path) => {
                    tracing::debug!(repo = %self.repo, file = %self.filename, path = %path.display(), "fetched");
                    return Ok(path);
                }
                Err(e) => {
                    let lock_contended = e.to_string().contains("Lock acquisition failed");
                    if lock_contended && attempt + 1 < MAX_RETRIES {
                        // 100ms, 200ms, ...
                        let wait_time = std::time::Duration::from_millis(100 * (1 << attempt));
                        tracing::debug!(repo = %self.repo, attempt, "hub cache locked, retrying");
                        tokio::time::sleep(wait_time).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(anyhow::Error::new(e)
                        .context(format!("failed to fetch {} from {}", self.filename, self.repo)));
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
}

impl TokenizerLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        let tokenizer_file_loader = HfLoader::new(repo, filename);

        Self {
            tokenizer_file_loader,
        }
    }

    pub async fn load(&self) -> anyhow::Result<Tokenizer> {
        let tokenizer_file_path = self.tokenizer_file_loader.load().await?;

        let tokenizer =
            tokenizers::Tokenizer::from_file(&tokenizer_file_path).map_err(|e| {
                anyhow::anyhow!(
                    "failed to load tokenizer from {}: {e}",
                    tokenizer_file_path.display()
                )
            })?;

        Ok(tokenizer)
    }
}

/// Files making up one checkpoint on disk.
#[derive(Debug, Clone)]
pub struct CheckpointFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CheckpointLoader {
    pub repo: String,
}

impl CheckpointLoader {
    pub fn new(repo: &str) -> Self {
        Self { repo: repo.into() }
    }

    /// Fetches `config.json` and the weights, preferring `model.safetensors` over
    /// `pytorch_model.bin`. When neither can be fetched the error carries both causes.
    pub async fn load(&self) -> anyhow::Result<CheckpointFiles> {
        let repo = self.repo.as_str();
        let config = HfLoader::new(repo, "config.json").load().await?;
        let weights = fetch_weights(repo, |filename| async move {
            HfLoader::new(repo, filename).load().await
        })
        .await?;

        Ok(CheckpointFiles { config, weights })
    }
}

/// Returns the first of [`WEIGHT_FILES`] that `fetch` can provide.
async fn fetch_weights<F, Fut>(repo: &str, fetch: F) -> anyhow::Result<PathBuf>
where
    F: Fn(&'static str) -> Fut,
    Fut: Future<Output = anyhow::Result<PathBuf>>,
{
    let mut failures = Vec::with_capacity(WEIGHT_FILES.len());
    for filename in WEIGHT_FILES {
        match fetch(filename).await {
            Ok(path) => return Ok(path),
            Err(e) => {
                tracing::debug!(repo, file = filename, error = %e, "weight file unavailable");
                failures.push(format!("{filename}: {e:#}"));
            }
        }
    }
    anyhow::bail!("could not fetch weights for {repo}. {}", failures.join("; "))
}
