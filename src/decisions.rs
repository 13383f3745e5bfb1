use async_trait::async_trait;
use anyhow::Context;
use core_types::DecisionBatch;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::Mutex;

/// Supplies the decision batch for a trading cycle.
///
/// The analysis that produces decisions lives outside this binary; implementations
/// only fetch its latest output.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn decisions(&self, tickers: &[String]) -> anyhow::Result<DecisionBatch>;
}

/// Accepts either `{"decisions": {...}}` or the bare ticker map.
#[derive(Deserialize)]
#[serde(untagged)]
enum DecisionFile {
    Wrapped { decisions: DecisionBatch },
    Bare(DecisionBatch),
}

impl DecisionFile {
    fn into_batch(self) -> DecisionBatch {
        match self {
            DecisionFile::Wrapped { decisions } => decisions,
            DecisionFile::Bare(decisions) => decisions,
        }
    }
}

/// Parses a decision file and keeps only the requested tickers, in file order.
pub fn parse_decisions(json: &str, tickers: &[String]) -> anyhow::Result<DecisionBatch> {
    let mut batch = serde_json::from_str::<DecisionFile>(json)
        .context("decision file is not a ticker -> decision map")?
        .into_batch();

    if !tickers.is_empty() {
        for (ticker, _) in batch.iter().filter(|(t, _)| !tickers.iter().any(|k| k == t)) {
            tracing::warn!(%ticker, "Ignoring decision for a ticker outside the session");
        }
        batch.retain(|t| tickers.iter().any(|k| k == t));
    }
    Ok(batch)
}

/// Identifies one version of the decision file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileVersion {
    modified: Option<SystemTime>,
    digest: [u8; 32],
}

/// Reads the batch from a JSON file that the analysis step rewrites each cycle.
///
/// Each version of the file is consumed once. Until the file is rewritten,
/// later reads return an empty batch.
pub struct JsonFileDecisionSource {
    path: PathBuf,
    consumed: Mutex<Option<FileVersion>>,
}

impl JsonFileDecisionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            consumed: Mutex::new(None),
        }
    }
}

#[async_trait]
impl DecisionSource for JsonFileDecisionSource {
    async fn decisions(&self, tickers: &[String]) -> anyhow::Result<DecisionBatch> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No decision file yet, nothing to do");
                return Ok(DecisionBatch::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()));
            }
        };
        let modified = tokio::fs::metadata(&self.path)
            .await
            .ok()
            .and_then(|meta| meta.modified().ok());
        let version = FileVersion {
            modified,
            digest: Sha256::digest(json.as_bytes()).into(),
        };

        let mut consumed = self.consumed.lock().await;
        if consumed.as_ref() == Some(&version) {
            tracing::debug!(path = %self.path.display(), "Decision file unchanged since last cycle");
            return Ok(DecisionBatch::new());
        }

        let batch = parse_decisions(&json, tickers)
            .with_context(|| format!("in {}", self.path.display()))?;
        *consumed = Some(version);
        Ok(batch)
    }
}
