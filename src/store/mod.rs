//! Result persistence
//!
//! Stores are injected into the engine by the caller; the engine treats
//! saving as best effort and never lets a store failure fail a run.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::engine::BacktestResult;

/// Sink and index for completed backtest results
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist one result. Callers treat failures as non-fatal.
    async fn save(&self, result: &BacktestResult) -> anyhow::Result<()>;

    /// Most recent results for a strategy, up to `limit`
    async fn list(&self, strategy_id: &str, limit: usize) -> anyhow::Result<Vec<BacktestResult>>;
}

/// In-memory store for tests and ephemeral runs
pub struct MemoryResultStore {
    results: RwLock<Vec<BacktestResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self {
            results: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save(&self, result: &BacktestResult) -> anyhow::Result<()> {
        self.results.write().await.push(result.clone());
        Ok(())
    }

    async fn list(&self, strategy_id: &str, limit: usize) -> anyhow::Result<Vec<BacktestResult>> {
        let results = self.results.read().await;
        Ok(results
            .iter()
            .rev()
            .filter(|r| r.strategy_id == strategy_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// One JSON file per result under a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ResultStore for JsonFileStore {
    async fn save(&self, result: &BacktestResult) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        // The uuid lives only in the filename; result contents stay
        // deterministic
        let name = format!("{}-{}.json", result.strategy_id, Uuid::new_v4());
        let json = serde_json::to_vec_pretty(result)?;
        tokio::fs::write(self.dir.join(name), json).await?;
        Ok(())
    }

    async fn list(&self, strategy_id: &str, limit: usize) -> anyhow::Result<Vec<BacktestResult>> {
        let mut results = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(_) => return Ok(results),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<BacktestResult>(&raw) {
                Ok(result) if result.strategy_id == strategy_id => results.push(result),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable result file");
                }
            }
            if results.len() >= limit {
                break;
            }
        }
        Ok(results)
    }
}
