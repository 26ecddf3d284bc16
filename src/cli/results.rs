//! Results listing command

use clap::Args;
use std::path::PathBuf;

use crate::config::Config;
use crate::store::{JsonFileStore, ResultStore};

#[derive(Args, Debug)]
pub struct ResultsArgs {
    /// Strategy id to list results for
    #[arg(long, default_value = "sma-crossover")]
    pub strategy: String,

    /// Directory the results were persisted into
    #[arg(long, default_value = "./results")]
    pub dir: PathBuf,

    /// Maximum number of results to show
    #[arg(long, default_value = "10")]
    pub limit: usize,
}

impl ResultsArgs {
    pub async fn execute(&self, _config: &Config) -> anyhow::Result<()> {
        let store = JsonFileStore::new(self.dir.clone());
        let results = store.list(&self.strategy, self.limit).await?;

        if results.is_empty() {
            println!("No stored results for '{}' in {}", self.strategy, self.dir.display());
            return Ok(());
        }

        println!(
            "{:<16} {:<10} {:>10} {:>8} {:>7}",
            "STRATEGY", "MARKET", "PNL", "SHARPE", "TRADES"
        );
        for result in &results {
            println!(
                "{:<16} {:<10} {:>10.2} {:>8.2} {:>7}",
                result.strategy_id,
                result.market,
                result.summary.total_pnl,
                result.summary.sharpe_ratio,
                result.summary.total_trades,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_on_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let args = ResultsArgs {
            strategy: "momentum".to_string(),
            dir: dir.path().to_path_buf(),
            limit: 10,
        };
        assert!(args.execute(&Config::default()).await.is_ok());
    }
}
