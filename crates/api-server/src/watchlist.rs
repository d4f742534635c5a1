//! Watchlist persisted as a JSON array of symbols.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const SEED: &[&str] = &["AAPL", "MSFT"];

pub struct WatchlistStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sorted unique symbols. Seeds the file on first use; a corrupt or
    /// unreadable file reads as empty.
    pub async fn load(&self) -> Vec<String> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn add(&self, symbol: &str) -> io::Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut symbols = self.read().await;
        symbols.push(symbol.to_string());
        self.write(&symbols).await
    }

    pub async fn remove(&self, symbol: &str) -> io::Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let target = normalize(symbol);
        let symbols: Vec<String> = self
            .read()
            .await
            .into_iter()
            .filter(|s| Some(s) != target.as_ref())
            .collect();
        self.write(&symbols).await
    }

    async fn read(&self) -> Vec<String> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            let seed: Vec<String> = SEED.iter().map(|s| s.to_string()).collect();
            if let Err(e) = self.write(&seed).await {
                tracing::warn!("Failed to seed watchlist {}: {}", self.path.display(), e);
                return Vec::new();
            }
        }

        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to read watchlist {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => canonical(values.iter().map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })),
            Err(e) => {
                tracing::warn!("Corrupt watchlist {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    async fn write(&self, symbols: &[String]) -> io::Result<Vec<String>> {
        let symbols = canonical(symbols.iter().cloned());
        let body = serde_json::to_string_pretty(&symbols)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(symbols)
    }
}

fn normalize(symbol: &str) -> Option<String> {
    let s = symbol.trim().to_uppercase();
    (!s.is_empty()).then_some(s)
}

fn canonical(symbols: impl Iterator<Item = String>) -> Vec<String> {
    symbols
        .filter_map(|s| normalize(&s))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
