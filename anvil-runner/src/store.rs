//! Append-only JSONL result store.
//!
//! One `BacktestResult` per line. Re-running a config appends a new line
//! with the same deterministic ID; reads resolve an ID to its last
//! occurrence, so the newest run wins without any in-place rewriting.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::ports::{ResultRepository, StoreError};
use crate::result::{BacktestResult, BacktestSummary};

pub struct JsonlResultStore {
    path: PathBuf,
}

impl JsonlResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the backing file in bytes; 0 if it does not exist yet.
    pub fn file_size_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// All stored results in append order. Malformed lines are skipped
    /// with a warning rather than poisoning the whole file.
    pub fn read_all(&self) -> Result<Vec<BacktestResult>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let mut out = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BacktestResult>(&line) {
                Ok(result) => out.push(result),
                Err(err) => {
                    warn!(path = %self.path.display(), lineno, %err, "skipping malformed result line");
                }
            }
        }
        Ok(out)
    }
}

impl ResultRepository for JsonlResultStore {
    fn save(&self, result: &BacktestResult) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(result)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<BacktestResult>, StoreError> {
        // Last occurrence wins
        Ok(self.read_all()?.into_iter().rev().find(|r| r.id == id))
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<BacktestSummary>, StoreError> {
        let all = self.read_all()?;
        Ok(all.iter().rev().take(limit).map(|r| r.summary()).collect())
    }
}
