use std::str::FromStr;
use serde::Deserialize;

/// How the executor decides whether a task's targets are up to date.
///
/// - `Mtime`: a task is stale when a target is missing or any file dependency
///   is newer than the oldest target (default behaviour).
/// - `Hash`: a task is stale when a target is missing or the content hash of
///   its file dependencies differs from the one recorded after its last
///   successful execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    Mtime,
    Hash,
}

impl Default for CheckMode {
    fn default() -> Self {
        CheckMode::Mtime
    }
}

impl FromStr for CheckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mtime" => Ok(CheckMode::Mtime),
            "hash" => Ok(CheckMode::Hash),
            other => Err(format!(
                "invalid check mode: {other} (expected \"mtime\" or \"hash\")"
            )),
        }
    }
}

/// Mode for storing task hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashStorageMode {
    /// Store hashes in a file (`.fastpipe/hashes`).
    File,
    /// Store hashes in memory only (lost on restart).
    Memory,
}

impl Default for HashStorageMode {
    fn default() -> Self {
        HashStorageMode::File
    }
}
