// src/check/hash.rs

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::tasks::TaskName;

/// Relative path (from the project root) to the hashes file.
pub const HASH_FILE_PATH: &str = ".fastpipe/hashes";

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute a deterministic hash over the contents of the given files.
///
/// Order of `paths` does not matter; they are sorted before hashing. Each
/// path takes part in the hash too, so renaming a dependency changes it.
pub fn compute_hash_for_paths<I, P>(fs: &dyn FileSystem, paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths_vec: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    paths_vec.sort();
    paths_vec.dedup();

    let mut hasher = Hasher::new();
    for path in paths_vec {
        debug!(path = ?path, "hashing file");
        let file_hash = compute_file_hash(fs, &path)?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(file_hash.as_bytes());
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}

/// Abstract storage for task hashes.
pub trait HashStore: Send + Sync {
    fn load(&self, task: &str) -> Result<Option<String>>;
    fn save(&mut self, task: &str, hash: &str) -> Result<()>;
    fn remove(&mut self, task: &str) -> Result<()>;
    /// Remove hashes for tasks that are not in the `active_tasks` list.
    fn prune(&mut self, active_tasks: &[&str]) -> Result<()>;
}

/// Stores hashes in `<root>/.fastpipe/hashes`, one `name hash` pair per line.
pub struct FileHashStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileHashStore {
    pub fn new(fs: Arc<dyn FileSystem>, root: &Path) -> Self {
        Self {
            fs,
            path: root.join(HASH_FILE_PATH),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_all(&self) -> Result<BTreeMap<TaskName, String>> {
        if !self.fs.is_file(&self.path) {
            return Ok(BTreeMap::new());
        }

        let text = self
            .fs
            .read_to_string(&self.path)
            .with_context(|| format!("reading hash file at {:?}", self.path))?;

        let mut map = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim_end();
            if line.trim_start().is_empty() {
                continue;
            }
            // Task names may contain spaces; hashes never do.
            if let Some((name, hash)) = line.rsplit_once(char::is_whitespace) {
                map.insert(name.to_string(), hash.to_string());
            }
        }
        Ok(map)
    }

    fn save_all(&self, map: &BTreeMap<TaskName, String>) -> Result<()> {
        let mut out = String::new();
        for (name, hash) in map {
            out.push_str(name);
            out.push(' ');
            out.push_str(hash);
            out.push('\n');
        }
        self.fs
            .write(&self.path, out.as_bytes())
            .with_context(|| format!("writing hash file at {:?}", self.path))
    }
}

impl HashStore for FileHashStore {
    fn load(&self, task: &str) -> Result<Option<String>> {
        Ok(self.load_all()?.get(task).cloned())
    }

    fn save(&mut self, task: &str, hash: &str) -> Result<()> {
        let mut map = self.load_all()?;
        map.insert(task.to_string(), hash.to_string());
        self.save_all(&map)?;
        debug!(task = %task, hash = %hash, "stored task hash (file)");
        Ok(())
    }

    fn remove(&mut self, task: &str) -> Result<()> {
        let mut map = self.load_all()?;
        if map.remove(task).is_some() {
            self.save_all(&map)?;
        }
        Ok(())
    }

    fn prune(&mut self, active_tasks: &[&str]) -> Result<()> {
        let mut map = self.load_all()?;
        let initial_len = map.len();
        map.retain(|k, _| active_tasks.contains(&k.as_str()));

        if map.len() < initial_len {
            self.save_all(&map)?;
            info!(
                removed = initial_len - map.len(),
                "pruned stale task hashes (file)"
            );
        }
        Ok(())
    }
}

/// Stores hashes in memory only.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: BTreeMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, task: &str) -> Result<Option<String>> {
        Ok(self.map.get(task).cloned())
    }

    fn save(&mut self, task: &str, hash: &str) -> Result<()> {
        self.map.insert(task.to_string(), hash.to_string());
        debug!(task = %task, hash = %hash, "stored task hash (memory)");
        Ok(())
    }

    fn remove(&mut self, task: &str) -> Result<()> {
        self.map.remove(task);
        Ok(())
    }

    fn prune(&mut self, active_tasks: &[&str]) -> Result<()> {
        let initial_len = self.map.len();
        self.map.retain(|k, _| active_tasks.contains(&k.as_str()));
        if self.map.len() < initial_len {
            info!(
                removed = initial_len - self.map.len(),
                "pruned stale task hashes (memory)"
            );
        }
        Ok(())
    }
}
