// src/fs/mock.rs

use super::{normalize_path, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    /// File contents plus the logical clock tick of the last write.
    File { content: Vec<u8>, mtime: u64 },
    Dir,
}

#[derive(Debug, Default)]
struct MockState {
    entries: BTreeMap<PathBuf, MockEntry>,
    clock: u64,
}

/// In-memory filesystem.
///
/// Modification times come from a logical clock that advances on every
/// write, so "written later" always means "strictly newer" without sleeping.
/// Paths are normalised on the way in, so `./runs/x` and `runs/x` name the
/// same entry.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        // Ensure root exists
        fs.state
            .lock()
            .unwrap()
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir);
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize_path(path.as_ref());
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let mtime = state.clock;
        ensure_parents(&mut state.entries, &path);
        state.entries.insert(
            path,
            MockEntry::File {
                content: content.into(),
                mtime,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize_path(path.as_ref());
        let mut state = self.state.lock().unwrap();
        ensure_parents(&mut state.entries, &path);
        state.entries.entry(path).or_insert(MockEntry::Dir);
    }

    /// Bump the modification time of an existing file without changing it.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let path = normalize_path(path.as_ref());
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let now = state.clock;
        if let Some(MockEntry::File { mtime, .. }) = state.entries.get_mut(&path) {
            *mtime = now;
        }
    }

    /// All file paths currently stored, in sorted order.
    pub fn files(&self) -> Vec<PathBuf> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File { .. }))
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn with_file<T>(&self, path: &Path, f: impl FnOnce(&Vec<u8>, u64) -> T) -> Result<T> {
        let path = normalize_path(path);
        let state = self.state.lock().unwrap();
        match state.entries.get(&path) {
            Some(MockEntry::File { content, mtime }) => Ok(f(content, *mtime)),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Some(PathBuf::from(".")),
        Some(p) => Some(p.to_path_buf()),
        None => None,
    }
}

fn ensure_parents(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    let mut current = parent_of(path);
    while let Some(dir) = current {
        if dir == path {
            break;
        }
        let next = if dir.as_os_str() == "." {
            None
        } else {
            parent_of(&dir)
        };
        entries.entry(dir).or_insert(MockEntry::Dir);
        current = next;
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.with_file(path, |content, _| String::from_utf8(content.clone()))?
            .map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let content = self.with_file(path, |content, _| content.clone())?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.is_dir(path) {
            return Err(anyhow!("Is a directory: {:?}", path));
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.entries.contains_key(&normalize_path(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(
            state.entries.get(&normalize_path(path)),
            Some(MockEntry::File { .. })
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(&normalize_path(path)), Some(MockEntry::Dir))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let tick = self.with_file(path, |_, mtime| mtime)?;
        Ok(SystemTime::UNIX_EPOCH + Duration::from_secs(tick))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.is_file(path) {
            return Err(anyhow!("Is a file: {:?}", path));
        }
        self.add_dir(path);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let path = normalize_path(path);
        let mut state = self.state.lock().unwrap();
        match state.entries.get(&path) {
            Some(MockEntry::File { .. }) => {
                state.entries.remove(&path);
                Ok(())
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize_path(path);
        let mut state = self.state.lock().unwrap();
        if !matches!(state.entries.get(&path), Some(MockEntry::Dir)) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        state.entries.retain(|p, _| !p.starts_with(&path));
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let path = normalize_path(path);
        let state = self.state.lock().unwrap();
        match state.entries.get(&path) {
            Some(MockEntry::Dir) => Ok(state
                .entries
                .keys()
                .filter(|p| **p != path && parent_of(p).as_deref() == Some(path.as_path()))
                .cloned()
                .collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
