// src/tasks/scan.rs

//! Directory enumeration for the task generators.
//!
//! Results are sorted so task lists and logs are stable between runs. A
//! directory that does not exist enumerates as empty.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use tracing::debug;

use crate::fs::{file_name_str, FileSystem};

fn entries(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    if !fs.is_dir(dir) {
        debug!(dir = ?dir, "directory missing; nothing to enumerate");
        return Ok(Vec::new());
    }
    let mut entries = fs.read_dir(dir)?;
    entries.sort();
    Ok(entries)
}

/// Immediate subdirectories of `dir`.
pub fn subdirs(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(entries(fs, dir)?
        .into_iter()
        .filter(|p| fs.is_dir(p))
        .collect())
}

/// Regular files directly inside `dir`.
pub fn files(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(entries(fs, dir)?
        .into_iter()
        .filter(|p| fs.is_file(p))
        .collect())
}

fn file_name_matcher(pattern: &str) -> Result<GlobMatcher> {
    let glob = Glob::new(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Files directly inside `dir` whose file name matches `pattern`
/// (e.g. `wind*.fst`).
pub fn glob_files(fs: &dyn FileSystem, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = file_name_matcher(pattern)?;
    Ok(files(fs, dir)?
        .into_iter()
        .filter(|p| matcher.is_match(file_name_str(p)))
        .collect())
}

/// Files anywhere below `root` whose file name matches `pattern`.
pub fn find_recursive(fs: &dyn FileSystem, root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = file_name_matcher(pattern)?;
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in entries(fs, &dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) && matcher.is_match(file_name_str(&path)) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}
