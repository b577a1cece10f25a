// src/resolve/mod.rs

//! Transitive file dependencies of a simulator run file.
//!
//! Run files (`*.fst`) and module inputs (`*.dat`) name the files they load
//! on lines that start with a quoted path. Anything quoted that ends in a
//! data, library or turbulence extension is a dependency; data files are
//! scanned again, everything else ends the branch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{PipelineError, Result};
use crate::fs::{normalize_path, FileSystem};

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^"([^"]+\.(dat|dll|bts))".*"#).expect("reference pattern is valid")
});

/// Extensions whose contents are scanned for further references.
const SCANNABLE_EXTENSIONS: &[&str] = &["dat", "fst"];

pub fn is_scannable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCANNABLE_EXTENSIONS.contains(&ext))
}

/// Files referenced directly by `file`, resolved against its directory.
///
/// Returns an empty list for files that are not scannable.
pub fn direct_references(fs: &dyn FileSystem, file: &Path) -> Result<Vec<PathBuf>> {
    if !is_scannable(file) {
        return Ok(Vec::new());
    }

    let text = fs.read_to_string(file)?;
    let base = file.parent().unwrap_or_else(|| Path::new("."));

    Ok(REFERENCE
        .captures_iter(&text)
        .map(|caps| normalize_path(&base.join(&caps[1])))
        .collect())
}

/// A file being expanded, with the position of the next reference to visit.
struct Frame {
    path: PathBuf,
    refs: Vec<PathBuf>,
    next: usize,
}

impl Frame {
    fn open(fs: &dyn FileSystem, path: PathBuf) -> Result<Self> {
        let refs = direct_references(fs, &path)?;
        Ok(Self { path, refs, next: 0 })
    }

    fn next_ref(&mut self) -> Option<PathBuf> {
        let r = self.refs.get(self.next).cloned();
        self.next += 1;
        r
    }
}

/// Every file `run_file` depends on, transitively, in discovery order and
/// without duplicates. `run_file` itself is not included.
///
/// Shared dependencies (two modules loading the same table) are fine; a file
/// that is reachable from itself is reported as
/// [`PipelineError::DependencyCycle`]. A referenced data file that does not
/// exist is still returned, but cannot be scanned further.
pub fn resolve_dependencies(fs: &dyn FileSystem, run_file: &Path) -> Result<Vec<PathBuf>> {
    let root = normalize_path(run_file);

    let mut deps = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut on_path: HashSet<PathBuf> = HashSet::new();
    let mut stack = vec![Frame::open(fs, root.clone())?];
    on_path.insert(root);

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };

        let Some(child) = frame.next_ref() else {
            if let Some(done) = stack.pop() {
                on_path.remove(&done.path);
            }
            continue;
        };

        if on_path.contains(&child) {
            let chain = stack
                .iter()
                .map(|f| f.path.display().to_string())
                .chain(std::iter::once(child.display().to_string()))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(PipelineError::DependencyCycle(chain));
        }

        if !seen.insert(child.clone()) {
            continue;
        }
        deps.push(child.clone());

        if !is_scannable(&child) {
            continue;
        }
        if !fs.is_file(&child) {
            warn!(path = ?child, "referenced input file does not exist; not scanning it");
            continue;
        }

        on_path.insert(child.clone());
        stack.push(Frame::open(fs, child)?);
    }

    debug!(run_file = ?run_file, deps = deps.len(), "resolved run file dependencies");
    Ok(deps)
}
