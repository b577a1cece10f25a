// src/rewrite/mod.rs

//! Copy-with-substitution for simulator input files.
//!
//! Templates are plain text with a fixed leading value followed by a field
//! label on the same line. A [`SubstitutionRule`] rewrites such a value and
//! states how many times its pattern must match; any other count means the
//! template no longer looks the way the rule expects, and the copy is
//! rejected before anything is written.

pub mod rules;

use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

/// A `(pattern, replacement, expected match count)` triple.
///
/// `replacement` uses `regex` replacement syntax, so `${1}` refers to the
/// first capture group.
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    pattern: Regex,
    replacement: String,
    expected: Option<usize>,
}

impl SubstitutionRule {
    /// Rule that must match exactly `expected` times.
    pub fn new(pattern: Regex, replacement: impl Into<String>, expected: usize) -> Self {
        Self {
            pattern,
            replacement: replacement.into(),
            expected: Some(expected),
        }
    }

    /// Rule that replaces every match and accepts any count, including zero.
    pub fn unchecked(pattern: Regex, replacement: impl Into<String>) -> Self {
        Self {
            pattern,
            replacement: replacement.into(),
            expected: None,
        }
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn expected(&self) -> Option<usize> {
        self.expected
    }

    /// Apply the rule to `text`. `source` is only used for error reporting.
    pub fn apply(&self, text: &str, source: &Path) -> Result<String> {
        let found = self.pattern.find_iter(text).count();

        if let Some(expected) = self.expected {
            if found != expected {
                return Err(PipelineError::TemplateDrift {
                    file: source.to_path_buf(),
                    pattern: self.pattern.as_str().to_string(),
                    found,
                    expected,
                });
            }
        }

        Ok(self
            .pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned())
    }
}

/// Apply `rules` in order to `text`.
pub fn rewrite_text(text: &str, rules: &[SubstitutionRule], source: &Path) -> Result<String> {
    let mut result = text.to_string();
    for rule in rules {
        result = rule.apply(&result, source)?;
    }
    Ok(result)
}

/// Copy `source` to `target`, applying `rules` on the way.
///
/// The target's parent directories are created as needed and an existing
/// target is overwritten. On a rule failure nothing is written.
pub fn copy_with_substitutions(
    fs: &dyn FileSystem,
    source: &Path,
    target: &Path,
    rules: &[SubstitutionRule],
) -> Result<()> {
    let text = fs.read_to_string(source)?;
    let result = rewrite_text(&text, rules, source)?;
    fs.write(target, result.as_bytes())?;

    debug!(
        source = ?source,
        target = ?target,
        rules = rules.len(),
        "copied input file"
    );
    Ok(())
}
