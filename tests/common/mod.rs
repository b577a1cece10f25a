#![allow(dead_code)]

use std::path::Path;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Names in `names` that start with `prefix`.
pub fn with_prefix<'a>(names: &'a [String], prefix: &str) -> Vec<&'a str> {
    names
        .iter()
        .filter(|n| n.starts_with(prefix))
        .map(String::as_str)
        .collect()
}

/// `path` as a `&Path`, for readable assertions on recorded invocations.
pub fn p(path: &str) -> &Path {
    Path::new(path)
}
