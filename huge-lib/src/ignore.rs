//! The ignore engine (`spec.md` §4.2).
//!
//! Loads `.hugeignore` as a list of compiled regular expressions, one per
//! non-blank, non-comment line (`#` introduces a comment, stripped before
//! compiling), grounded on `original_source/huge/repo/stage.py`'s
//! `get_ignore_patterns`.

use std::path::Path;

use regex::Regex;

use crate::Result;

/// A compiled ignore list. A path is ignored if any pattern matches the
/// full path (not a substring search).
pub struct IgnoreEngine {
    patterns: Vec<Regex>,
}

impl IgnoreEngine {
    /// An ignore engine that matches nothing.
    pub fn empty() -> Self {
        Self { patterns: Vec::new() }
    }

    /// Load the ignore file at `ignore_path`, if it exists.
    pub fn load(ignore_path: &Path) -> Result<Self> {
        if !ignore_path.is_file() {
            return Ok(Self::empty());
        }
        let contents = std::fs::read_to_string(ignore_path)?;
        let lines = contents
            .lines()
            .map(|line| strip_comment(line).trim().to_string())
            .filter(|line| !line.is_empty());
        Self::from_patterns(lines.collect())
    }

    /// Build an ignore engine directly from a list of pattern strings
    /// (comments and blank lines already stripped). Invalid patterns are
    /// reported as I/O errors via `regex`'s own error message.
    pub fn from_patterns(patterns: Vec<String>) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, format!("invalid ignore pattern {pattern:?}: {e}"))
            })?;
            compiled.push(re);
        }
        Ok(Self { patterns: compiled })
    }

    /// Returns `true` if `path` matches any pattern.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }
}

fn strip_comment(line: &str) -> &str {
    match line.split_once('#') {
        Some((before, _)) => before,
        None => line,
    }
}
