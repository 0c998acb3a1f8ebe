// ABOUTME: Entry-name glob patterns for files that installs and backups must leave alone.
// ABOUTME: Wraps `glob::Pattern`; a pattern names one path component, never a path.

use glob::Pattern;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExcludePatternError {
    #[error("exclude pattern cannot be empty")]
    Empty,

    #[error("exclude pattern would match every entry: {0}")]
    MatchesEverything(String),

    #[error("exclude pattern cannot contain '/': {0}")]
    ContainsSeparator(String),

    #[error("invalid exclude pattern {pattern}: {reason}")]
    Invalid { pattern: String, reason: String },
}

/// A glob matched against a single directory entry name, e.g. `node_modules`,
/// `*.log`, `.env.*.local` or `*.log.[0-9]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludePattern(Pattern);

impl ExcludePattern {
    pub fn parse(pattern: &str) -> Result<Self, ExcludePatternError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ExcludePatternError::Empty);
        }
        if pattern.chars().all(|c| c == '*') {
            return Err(ExcludePatternError::MatchesEverything(pattern.to_string()));
        }
        if pattern.contains('/') {
            return Err(ExcludePatternError::ContainsSeparator(pattern.to_string()));
        }

        Pattern::new(pattern)
            .map(ExcludePattern)
            .map_err(|e| ExcludePatternError::Invalid {
                pattern: pattern.to_string(),
                reason: e.msg.to_string(),
            })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.matches(name)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// True when any pattern in `patterns` matches `name`.
pub fn is_excluded(patterns: &[ExcludePattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

impl FromStr for ExcludePattern {
    type Err = ExcludePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExcludePattern::parse(s)
    }
}

impl fmt::Display for ExcludePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExcludePattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ExcludePattern::parse(&s).map_err(serde::de::Error::custom)
    }
}
