// ABOUTME: Validated application name used for locks, backups, and supervisor lookups.
// ABOUTME: Restricts names to characters that are safe in file names and unit names.

use std::fmt;
use thiserror::Error;

/// Longest accepted application name.
pub const MAX_APP_NAME_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppNameError {
    #[error("app name cannot be empty")]
    Empty,

    #[error("app name exceeds maximum length of 64 characters")]
    TooLong,

    #[error("app name cannot start with '{0}'")]
    InvalidStart(char),

    #[error("invalid character in app name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppName(String);

impl AppName {
    pub fn new(value: &str) -> Result<Self, AppNameError> {
        if value.is_empty() {
            return Err(AppNameError::Empty);
        }

        if value.len() > MAX_APP_NAME_LEN {
            return Err(AppNameError::TooLong);
        }

        if let Some(first) = value.chars().next()
            && (first == '-' || first == '.')
        {
            return Err(AppNameError::InvalidStart(first));
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
                return Err(AppNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default systemd unit name for this application.
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.0)
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
