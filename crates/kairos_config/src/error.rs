//! Configuration errors.

use std::path::PathBuf;

/// Why a `kairos.toml` could not be turned into a usable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        /// The file that was opened.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid TOML for [`KairosConfig`](crate::KairosConfig).
    #[error("malformed kairos.toml: {0}")]
    Malformed(String),

    /// A setting is outside its allowed range.
    #[error("invalid setting {key}: {reason}")]
    Invalid {
        /// Dotted key such as `criticality.max`.
        key: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
