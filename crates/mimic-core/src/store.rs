//! Write-back of the configuration document.
//!
//! [`ConfigStore`] remembers where the document came from and in which
//! format, and rewrites the whole file on every save. Writes are not
//! transactional: a crash between an in-memory mutation and the write
//! leaves the previous file on disk.

use std::path::{Path, PathBuf};

use mimic_types::Config;

use crate::config::{self, ConfigError, ConfigFormat};

/// Errors that can occur when persisting the configuration document.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The document could not be encoded.
    #[error("failed to encode config: {0}")]
    Encode(#[from] ConfigError),

    /// The file could not be written.
    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        /// Target file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The file a configuration document was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
    format: ConfigFormat,
}

impl ConfigStore {
    /// Create a store for `path`, deriving the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for unknown extensions.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let format = ConfigFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The on-disk format.
    pub const fn format(&self) -> ConfigFormat {
        self.format
    }

    /// Read and validate the document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable or invalid.
    pub fn load(&self) -> Result<Config, ConfigError> {
        config::load(&self.path)
    }

    /// Replace the file's contents with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if encoding or writing fails.
    pub async fn save(&self, config: &Config) -> Result<(), PersistError> {
        let text = config::render(config, self.format)?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|source| PersistError::Write {
                path: self.path.clone(),
                source,
            })
    }
}
