use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// OAuth tokens persisted between runs. Same shape the Google client
/// libraries write to token.json, so an existing file keeps working.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as epoch milliseconds.
    pub expiry_date: i64,
}

impl Credentials {
    pub fn is_expired(&self) -> bool {
        self.expiry_date < Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("no usable stored credentials")]
    NotFound,
    #[error("failed to write token file: {0}")]
    Write(#[from] std::io::Error),
    #[error("failed to serialize credentials: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loads and saves the credential file.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unparsable token file just means there is no stored
    /// session; the caller falls back to the consent flow.
    pub fn load(&self) -> Result<Credentials, TokenStoreError> {
        let raw = fs::read_to_string(&self.path).map_err(|_| TokenStoreError::NotFound)?;
        serde_json::from_str(&raw).map_err(|_| TokenStoreError::NotFound)
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), TokenStoreError> {
        let json = serde_json::to_string(credentials)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
