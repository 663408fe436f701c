use thiserror::Error;

use crate::token_store::TokenStoreError;

/// Errors surfaced by the Gmail client and the OAuth flow.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Gmail rejected our credentials (HTTP 401/403). The stored token is
    /// stale or revoked and the operator has to re-consent.
    #[error("authentication error (HTTP {status}); delete the stored token file and re-run to re-authenticate")]
    AuthRequired { status: u16 },

    #[error("Gmail API returned HTTP {status} while {context}")]
    Api { status: u16, context: String },

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("could not read authorization code: {0}")]
    CodePrompt(#[source] std::io::Error),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    /// True for errors that mean the operator has to redo the consent flow.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ExportError::AuthRequired { .. })
    }
}
