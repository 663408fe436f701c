//! Gmail API module split into logical submodules
//!
//! - auth: OAuth2 session acquisition (stored token, refresh, interactive consent)
//! - messages: listing sent-message ids and fetching full messages

pub mod auth;
pub mod messages;

// Re-export the surface the orchestrator and binary use
pub use auth::{authorize, CodeProvider, GoogleTokenExchange, Session, StdinCodeProvider, TokenExchange};
pub use messages::{GmailClient, MailApi, PAGE_SIZE};

#[cfg(test)]
pub use messages::MockMailApi;
