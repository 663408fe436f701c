pub mod cli;
pub mod csv_export;
pub mod email_content;
pub mod error;
pub mod export;
pub mod gmail_api;
pub mod token_store;
pub mod types;
