//! Session token commands.
//!
//! The cart client decides its authenticated/anonymous branch purely from
//! token presence, so `login` and `logout` are just token-store writes. Run
//! `mercato cart sync` after logging in to migrate locally saved items.
//!
//! # Environment Variables
//!
//! - `MERCATO_DATA_DIR` - Directory for the token file (default: `.mercato`)

use mercato_client::{ClientConfig, ConfigError, TokenStore};
use thiserror::Error;

/// Errors from auth commands.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Token file could not be written.
    #[error("Token store error: {0}")]
    Io(#[from] std::io::Error),

    /// Empty token.
    #[error("Token must not be empty")]
    EmptyToken,
}

/// Store a session token.
#[allow(clippy::print_stdout)]
pub fn login(token: &str) -> Result<(), AuthError> {
    if token.trim().is_empty() {
        return Err(AuthError::EmptyToken);
    }

    let config = ClientConfig::from_env()?;
    TokenStore::new(&config.data_dir).set_token(token.trim())?;

    println!("Logged in. Run 'mercato cart sync' to move saved items into your cart.");
    Ok(())
}

/// Remove the stored session token.
#[allow(clippy::print_stdout)]
pub fn logout() -> Result<(), AuthError> {
    let config = ClientConfig::from_env()?;
    TokenStore::new(&config.data_dir).remove_token();

    println!("Logged out.");
    Ok(())
}
