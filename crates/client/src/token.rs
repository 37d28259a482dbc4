//! Auth token storage.
//!
//! The cart manager derives its authenticated/anonymous branch from token
//! *presence* alone, read fresh on every operation. Validity is the commerce
//! API's concern: an expired token surfaces as an ordinary operation failure,
//! not as a distinct unauthenticated branch.

use std::path::PathBuf;

use secrecy::SecretString;
use tracing::warn;

/// File name of the token inside the data directory.
const TOKEN_FILE: &str = "auth_token";

/// File-backed auth token store.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a token store rooted at the given data directory.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(TOKEN_FILE),
        }
    }

    /// Read the stored token, if any. An empty or unreadable file counts as
    /// no token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(SecretString::from(trimmed.to_string()))
        }
    }

    /// Whether a token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Store a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the file
    /// cannot be written.
    pub fn set_token(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    /// Remove the stored token. A missing file is not an error.
    pub fn remove_token(&self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "Failed to remove auth token");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[test]
    fn test_missing_token_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path());
        assert!(store.token().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_set_and_read_token() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path());

        store.set_token("tok_123").unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.token().unwrap().expose_secret(), "tok_123");
    }

    #[test]
    fn test_blank_token_counts_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path());

        store.set_token("   \n").unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_remove_token_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path());

        store.set_token("tok_123").unwrap();
        store.remove_token();
        assert!(!store.is_authenticated());

        // Removing again is a no-op
        store.remove_token();
    }
}
