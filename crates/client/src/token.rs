//! Bearer tokens and the stores that keep them between runs.

use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use snafu::ResultExt;
use tokio::sync::Mutex;

use crate::error::{self, Error};

/// An opaque bearer credential issued by the control plane.
///
/// Expiry is decided by the server; a token is trusted until a request using
/// it is answered with `401 Unauthorized`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

    pub fn as_str(&self) -> &str { &self.0 }

    pub(crate) fn bearer(&self) -> String { format!("Bearer {}", self.0) }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Token(***)") }
}

/// Persistence backend for the cached token.
///
/// Implementations hold at most one token; `save` replaces whatever was
/// stored before.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the cached token, or `None` when nothing has been cached yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend exists but cannot be read.
    async fn load(&self) -> Result<Option<Token>, Error>;

    /// Replaces the cached token.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be written.
    async fn save(&self, token: &Token) -> Result<(), Error>;
}

/// Keeps the token as plain text in a single file, `~/.wayne_token` by
/// default.
///
/// The file holds exactly the token string. There is no locking, so
/// concurrent runs may overwrite each other's token.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<Token>, Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let content = content.trim();
                Ok((!content.is_empty()).then(|| Token::new(content)))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::ReadTokenCache { path: self.path.clone(), source }),
        }
    }

    async fn save(&self, token: &Token) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context(error::WriteTokenCacheSnafu { path: self.path.clone() })?;
        }
        tokio::fs::write(&self.path, token.as_str())
            .await
            .context(error::WriteTokenCacheSnafu { path: self.path.clone() })
    }
}

/// Keeps the token in memory only; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<Token>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: Token) -> Self { Self { token: Mutex::new(Some(token)) } }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<Token>, Error> { Ok(self.token.lock().await.clone()) }

    async fn save(&self, token: &Token) -> Result<(), Error> {
        *self.token.lock().await = Some(token.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(".wayne_token"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_holds_bare_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".wayne_token");
        let store = FileTokenStore::new(&path);

        store.save(&Token::new("abc.def")).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc.def");
        assert_eq!(store.load().await.unwrap(), Some(Token::new("abc.def")));

        store.save(&Token::new("ghi")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(Token::new("ghi")));
    }

    #[tokio::test]
    async fn test_blank_file_is_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".wayne_token");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(FileTokenStore::new(path).load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.load().await.unwrap(), None);
        store.save(&Token::new("fresh")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(Token::new("fresh")));
    }

    #[test]
    fn test_debug_hides_token() {
        assert_eq!(format!("{:?}", Token::new("abc")), "Token(***)");
    }
}
