//! Client and user credentials read from a credentials directory.
//!
//! A credentials directory holds two JSON files:
//! - `client.json`: `{"client_id": "...", "client_secret": "..."}` (required)
//! - `user.json`: `{"application_username": "...", "application_password": "..."}`
//!   (only needed for the password grant)
//!
//! [`CredentialStore`] loads a directory once and keeps the result for the
//! lifetime of the process. Concurrent first loads of the same directory share
//! a single read; failed loads are not cached.

use crate::error::{CredentialsError, TokenError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use moka::future::Cache as MokaCache;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CLIENT_CREDENTIALS_FILE: &str = "client.json";
pub const USER_CREDENTIALS_FILE: &str = "user.json";

/// Credentials loaded from one directory. Immutable once loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Value of the `Authorization` header for HTTP Basic client authentication
    pub fn basic_auth_header(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Deserialize)]
struct ClientCredentialsFile {
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct UserCredentialsFile {
    application_username: String,
    application_password: String,
}

/// Source of credentials for a directory
#[async_trait]
pub trait CredentialsLoader: Send + Sync {
    async fn load(&self, dir: &Path) -> Result<Credentials, CredentialsError>;
}

/// Reads `client.json` and the optional `user.json` from disk
#[derive(Debug, Clone, Default)]
pub struct FileCredentialsLoader;

#[async_trait]
impl CredentialsLoader for FileCredentialsLoader {
    async fn load(&self, dir: &Path) -> Result<Credentials, CredentialsError> {
        let client: ClientCredentialsFile = read_json(&dir.join(CLIENT_CREDENTIALS_FILE)).await?;

        let user = match read_json::<UserCredentialsFile>(&dir.join(USER_CREDENTIALS_FILE)).await
        {
            Ok(user) => Some(user),
            Err(CredentialsError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Credentials {
            client_id: client.client_id,
            client_secret: client.client_secret,
            user: user.as_ref().map(|u| u.application_username.clone()),
            password: user.map(|u| u.application_password),
        })
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CredentialsError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| CredentialsError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Process-wide credentials cache keyed by directory path
#[derive(Clone)]
pub struct CredentialStore {
    cache: MokaCache<PathBuf, Arc<Credentials>>,
    loader: Arc<dyn CredentialsLoader>,
}

impl CredentialStore {
    pub fn new(loader: Arc<dyn CredentialsLoader>) -> Self {
        Self {
            cache: MokaCache::builder().build(),
            loader,
        }
    }

    /// Load the credentials of `dir`, reading them only on the first call.
    ///
    /// While a load is in flight, other callers for the same directory wait for
    /// its result instead of starting their own read.
    pub async fn load(&self, dir: &Path) -> Result<Arc<Credentials>, TokenError> {
        let key = dir.to_path_buf();
        let loader = Arc::clone(&self.loader);

        self.cache
            .try_get_with(key.clone(), async move {
                debug!("Loading credentials from {}", key.display());
                loader.load(&key).await.map(Arc::new)
            })
            .await
            .map_err(|e| TokenError::CredentialsUnavailable {
                dir: dir.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(Arc::new(FileCredentialsLoader))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub(crate) fn write_credentials(dir: &Path, with_user: bool) {
        std::fs::write(
            dir.join(CLIENT_CREDENTIALS_FILE),
            r#"{"client_id": "test-client", "client_secret": "test-secret"}"#,
        )
        .unwrap();
        if with_user {
            std::fs::write(
                dir.join(USER_CREDENTIALS_FILE),
                r#"{"application_username": "service-user",
                    "application_password": "service-pass"}"#,
            )
            .unwrap();
        }
    }

    /// Wraps the file loader, counting reads and stretching each one out
    pub(crate) struct CountingLoader {
        pub loads: AtomicUsize,
    }

    #[async_trait]
    impl CredentialsLoader for CountingLoader {
        async fn load(&self, dir: &Path) -> Result<Credentials, CredentialsError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            FileCredentialsLoader.load(dir).await
        }
    }

    #[test]
    fn test_basic_auth_header() {
        let credentials = Credentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            user: None,
            password: None,
        };
        // base64("client:secret")
        assert_eq!(credentials.basic_auth_header(), "Basic Y2xpZW50OnNlY3JldA==");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            user: Some("user".to_string()),
            password: Some("hunter2".to_string()),
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("\"secret\""));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("client"));
    }

    #[tokio::test]
    async fn test_load_client_and_user_credentials() {
        let dir = tempfile::tempdir().unwrap();
        write_credentials(dir.path(), true);

        let store = CredentialStore::default();
        let credentials = store.load(dir.path()).await.unwrap();

        assert_eq!(credentials.client_id, "test-client");
        assert_eq!(credentials.client_secret, "test-secret");
        assert_eq!(credentials.user.as_deref(), Some("service-user"));
        assert_eq!(credentials.password.as_deref(), Some("service-pass"));
    }

    #[tokio::test]
    async fn test_user_credentials_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        write_credentials(dir.path(), false);

        let credentials = CredentialStore::default().load(dir.path()).await.unwrap();
        assert_eq!(credentials.user, None);
        assert_eq!(credentials.password, None);
    }

    #[tokio::test]
    async fn test_missing_directory_is_unavailable() {
        let store = CredentialStore::default();
        let result = store.load(Path::new("/nonexistent/credentials")).await;
        assert!(matches!(
            result,
            Err(TokenError::CredentialsUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CLIENT_CREDENTIALS_FILE), "{not json").unwrap();

        let result = CredentialStore::default().load(dir.path()).await;
        match result {
            Err(TokenError::CredentialsUnavailable { reason, .. }) => {
                assert!(reason.contains("Malformed"), "unexpected reason: {reason}")
            }
            other => panic!("expected CredentialsUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::default();

        assert!(store.load(dir.path()).await.is_err());

        write_credentials(dir.path(), false);
        let credentials = store.load(dir.path()).await.unwrap();
        assert_eq!(credentials.client_id, "test-client");
    }

    #[tokio::test]
    async fn test_success_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        write_credentials(dir.path(), false);
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });
        let store = CredentialStore::new(loader.clone());

        store.load(dir.path()).await.unwrap();
        // Later edits on disk are not picked up
        std::fs::remove_file(dir.path().join(CLIENT_CREDENTIALS_FILE)).unwrap();
        store.load(dir.path()).await.unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        write_credentials(dir.path(), false);
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });
        let store = CredentialStore::new(loader.clone());

        let (first, second, third) = tokio::join!(
            store.load(dir.path()),
            store.load(dir.path()),
            store.load(dir.path())
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert!(third.is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }
}
