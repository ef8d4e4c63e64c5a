use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Durable string key-value storage for credentials.
///
/// An absent key is `Ok(None)`, which is distinct from a key holding an
/// empty string.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up `key`, returning `Ok(None)` when it was never stored.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores a single value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Writes all entries as one update; readers never see a subset.
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError>;
}

/// Credential store backed by a dotenv-style file.
///
/// The file is re-read on every `get`, so it stays the single source of
/// truth across processes run one after another. Writes rewrite the whole
/// file through a temporary sibling and a rename, keeping every line that
/// is not being updated.
pub struct EnvFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl EnvFileStore {
    /// Creates a store over `path`. Nothing is read or created until the
    /// first `get` or `set`; a missing file reads as an empty store.
    ///
    /// # Example
    ///
    /// ```
    /// let store = EnvFileStore::new(termify::config::store_path());
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        let path = self.path.clone();
        let parsed = tokio::task::spawn_blocking(move || -> Result<_, StoreError> {
            let iter = match dotenvy::from_path_iter(&path) {
                Ok(iter) => iter,
                Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    return Ok(HashMap::new());
                }
                Err(e) => return Err(e.into()),
            };

            let mut values = HashMap::new();
            for item in iter {
                let (key, value) = item?;
                values.insert(key, value);
            }
            Ok(values)
        })
        .await
        .map_err(|e| StoreError::Parse(e.to_string()))??;

        Ok(parsed)
    }

    async fn read_lines(&self) -> Result<String, StoreError> {
        match async_fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn persist(&self, content: String) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        async_fs::write(&tmp, content).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for EnvFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.load().await?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set_many(&[(key, value)]).await
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            validate_entry(key, value)?;
        }

        let _guard = self.write_lock.lock().await;
        let existing = self.read_lines().await?;
        self.persist(rewrite_env(&existing, entries)).await
    }
}

/// Credential store kept in memory, for embedding and tests.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `values`.
    ///
    /// # Example
    ///
    /// ```
    /// let store = MemoryStore::with_values([("TFY_CLIENT_ID", "abc")]);
    /// ```
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Copy of everything stored so far.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.values.lock().await.clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

fn validate_entry(key: &str, value: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains(['=', '\n', ' ']) {
        return Err(StoreError::InvalidValue {
            key: key.to_string(),
            reason: "keys must be non-empty and contain no '=', spaces or newlines",
        });
    }
    // single-quoted values are taken literally, so only these two break the format
    if value.contains(['\'', '\n']) {
        return Err(StoreError::InvalidValue {
            key: key.to_string(),
            reason: "values must not contain single quotes or newlines",
        });
    }
    Ok(())
}

/// Replaces or appends `KEY='value'` lines, leaving all other lines intact.
fn rewrite_env(existing: &str, entries: &[(&str, &str)]) -> String {
    let mut pending: Vec<(&str, &str)> = entries.to_vec();
    let mut out = String::with_capacity(existing.len() + 64);

    for line in existing.lines() {
        match line_key(line) {
            Some(key) if entries.iter().any(|(k, _)| *k == key) => {
                // a repeated key in the file is dropped so the new value wins
                if let Some(idx) = pending.iter().position(|(k, _)| *k == key) {
                    let (key, value) = pending.remove(idx);
                    out.push_str(&format!("{key}='{value}'\n"));
                }
            }
            _ => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    for (key, value) in pending {
        out.push_str(&format!("{key}='{value}'\n"));
    }
    out
}

fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, _) = trimmed.split_once('=')?;
    Some(key.trim())
}
