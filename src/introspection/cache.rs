//! Storage for introspection results, keyed by a fingerprint of the upstream
//! configuration.

use crate::errors::ComposeError;
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Hex-encoded SHA-256 of an upstream kind and its full configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of<C: Serialize>(kind: &str, configuration: &C) -> Result<Fingerprint, ComposeError> {
        let bytes = serde_json::to_vec(&(kind, configuration))?;
        Ok(Fingerprint(hex::encode(Sha256::digest(&bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait IntrospectionCache: Send + Sync {
    async fn read(&self, fingerprint: &Fingerprint) -> Result<Option<String>, ComposeError>;

    async fn write(&self, fingerprint: &Fingerprint, content: &str) -> Result<(), ComposeError>;
}

/// One JSON file per fingerprint.
///
/// Entries are written to a temporary file first and renamed into place, so
/// concurrent introspections never observe a half-written entry.
#[derive(Debug, Clone)]
pub struct FsCache {
    dir: PathBuf,
}

impl FsCache {
    pub fn new(dir: impl Into<PathBuf>) -> FsCache {
        FsCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }
}

#[async_trait]
impl IntrospectionCache for FsCache {
    async fn read(&self, fingerprint: &Fingerprint) -> Result<Option<String>, ComposeError> {
        match tokio::fs::read_to_string(self.entry_path(fingerprint)).await {
            Ok(content) => Ok(Some(content)),
            Err(ref err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, fingerprint: &Fingerprint, content: &str) -> Result<(), ComposeError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!(".{}.json.tmp", fingerprint));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, self.entry_path(fingerprint)).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<Fingerprint, String>>,
}

impl MemoryCache {
    pub fn new() -> MemoryCache {
        MemoryCache::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(fingerprint))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IntrospectionCache for MemoryCache {
    async fn read(&self, fingerprint: &Fingerprint) -> Result<Option<String>, ComposeError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ComposeError::introspection_failed("introspection cache lock poisoned"))?;
        Ok(entries.get(fingerprint).cloned())
    }

    async fn write(&self, fingerprint: &Fingerprint, content: &str) -> Result<(), ComposeError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ComposeError::introspection_failed("introspection cache lock poisoned"))?;
        entries.insert(fingerprint.clone(), content.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprints_depend_on_kind_and_configuration() {
        let a = Fingerprint::of("graphql", &vec!["https://a.example.com"]).unwrap();
        let b = Fingerprint::of("graphql", &vec!["https://b.example.com"]).unwrap();
        let c = Fingerprint::of("openapi", &vec!["https://a.example.com"]).unwrap();

        assert_eq!(a, Fingerprint::of("graphql", &vec!["https://a.example.com"]).unwrap());
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[tokio::test]
    async fn fs_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCache::new(dir.path().join("nested"));
        let fingerprint = Fingerprint::of("graphql", &"config").unwrap();

        assert_eq!(cache.read(&fingerprint).await.unwrap(), None);
        cache.write(&fingerprint, r#"{"Schema":""}"#).await.unwrap();
        assert_eq!(
            cache.read(&fingerprint).await.unwrap(),
            Some(r#"{"Schema":""}"#.to_string())
        );
        assert!(cache.entry_path(&fingerprint).exists());
    }

    #[tokio::test]
    async fn memory_cache() {
        let cache = MemoryCache::new();
        let fingerprint = Fingerprint::of("database", &1).unwrap();

        assert!(cache.is_empty());
        cache.write(&fingerprint, "cached").await.unwrap();
        assert!(cache.contains(&fingerprint));
        assert_eq!(cache.read(&fingerprint).await.unwrap(), Some("cached".to_string()));
    }
}
