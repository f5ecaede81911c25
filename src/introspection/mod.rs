//! Introspection of upstreams into [`Api`](crate::api::Api) composites, with the
//! cache, offline and polling policies applied uniformly to every upstream kind.

pub mod cache;
pub mod database;
pub mod federation;
pub mod graphql;
pub mod openapi;
pub mod options;

pub use self::cache::{Fingerprint, FsCache, IntrospectionCache, MemoryCache};
pub use self::options::IntrospectionOptions;

use crate::errors::ComposeError;
use crate::upstream::IntrospectionSettings;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// An upstream configuration the introspector knows how to fingerprint.
pub trait UpstreamConfiguration: Serialize {
    /// Distinguishes identical configurations of different upstream kinds.
    const KIND: &'static str;

    fn introspection_settings(&self) -> &IntrospectionSettings;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Unchanged,
    Changed(T),
}

#[derive(Clone)]
pub struct Introspector {
    options: IntrospectionOptions,
    cache: Arc<dyn IntrospectionCache>,
}

impl Introspector {
    /// An introspector caching on disk, under `options.cache_dir`.
    pub fn new(options: IntrospectionOptions) -> Introspector {
        let cache = Arc::new(FsCache::new(options.cache_dir.clone()));
        Introspector { options, cache }
    }

    pub fn with_cache(
        options: IntrospectionOptions,
        cache: Arc<dyn IntrospectionCache>,
    ) -> Introspector {
        Introspector { options, cache }
    }

    pub fn options(&self) -> &IntrospectionOptions {
        &self.options
    }

    /// Runs `generator` unless a cached result for `configuration` can be used.
    ///
    /// In offline mode a cache miss fails before `generator` is called. Fresh
    /// results are written back when caching is enabled. An upstream with
    /// `disableCache` never reads nor writes the cache.
    #[tracing::instrument(skip_all, fields(kind = C::KIND))]
    pub async fn introspect_with_cache<C, T, F, Fut>(
        &self,
        configuration: &C,
        generator: F,
    ) -> Result<T, ComposeError>
    where
        C: UpstreamConfiguration,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ComposeError>>,
    {
        let fingerprint = Fingerprint::of(C::KIND, configuration)?;
        let cache_disabled = configuration.introspection_settings().disable_cache;

        if self.options.reads_cache() && !cache_disabled {
            if let Some(cached) = self.read_cached(&fingerprint).await {
                info!(%fingerprint, "loaded introspection from cache");
                return Ok(cached);
            }
        }

        if self.options.offline_only {
            return Err(ComposeError::OfflineCacheMiss {
                fingerprint: fingerprint.to_string(),
            });
        }

        let fresh = generator().await?;
        info!(%fingerprint, "introspected upstream");

        if self.options.enable_cache && !cache_disabled {
            self.store(&fingerprint, &fresh).await;
        }

        Ok(fresh)
    }

    /// Introspects again, bypassing cached results, and reports whether the
    /// upstream changed since `previous`.
    #[tracing::instrument(skip_all, fields(kind = C::KIND))]
    pub async fn repoll<C, T, F, Fut>(
        &self,
        configuration: &C,
        previous: &T,
        generator: F,
    ) -> Result<PollOutcome<T>, ComposeError>
    where
        C: UpstreamConfiguration,
        T: Serialize + PartialEq,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ComposeError>>,
    {
        let fingerprint = Fingerprint::of(C::KIND, configuration)?;
        if self.options.offline_only {
            return Err(ComposeError::OfflineCacheMiss {
                fingerprint: fingerprint.to_string(),
            });
        }

        let fresh = generator().await?;
        if fresh == *previous {
            debug!(%fingerprint, "upstream unchanged");
            return Ok(PollOutcome::Unchanged);
        }

        info!(%fingerprint, "upstream changed");
        if self.options.enable_cache && !configuration.introspection_settings().disable_cache {
            self.store(&fingerprint, &fresh).await;
        }
        Ok(PollOutcome::Changed(fresh))
    }

    /// How often the external scheduler should call [`repoll`](Introspector::repoll)
    /// for this upstream, or `None` if it should not be polled.
    pub fn polling_interval<C: UpstreamConfiguration>(
        &self,
        configuration: &C,
    ) -> Option<Duration> {
        if !self.options.polling_mode {
            return None;
        }

        configuration
            .introspection_settings()
            .polling_interval_seconds
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }

    async fn read_cached<T: DeserializeOwned>(&self, fingerprint: &Fingerprint) -> Option<T> {
        let content = match self.cache.read(fingerprint).await {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, %fingerprint, "failed to read introspection cache");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(cached) => Some(cached),
            Err(err) => {
                warn!(error = %err, %fingerprint, "ignoring unreadable introspection cache entry");
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, fingerprint: &Fingerprint, result: &T) {
        let written = match serde_json::to_string(result) {
            Ok(content) => self.cache.write(fingerprint, &content).await,
            Err(err) => Err(err.into()),
        };

        if let Err(err) = written {
            warn!(error = %err, %fingerprint, "failed to write introspection cache");
        }
    }
}
