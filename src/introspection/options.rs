use std::env;
use std::path::PathBuf;

pub const POLLING_MODE_VAR: &str = "GQL_COMPOSE_DATA_SOURCE_POLLING_MODE";
pub const ENABLE_CACHE_VAR: &str = "GQL_COMPOSE_ENABLE_INTROSPECTION_CACHE";
pub const OFFLINE_VAR: &str = "GQL_COMPOSE_ENABLE_INTROSPECTION_OFFLINE";
pub const CACHE_DIR_VAR: &str = "GQL_COMPOSE_INTROSPECTION_CACHE_DIR";

pub const DEFAULT_CACHE_DIR: &str = ".gql-compose/cache/introspection";

/// Process-wide introspection switches, read once and handed to the
/// [`Introspector`](super::Introspector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionOptions {
    /// Upstreams are re-polled by an external scheduler instead of introspected once.
    pub polling_mode: bool,
    /// Fresh introspection results are persisted, and read back on later runs.
    pub enable_cache: bool,
    /// Only cached results may be used. A cache miss is an error.
    pub offline_only: bool,
    pub cache_dir: PathBuf,
}

impl Default for IntrospectionOptions {
    fn default() -> Self {
        IntrospectionOptions {
            polling_mode: false,
            enable_cache: false,
            offline_only: false,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

impl IntrospectionOptions {
    pub fn from_env() -> IntrospectionOptions {
        IntrospectionOptions::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> IntrospectionOptions
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| lookup(name).map(|value| value == "true").unwrap_or(false);

        IntrospectionOptions {
            polling_mode: flag(POLLING_MODE_VAR),
            enable_cache: flag(ENABLE_CACHE_VAR),
            offline_only: flag(OFFLINE_VAR),
            cache_dir: lookup(CACHE_DIR_VAR)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
        }
    }

    /// Whether cached results may be read at all.
    pub fn reads_cache(&self) -> bool {
        self.enable_cache || self.offline_only
    }
}
