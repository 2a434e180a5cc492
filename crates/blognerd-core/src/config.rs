use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Namespaces;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    pub pages_namespace: String,
    pub feeds_namespace: String,
    /// Query run when the caller submits an empty search box.
    pub default_query: String,
    pub latest_posts_max_feeds: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    pub uri: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    pub model_dir: Option<String>,
    pub use_fake: bool,
    pub max_len: usize,
    pub query_instruction: Option<String>,
    pub retry_attempts: usize,
    pub retry_interval_ms: u64,
}

const DEFAULT_QUERY: &str = "ai, software development, startups, tech, data, computers \
    since:last_3days length:1000 type:blog score:0.6 lang:en";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig {
                default_limit: 50,
                max_limit: 100,
                pages_namespace: "blaze-content-v3".to_string(),
                feeds_namespace: "blaze-feeds-v2".to_string(),
                default_query: DEFAULT_QUERY.to_string(),
                latest_posts_max_feeds: 20,
            },
            index: IndexConfig {
                uri: "../dev_data/indexes/lancedb".to_string(),
                dimension: 1024,
            },
            embedding: EmbeddingConfig {
                model_dir: None,
                use_fake: false,
                max_len: 256,
                query_instruction: None,
                retry_attempts: 2,
                retry_interval_ms: 2_000,
            },
        }
    }
}

impl AppConfig {
    pub fn validate_for_env(&self, env: &str) -> Result<()> {
        let s = &self.search;
        if s.default_limit == 0 || s.max_limit == 0 {
            return Err(Error::InvalidConfig("search limits must be positive".into()));
        }
        if s.default_limit > s.max_limit {
            return Err(Error::InvalidConfig(format!(
                "search.default_limit {} exceeds search.max_limit {}",
                s.default_limit, s.max_limit
            )));
        }
        if s.pages_namespace.trim().is_empty() || s.feeds_namespace.trim().is_empty() {
            return Err(Error::InvalidConfig("namespaces must not be empty".into()));
        }
        if s.pages_namespace == s.feeds_namespace {
            return Err(Error::InvalidConfig(format!(
                "pages and feeds share namespace '{}'",
                s.pages_namespace
            )));
        }
        if self.index.dimension == 0 {
            return Err(Error::InvalidConfig("index.dimension must be positive".into()));
        }
        if self.embedding.retry_attempts == 0 {
            return Err(Error::InvalidConfig("embedding.retry_attempts must be at least 1".into()));
        }
        match env {
            "prod" | "production" if self.embedding.use_fake => {
                Err(Error::InvalidConfig("fake embeddings are not allowed in production".into()))
            }
            _ => Ok(()),
        }
    }

    pub fn namespaces(&self) -> Namespaces {
        Namespaces {
            pages: self.search.pages_namespace.clone(),
            feeds: self.search.feeds_namespace.clone(),
        }
    }

    /// Clamp a caller-requested result count into `1..=max_limit`.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.search.default_limit).clamp(1, self.search.max_limit)
    }
}

pub struct Config {
    figment: Figment,
    settings: AppConfig,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Self::from_figment(figment, env_name)
    }

    /// Build from an already assembled figment (tests, embedding callers).
    pub fn from_figment(figment: Figment, env_name: &str) -> anyhow::Result<Self> {
        let settings: AppConfig = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read configuration: {}", e))?;
        settings.validate_for_env(env_name)?;
        Ok(Self { figment, settings })
    }

    pub fn settings(&self) -> &AppConfig { &self.settings }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
