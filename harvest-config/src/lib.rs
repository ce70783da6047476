//! Loader for harvest configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning: YAML files, inline YAML,
//! then `HARVEST_`-prefixed environment variables (`__` separates nested keys, so
//! `HARVEST_TWITTER__BEARER_TOKEN` sets `twitter.bearer_token`). String values may
//! reference other variables as `${VAR}`; references are expanded recursively.
//!
//! Every field has a default. The defaults for `query` describe the stock run;
//! the bearer token and the store URL default to empty and must be supplied
//! before [`HarvestConfig::validate_twitter`] / [`HarvestConfig::validate_store`]
//! accept them.
use config::{Config, ConfigError, Environment, File};
use harvest_common::observability::{LogConfig, LogFormat};
use harvest_common::HarvestError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "HARVEST";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    #[serde(default, deserialize_with = "string_or_scalar")]
    pub bearer_token: String,
    #[serde(default = "default_twitter_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Pause between consecutive search pages.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

/// Environment values go through `try_parsing`, so an all-digit token or
/// collection name arrives as a number; take it back as text.
fn string_or_scalar<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, found {other}"
        ))),
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            bearer_token: String::new(),
            base_url: default_twitter_base_url(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// sqlx connection URL, e.g. `sqlite://harvest.db`.
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_database", deserialize_with = "string_or_scalar")]
    pub database: String,
    #[serde(default = "default_collection", deserialize_with = "string_or_scalar")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database: default_database(),
            collection: default_collection(),
        }
    }
}

/// The search a run performs. Dates are `YYYY-MM-DD`; `max_posts: null` means unbounded.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_keyword")]
    pub keyword: String,
    #[serde(default = "default_spatial")]
    pub spatial: String,
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default = "default_end_date")]
    pub end_date: String,
    #[serde(default = "default_max_posts")]
    pub max_posts: Option<usize>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            keyword: default_keyword(),
            spatial: default_spatial(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            max_posts: default_max_posts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub emit_stderr: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            emit_stderr: false,
            dir: None,
            filter: default_filter(),
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self, app_name: &str) -> LogConfig {
        LogConfig {
            app_name: app_name.to_string(),
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

impl HarvestConfig {
    /// Fail fast before any request goes out with a missing credential.
    pub fn validate_twitter(&self) -> harvest_common::Result<()> {
        if self.twitter.bearer_token.trim().is_empty() {
            return Err(HarvestError::Config(
                "twitter.bearer_token is empty; set HARVEST_TWITTER__BEARER_TOKEN".into(),
            ));
        }
        if self.twitter.base_url.trim().is_empty() {
            return Err(HarvestError::Config("twitter.base_url is empty".into()));
        }
        Ok(())
    }

    pub fn validate_store(&self) -> harvest_common::Result<()> {
        if self.store.database_url.trim().is_empty() {
            return Err(HarvestError::Config(
                "store.database_url is empty; set HARVEST_STORE__DATABASE_URL".into(),
            ));
        }
        if self.store.collection.trim().is_empty() {
            return Err(HarvestError::Config("store.collection is empty".into()));
        }
        Ok(())
    }
}

fn default_twitter_base_url() -> String {
    "https://api.twitter.com".into()
}
fn default_page_size() -> u32 {
    100
}
fn default_page_delay_ms() -> u64 {
    3100
}
fn default_database() -> String {
    "project".into()
}
fn default_collection() -> String {
    "tweets".into()
}
fn default_keyword() -> String {
    r#"(football OR "Manchester United" OR "Paul Pogba") lang:en"#.into()
}
fn default_spatial() -> String {
    "place_country:GB OR place_country:US".into()
}
fn default_start_date() -> String {
    "2015-08-15".into()
}
fn default_end_date() -> String {
    "2015-08-17".into()
}
fn default_max_posts() -> Option<usize> {
    Some(100)
}
fn default_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct HarvestConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for HarvestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvestConfigLoader {
    /// Start from the built-in defaults; environment overrides are applied in [`load`](Self::load).
    ///
    /// ```
    /// use harvest_config::HarvestConfigLoader;
    ///
    /// let config = HarvestConfigLoader::new()
    ///     .with_yaml_str("query:\n  max_posts: 250")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.query.max_posts, Some(250));
    /// assert_eq!(config.store.collection, "tweets");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely on the environment alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use harvest_config::HarvestConfigLoader;
    ///
    /// let cfg = HarvestConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// query:
    ///   keyword: "(football) lang:en"
    ///   max_posts: null
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.query.keyword, "(football) lang:en");
    /// assert_eq!(cfg.query.max_posts, None);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    pub fn load(self) -> Result<HarvestConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
