use {
    crate::{IndexerError, IndexerResult},
    config_parser::ConfigParser,
    indexer_appdata::DEFAULT_BUFFER_SIZE,
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
};

/// Prefix of environment variables overriding a config file, e.g.
/// `INDEXER__CHANNEL_BUFFER_SIZE=64`.
pub const ENV_PREFIX: &str = "INDEXER";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndexingConfig {
    /// Indexer targets by name.
    #[serde(default)]
    pub target: BTreeMap<String, IndexerConfig>,
    #[serde(default = "default_channel_buffer_size")]
    pub channel_buffer_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            target: BTreeMap::new(),
            channel_buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl IndexingConfig {
    pub fn with_target<N>(mut self, name: N, target: IndexerConfig) -> Self
    where
        N: Into<String>,
    {
        self.target.insert(name.into(), target);
        self
    }
}

fn default_channel_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndexerConfig {
    /// The indexer type, as registered in the `IndexerRegistry`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Passed as is to the target's init function.
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterConfig>,
}

impl IndexerConfig {
    pub fn new<T>(ty: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            ty: ty.into(),
            config: serde_json::Value::Null,
            filter: None,
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FilterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<ModuleFilterConfig>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.modules.as_ref().map_or(true, ModuleFilterConfig::is_empty)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ModuleFilterConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ModuleFilterConfig {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// The shapes an indexing config can be given in.
#[derive(Debug, Clone)]
pub enum ConfigInput {
    Typed(IndexingConfig),
    Map(serde_json::Map<String, serde_json::Value>),
    /// Must be an object, or null for the default config.
    Value(serde_json::Value),
    JsonText(String),
    /// A TOML, JSON or YAML file, with `INDEXER__` environment overrides.
    File(PathBuf),
}

impl ConfigInput {
    pub fn file<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self::File(path.as_ref().to_path_buf())
    }

    pub fn parse(self) -> IndexerResult<IndexingConfig> {
        match self {
            ConfigInput::Typed(config) => Ok(config),
            ConfigInput::Map(map) => Ok(serde_json::from_value(serde_json::Value::Object(map))?),
            ConfigInput::Value(serde_json::Value::Null) => Ok(IndexingConfig::default()),
            ConfigInput::Value(value @ serde_json::Value::Object(_)) => {
                Ok(serde_json::from_value(value)?)
            },
            ConfigInput::Value(value) => Err(IndexerError::Config(format!(
                "expected a JSON object or null, got `{value}`"
            ))),
            ConfigInput::JsonText(text) => ConfigInput::Value(serde_json::from_str(&text)?).parse(),
            ConfigInput::File(path) => Ok(ConfigParser::parse_with_prefix(path, ENV_PREFIX)?),
        }
    }
}

impl Default for ConfigInput {
    fn default() -> Self {
        Self::Typed(IndexingConfig::default())
    }
}

impl From<IndexingConfig> for ConfigInput {
    fn from(config: IndexingConfig) -> Self {
        Self::Typed(config)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ConfigInput {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Map(map)
    }
}

impl From<serde_json::Value> for ConfigInput {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for ConfigInput {
    fn from(text: &str) -> Self {
        Self::JsonText(text.to_string())
    }
}

impl From<PathBuf> for ConfigInput {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

// ----------------------------------- tests -----------------------------------
