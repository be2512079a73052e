use {
    crate::error::Error,
    config::{Config, Environment, File},
    serde::de::DeserializeOwned,
    std::path::Path,
};

/// Separates nesting levels in environment variable names, e.g.
/// `INDEXER__TARGET__POSTGRES__TYPE`.
pub const ENV_SEPARATOR: &str = "__";

pub struct ConfigParser;

impl ConfigParser {
    /// Load `path` (format picked from its extension) and apply overrides from
    /// unprefixed environment variables.
    pub fn parse<D, P>(path: P) -> Result<D, Error>
    where
        D: DeserializeOwned,
        P: AsRef<Path>,
    {
        Self::build(path, Environment::default().separator(ENV_SEPARATOR))
    }

    /// Same as [`ConfigParser::parse`], but only environment variables that
    /// start with `{prefix}__` are considered.
    pub fn parse_with_prefix<D, P>(path: P, prefix: &str) -> Result<D, Error>
    where
        D: DeserializeOwned,
        P: AsRef<Path>,
    {
        let env_override = Environment::with_prefix(prefix)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR);

        Self::build(path, env_override)
    }

    fn build<D, P>(path: P, env_override: Environment) -> Result<D, Error>
    where
        D: DeserializeOwned,
        P: AsRef<Path>,
    {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_override)
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

// ----------------------------------- tests -----------------------------------
