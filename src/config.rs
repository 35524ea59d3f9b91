use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;
use thiserror::Error;

/// A configuration document as handed over by the loader: any YAML whose root
/// is a mapping with string keys. It enforces that the root of the tree is a
/// mapping and not a sequence or a single element.
#[derive(Debug, PartialEq, Deserialize, Serialize, Default, Clone)]
pub struct Config(HashMap<String, Value>);

impl Config {
    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if `key` is present at the root of the document.
    pub fn is_set(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

#[derive(Error, Debug)]
#[error("{0}")]
pub struct ConfigError(pub String);

impl From<HashMap<String, Value>> for Config {
    fn from(values: HashMap<String, Value>) -> Self {
        Self(values)
    }
}

impl From<Config> for HashMap<String, Value> {
    fn from(config: Config) -> Self {
        config.0
    }
}

impl TryFrom<&str> for Config {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        serde_yaml::from_str::<Config>(value)
            .map_err(|e| ConfigError(format!("decoding config: {e}")))
    }
}

impl TryFrom<String> for Config {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl TryFrom<Config> for String {
    type Error = ConfigError;

    fn try_from(value: Config) -> Result<Self, Self::Error> {
        // serde_yaml::to_string returns "{}\n" if the document is empty
        if value.0.is_empty() {
            return Ok("".to_string());
        }
        serde_yaml::to_string(&value).map_err(|e| ConfigError(format!("encoding config: {e}")))
    }
}
