use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default size in bytes of a value-pool block (strings include the terminator)
pub const MAX_VALUE_SIZE: usize = 257;

/// Default number of blocks in every pool
pub const VALUE_ENTRIES: usize = 6;

/// Smallest value block able to hold a boxed 64-bit scalar
const MIN_VALUE_SIZE: usize = 8;

/// Pool layout for the echo server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoConfig {
    value_entries: usize,
    max_value_size: usize,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            value_entries: VALUE_ENTRIES,
            max_value_size: MAX_VALUE_SIZE,
        }
    }
}

impl EchoConfig {
    /// Create a new builder for EchoConfig
    pub fn builder() -> EchoConfigBuilder {
        EchoConfigBuilder::default()
    }

    /// Number of blocks in each pool, i.e. the in-flight ceiling per shape class
    pub fn value_entries(&self) -> usize {
        self.value_entries
    }

    /// Block size of the value pool
    pub fn max_value_size(&self) -> usize {
        self.max_value_size
    }

    /// Load a configuration from a TOML file
    ///
    /// Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&contents)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(contents)?;
        let mut builder = Self::builder();
        if let Some(entries) = file.pools.value_entries {
            builder = builder.value_entries(entries);
        }
        if let Some(size) = file.pools.max_value_size {
            builder = builder.max_value_size(size);
        }
        builder.build()
    }
}

/// Builder for EchoConfig
#[derive(Debug, Default)]
pub struct EchoConfigBuilder {
    inner: EchoConfig,
}

impl EchoConfigBuilder {
    pub fn value_entries(mut self, entries: usize) -> Self {
        self.inner.value_entries = entries;
        self
    }

    pub fn max_value_size(mut self, bytes: usize) -> Self {
        self.inner.max_value_size = bytes;
        self
    }

    pub fn build(self) -> Result<EchoConfig> {
        if self.inner.value_entries == 0 {
            return Err(Error::Config("value_entries must be at least 1".to_string()));
        }
        if self.inner.max_value_size < MIN_VALUE_SIZE {
            return Err(Error::Config(format!(
                "max_value_size must be at least {MIN_VALUE_SIZE} bytes, got {}",
                self.inner.max_value_size
            )));
        }
        Ok(self.inner)
    }
}

/// TOML config file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    pools: PoolsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PoolsSection {
    value_entries: Option<usize>,
    max_value_size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EchoConfig::default();
        assert_eq!(config.value_entries(), 6);
        assert_eq!(config.max_value_size(), 257);
    }

    #[test]
    fn test_builder_rejects_empty_pools() {
        let result = EchoConfig::builder().value_entries(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_tiny_blocks() {
        let result = EchoConfig::builder().max_value_size(4).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_overrides_only_given_keys() {
        let config = EchoConfig::from_toml_str("[pools]\nvalue_entries = 12\n").unwrap();
        assert_eq!(config.value_entries(), 12);
        assert_eq!(config.max_value_size(), MAX_VALUE_SIZE);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EchoConfig::from_toml_str("").unwrap(), EchoConfig::default());
    }

    #[test]
    fn test_bad_toml() {
        let result = EchoConfig::from_toml_str("[pools]\nvalue_entries = \"many\"\n");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path =
            std::env::temp_dir().join(format!("ipc-echo-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[pools]\nmax_value_size = 512\n").unwrap();

        let config = EchoConfig::load(&path).unwrap();
        assert_eq!(config.max_value_size(), 512);

        std::fs::remove_file(&path).ok();
    }
}
