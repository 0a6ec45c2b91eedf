use anyhow::{Context, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config/node.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Sled,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            StorageKind::Memory => "memory",
            StorageKind::Sled => "sled",
        };
        f.write_str(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub log_level: String,
    pub log_format: String,
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub genesis_path: Option<PathBuf>,
    /// Spacing between simulated block timestamps.
    pub block_interval_ms: u64,
    /// Number of blocks `run` produces.
    pub blocks: u64,
    pub metrics_enabled: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            data_dir: PathBuf::from("./data"),
            storage: StorageKind::Memory,
            genesis_path: None,
            block_interval_ms: 5_000,
            blocks: 10,
            metrics_enabled: false,
        }
    }
}

/// Command-line values that win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub storage: Option<StorageKind>,
    pub genesis_path: Option<PathBuf>,
    pub blocks: Option<u64>,
    pub metrics: bool,
}

impl NodeConfig {
    /// Layer defaults, the TOML file and `TOLLGATE_*` variables.
    ///
    /// An explicit `config_path` must exist; the default path is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let resolved = match config_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path.to_path_buf())
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                path.exists().then_some(path)
            }
        };

        let defaults = NodeConfig::default();
        let mut builder = Config::builder()
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", defaults.log_format)?
            .set_default("data_dir", defaults.data_dir.display().to_string())?
            .set_default("storage", defaults.storage.to_string())?
            .set_default("block_interval_ms", defaults.block_interval_ms)?
            .set_default("blocks", defaults.blocks)?
            .set_default("metrics_enabled", defaults.metrics_enabled)?;

        if let Some(path) = &resolved {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(Environment::with_prefix("TOLLGATE").try_parsing(true));

        let config: NodeConfig = builder
            .build()?
            .try_deserialize()
            .context("invalid node configuration")?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(storage) = overrides.storage {
            self.storage = storage;
        }
        if let Some(path) = overrides.genesis_path {
            self.genesis_path = Some(path);
        }
        if let Some(blocks) = overrides.blocks {
            self.blocks = blocks;
        }
        if overrides.metrics {
            self.metrics_enabled = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!("log_format must be \"pretty\" or \"json\", got {:?}", self.log_format);
        }
        if self.block_interval_ms == 0 {
            anyhow::bail!("block_interval_ms must be positive");
        }
        Ok(())
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log_level = \"debug\"\nstorage = \"sled\"\nblocks = 3\ngenesis_path = \"g.json\""
        )
        .unwrap();

        let config = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.storage, StorageKind::Sled);
        assert_eq!(config.blocks, 3);
        assert_eq!(config.genesis_path, Some(PathBuf::from("g.json")));
        assert_eq!(config.block_interval_ms, 5_000);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = NodeConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = NodeConfig::default();
        config.apply_overrides(Overrides {
            log_format: Some("json".into()),
            blocks: Some(42),
            metrics: true,
            ..Overrides::default()
        });
        assert_eq!(config.log_format, "json");
        assert_eq!(config.blocks, 42);
        assert!(config.metrics_enabled);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_log_format_rejected() {
        let config = NodeConfig {
            log_format: "xml".into(),
            ..NodeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
