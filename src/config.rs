use crate::resolve::ResolutionStrategies;
use crate::scanner::DEFAULT_MAX_CONCURRENCY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of `assetgraph.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AssetgraphConfig {
    pub root: Option<String>,
    pub max_concurrency: Option<usize>,
    pub markup_extensions: Option<Vec<String>>,
    pub exclude: Vec<String>,
    pub resolution: ResolutionStrategies,
}

impl AssetgraphConfig {
    /// Config written by `init`, with every default spelled out
    pub fn starter() -> Self {
        Self {
            root: Some(".".to_string()),
            max_concurrency: Some(DEFAULT_MAX_CONCURRENCY),
            markup_extensions: Some(default_markup_extensions()),
            exclude: Vec::new(),
            resolution: ResolutionStrategies::default(),
        }
    }

    pub fn settings(&self) -> BuildSettings {
        let defaults = BuildSettings::default();
        BuildSettings {
            max_concurrency: self.max_concurrency.unwrap_or(defaults.max_concurrency).max(1),
            markup_extensions: self
                .markup_extensions
                .clone()
                .filter(|extensions| !extensions.is_empty())
                .unwrap_or(defaults.markup_extensions),
            resolution: self.resolution,
        }
    }
}

/// What a build needs beyond its collaborators
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettings {
    pub max_concurrency: usize,
    pub markup_extensions: Vec<String>,
    pub resolution: ResolutionStrategies,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            markup_extensions: default_markup_extensions(),
            resolution: ResolutionStrategies::default(),
        }
    }
}

fn default_markup_extensions() -> Vec<String> {
    vec!["html".to_string()]
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("assetgraph.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<AssetgraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: AssetgraphConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &AssetgraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
