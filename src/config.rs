use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub geoshape: GeoshapeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputsConfig {
    #[serde(default = "default_regions_path")]
    pub regions: PathBuf,
    #[serde(default = "default_divisions_path")]
    pub divisions: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            regions: default_regions_path(),
            divisions: default_divisions_path(),
        }
    }
}

fn default_regions_path() -> PathBuf {
    PathBuf::from("data/cache/regions.json")
}
fn default_divisions_path() -> PathBuf {
    PathBuf::from("data/cache/divisions.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeoshapeConfig {
    #[serde(default = "default_geoshape_dir")]
    pub dir: PathBuf,
}

impl Default for GeoshapeConfig {
    fn default() -> Self {
        Self {
            dir: default_geoshape_dir(),
        }
    }
}

fn default_geoshape_dir() -> PathBuf {
    PathBuf::from("data/geoshape")
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/data.json")
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FetchConfig {
    /// Request timeout in seconds. Absent means the HTTP client's own default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.fetch.timeout_secs == Some(0) {
        anyhow::bail!("fetch.timeout_secs must be > 0 when set");
    }

    Ok(config)
}
