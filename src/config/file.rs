//! Configuration file management
//!
//! Handles locating, loading, and validating configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::profile::ResourceProfile;
use crate::output::Backend;

/// System-wide config used by `serve`
const SERVE_CONFIG: &str = "/etc/memogarden/config.toml";
/// Per-user config used by `run`
const RUN_CONFIG: &str = "~/.config/memogarden/config.toml";
/// Container config used by `deploy`
const DEPLOY_CONFIG: &str = "/config/config.toml";

/// Deployment context that decides where the config file lives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeployVerb {
    Serve,
    #[default]
    Run,
    Deploy,
}

impl DeployVerb {
    /// Unknown verbs fall back to the per-user config
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "serve" => DeployVerb::Serve,
            "deploy" => DeployVerb::Deploy,
            _ => DeployVerb::Run,
        }
    }
}

impl fmt::Display for DeployVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployVerb::Serve => write!(f, "serve"),
            DeployVerb::Run => write!(f, "run"),
            DeployVerb::Deploy => write!(f, "deploy"),
        }
    }
}

/// Config file path for a deployment context; an explicit path wins
pub fn get_config_path(verb: DeployVerb, config_override: Option<&Path>) -> PathBuf {
    if let Some(path) = config_override {
        return path.to_path_buf();
    }
    match verb {
        DeployVerb::Serve => PathBuf::from(SERVE_CONFIG),
        DeployVerb::Run => expand_path(RUN_CONFIG),
        DeployVerb::Deploy => PathBuf::from(DEPLOY_CONFIG),
    }
}

/// Serialization format, chosen by file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Serialize any config value in this format
    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<String> {
        let content = match self {
            ConfigFormat::Toml => toml::to_string_pretty(value).context("Failed to serialize TOML")?,
            ConfigFormat::Yaml => serde_yaml::to_string(value).context("Failed to serialize YAML")?,
            ConfigFormat::Json => {
                serde_json::to_string_pretty(value).context("Failed to serialize JSON")?
            }
        };
        Ok(content)
    }
}

/// Full configuration file structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub runtime: RuntimeSection,
    pub network: NetworkSection,
    pub security: SecuritySection,
    pub paths: PathsSection,
    pub banner: BannerSection,
}

/// `[runtime]`: resource profile and explicit overrides of its values
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_view_entries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_search_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fossilization_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wal_checkpoint_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_currency: Option<String>,
}

/// `[network]`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_port: Option<u16>,
}

/// `[security]`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,
}

/// `[paths]`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

/// `[banner]`: test header/summary rendering
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
}

impl ConfigFile {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = match ConfigFormat::for_path(path) {
            ConfigFormat::Toml => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?,
            ConfigFormat::Json => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = ConfigFormat::for_path(path).serialize(self)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(profile) = &self.runtime.resource_profile {
            ResourceProfile::from_name(profile)?;
        }

        if let Some(threshold) = self.runtime.fossilization_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                anyhow::bail!(
                    "fossilization_threshold must be between 0.0 and 1.0, got {}",
                    threshold
                );
            }
        }

        if self.banner.width == Some(0) {
            anyhow::bail!("banner width must be greater than 0");
        }

        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self {
            runtime: RuntimeSection {
                resource_profile: Some(ResourceProfile::Standard.name().to_string()),
                ..Default::default()
            },
            network: NetworkSection {
                bind_address: Some("127.0.0.1".to_string()),
                bind_port: Some(8080),
            },
            security: SecuritySection {
                encryption: Some("disabled".to_string()),
            },
            paths: PathsSection::default(),
            banner: BannerSection {
                width: Some(60),
                format: Some("textbox".to_string()),
                script_root: None,
                backend: Some(Backend::Builtin),
                interpreter: None,
            },
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
