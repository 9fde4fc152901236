//! Configuration module
//!
//! Resolves settings from built-in defaults, the resource profile, the config
//! file, and environment variables, in increasing order of precedence.

#![allow(dead_code)]

pub mod env;
pub mod file;
pub mod profile;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::output::{Backend, BannerRenderer, FormatterKind, DEFAULT_INTERPRETER, DEFAULT_WIDTH};
use env::{EnvConfig, WIDTH_VAR};
use file::{get_config_path, ConfigFile, DeployVerb};
use profile::ResourceProfile;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown resource profile: {name}. Available: {available:?}")]
    UnknownProfile {
        name: String,
        available: Vec<&'static str>,
    },
}

/// Banner rendering settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerSettings {
    /// Minimum box width
    pub width: usize,
    /// Formatter used for headers and summaries
    pub format: FormatterKind,
    /// Root of the formatter scripts
    pub script_root: Option<PathBuf>,
    /// Built-in rendering or external scripts
    pub backend: Backend,
    /// Interpreter for the formatter scripts
    pub interpreter: String,
}

impl Default for BannerSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            format: FormatterKind::Textbox,
            script_root: None,
            backend: Backend::Builtin,
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }
}

impl BannerSettings {
    /// Renderer for these settings
    pub fn renderer(&self) -> BannerRenderer {
        BannerRenderer::new(self.format)
            .with_width(self.width)
            .with_backend(self.backend)
            .with_script_root(self.script_root.clone())
            .with_interpreter(&self.interpreter)
    }
}

/// Resolved system settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub database_path: Option<String>,
    pub default_currency: String,
    pub resource_profile: ResourceProfile,
    pub max_view_entries: u32,
    pub max_search_results: u32,
    pub fossilization_threshold: f64,
    pub wal_checkpoint_interval: u32,
    pub log_level: String,
    pub bind_address: String,
    pub bind_port: u16,
    pub encryption: String,
    pub data_dir: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub banner: BannerSettings,

    /// Config file that was applied, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,

    /// Problems found while loading, reported once logging is up
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut settings = Self {
            database_path: None,
            default_currency: "SGD".to_string(),
            resource_profile: ResourceProfile::Standard,
            max_view_entries: 0,
            max_search_results: 0,
            fossilization_threshold: 0.0,
            wal_checkpoint_interval: 0,
            log_level: String::new(),
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            encryption: "disabled".to_string(),
            data_dir: None,
            config_dir: None,
            log_dir: None,
            banner: BannerSettings::default(),
            source: None,
            warnings: Vec::new(),
        };
        settings.apply_profile(ResourceProfile::Standard);
        settings
    }
}

impl Settings {
    /// Load settings for a deployment context.
    ///
    /// A config file that cannot be read or parsed is recorded in
    /// `warnings` and skipped; a missing file is not an error.
    pub fn load(verb: DeployVerb, config_override: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(verb, config_override, true)
    }

    /// Like [`Settings::load`], but an unknown resource profile becomes a
    /// warning and the previous profile stays in effect
    pub fn load_lenient(verb: DeployVerb, config_override: Option<&Path>) -> Self {
        match Self::load_with(verb, config_override, false) {
            Ok(settings) => settings,
            Err(e) => {
                let mut settings = Self::default();
                settings.warnings.push(e.to_string());
                settings
            }
        }
    }

    fn load_with(
        verb: DeployVerb,
        config_override: Option<&Path>,
        strict: bool,
    ) -> Result<Self, ConfigError> {
        let path = get_config_path(verb, config_override);
        let mut warnings = Vec::new();

        let file = if path.exists() {
            match ConfigFile::load(&path) {
                Ok(file) => {
                    debug!("Loaded config from {}", path.display());
                    Some(file)
                }
                Err(e) => {
                    warnings.push(format!("Failed to load config from {}: {e:#}", path.display()));
                    None
                }
            }
        } else {
            debug!("No config file at {}", path.display());
            None
        };

        let mut settings = Self::resolve_with(file.as_ref(), &EnvConfig::load(), strict)?;
        if file.is_some() {
            settings.source = Some(path);
        }
        warnings.append(&mut settings.warnings);
        settings.warnings = warnings;
        Ok(settings)
    }

    /// Apply a config file and an environment snapshot over the defaults
    pub fn resolve(file: Option<&ConfigFile>, env: &EnvConfig) -> Result<Self, ConfigError> {
        Self::resolve_with(file, env, true)
    }

    fn resolve_with(
        file: Option<&ConfigFile>,
        env: &EnvConfig,
        strict: bool,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        if let Some(file) = file {
            settings.apply_file(file, strict)?;
        }
        settings.apply_env(env, strict)?;
        Ok(settings)
    }

    fn select_profile(&mut self, name: &str, strict: bool) -> Result<(), ConfigError> {
        match ResourceProfile::from_name(name) {
            Ok(profile) => self.apply_profile(profile),
            Err(e) if !strict => self
                .warnings
                .push(format!("{e}; keeping the {} profile", self.resource_profile)),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn apply_profile(&mut self, profile: ResourceProfile) {
        let values = profile.settings();
        self.resource_profile = profile;
        self.max_view_entries = values.max_view_entries;
        self.max_search_results = values.max_search_results;
        self.fossilization_threshold = values.fossilization_threshold;
        self.wal_checkpoint_interval = values.wal_checkpoint_interval;
        self.log_level = values.log_level;
    }

    fn apply_file(&mut self, file: &ConfigFile, strict: bool) -> Result<(), ConfigError> {
        let runtime = &file.runtime;
        if let Some(name) = &runtime.resource_profile {
            self.select_profile(name, strict)?;
        }
        if let Some(v) = runtime.max_view_entries {
            self.max_view_entries = v;
        }
        if let Some(v) = runtime.max_search_results {
            self.max_search_results = v;
        }
        if let Some(v) = runtime.fossilization_threshold {
            self.fossilization_threshold = v;
        }
        if let Some(v) = runtime.wal_checkpoint_interval {
            self.wal_checkpoint_interval = v;
        }
        if let Some(v) = &runtime.log_level {
            self.log_level = v.clone();
        }
        if let Some(v) = &runtime.database_path {
            self.database_path = Some(v.clone());
        }
        if let Some(v) = &runtime.default_currency {
            self.default_currency = v.clone();
        }

        if let Some(v) = &file.network.bind_address {
            self.bind_address = v.clone();
        }
        if let Some(v) = file.network.bind_port {
            self.bind_port = v;
        }
        if let Some(v) = &file.security.encryption {
            self.encryption = v.clone();
        }

        if let Some(v) = &file.paths.data_dir {
            self.data_dir = Some(v.clone());
        }
        if let Some(v) = &file.paths.config_dir {
            self.config_dir = Some(v.clone());
        }
        if let Some(v) = &file.paths.log_dir {
            self.log_dir = Some(v.clone());
        }

        let banner = &file.banner;
        if let Some(v) = banner.width {
            self.banner.width = v;
        }
        if let Some(v) = &banner.format {
            self.banner.format = FormatterKind::from_name(v);
        }
        if let Some(v) = &banner.script_root {
            self.banner.script_root = Some(v.clone());
        }
        if let Some(v) = banner.backend {
            self.banner.backend = v;
        }
        if let Some(v) = &banner.interpreter {
            self.banner.interpreter = v.clone();
        }
        Ok(())
    }

    fn apply_env(&mut self, env: &EnvConfig, strict: bool) -> Result<(), ConfigError> {
        if let Some(name) = &env.resource_profile {
            self.select_profile(name, strict)?;
        }
        if let Some(v) = env.max_view_entries {
            self.max_view_entries = v;
        }
        if let Some(v) = env.max_search_results {
            self.max_search_results = v;
        }
        if let Some(v) = env.fossilization_threshold {
            self.fossilization_threshold = v;
        }
        if let Some(v) = env.wal_checkpoint_interval {
            self.wal_checkpoint_interval = v;
        }
        if let Some(v) = &env.log_level {
            self.log_level = v.clone();
        }
        if let Some(v) = &env.bind_address {
            self.bind_address = v.clone();
        }
        if let Some(v) = env.bind_port {
            self.bind_port = v;
        }
        if let Some(v) = &env.encryption {
            self.encryption = v.clone();
        }
        if let Some(v) = &env.data_dir {
            self.data_dir = Some(v.clone());
        }
        if let Some(v) = &env.config_dir {
            self.config_dir = Some(v.clone());
        }
        if let Some(v) = &env.log_dir {
            self.log_dir = Some(v.clone());
        }

        if let Some(raw) = &env.width {
            match raw.trim().parse::<usize>() {
                Ok(width) if width > 0 => self.banner.width = width,
                _ => self.warnings.push(format!(
                    "Ignoring {WIDTH_VAR}={raw:?}: expected a positive integer"
                )),
            }
        }
        if let Some(v) = &env.test_format {
            self.banner.format = FormatterKind::from_name(v);
        }
        if let Some(v) = &env.script_root {
            self.banner.script_root = Some(v.clone());
        }
        Ok(())
    }

    /// Look up a setting by key, rendered as a string
    pub fn get(&self, key: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        let mut current = &value;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Log warnings collected during loading
    pub fn report_warnings(&self) {
        for warning in &self.warnings {
            warn!("{warning}");
        }
    }
}
