//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration. Values are
//! read once into an [`EnvConfig`] snapshot; empty values count as unset.

use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Environment variable prefix for settings
const ENV_PREFIX: &str = "MEMOGARDEN";

/// Banner variables, read without a prefix
pub const WIDTH_VAR: &str = "WIDTH";
pub const TEST_FORMAT_VAR: &str = "TEST_FORMAT";
pub const SCRIPT_ROOT_VAR: &str = "SCRIPT_ROOT";

/// Serializes environment mutation from [`EnvBuilder::apply_scoped`]
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// MEMOGARDEN_RESOURCE_PROFILE
    pub resource_profile: Option<String>,
    /// MEMOGARDEN_MAX_VIEW_ENTRIES
    pub max_view_entries: Option<u32>,
    /// MEMOGARDEN_MAX_SEARCH_RESULTS
    pub max_search_results: Option<u32>,
    /// MEMOGARDEN_FOSSILIZATION_THRESHOLD
    pub fossilization_threshold: Option<f64>,
    /// MEMOGARDEN_WAL_CHECKPOINT_INTERVAL
    pub wal_checkpoint_interval: Option<u32>,
    /// MEMOGARDEN_LOG_LEVEL
    pub log_level: Option<String>,
    /// MEMOGARDEN_BIND_ADDRESS
    pub bind_address: Option<String>,
    /// MEMOGARDEN_BIND_PORT
    pub bind_port: Option<u16>,
    /// MEMOGARDEN_ENCRYPTION
    pub encryption: Option<String>,
    /// MEMOGARDEN_DATA_DIR
    pub data_dir: Option<PathBuf>,
    /// MEMOGARDEN_CONFIG_DIR
    pub config_dir: Option<PathBuf>,
    /// MEMOGARDEN_LOG_DIR
    pub log_dir: Option<PathBuf>,
    /// WIDTH, kept raw so an unparsable value can be reported
    pub width: Option<String>,
    /// TEST_FORMAT
    pub test_format: Option<String>,
    /// SCRIPT_ROOT
    pub script_root: Option<PathBuf>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            resource_profile: get_env("RESOURCE_PROFILE"),
            max_view_entries: get_env_parse("MAX_VIEW_ENTRIES"),
            max_search_results: get_env_parse("MAX_SEARCH_RESULTS"),
            fossilization_threshold: get_env_parse("FOSSILIZATION_THRESHOLD"),
            wal_checkpoint_interval: get_env_parse("WAL_CHECKPOINT_INTERVAL"),
            log_level: get_env("LOG_LEVEL"),
            bind_address: get_env("BIND_ADDRESS"),
            bind_port: get_env_parse("BIND_PORT"),
            encryption: get_env("ENCRYPTION"),
            data_dir: get_env("DATA_DIR").map(PathBuf::from),
            config_dir: get_env("CONFIG_DIR").map(PathBuf::from),
            log_dir: get_env("LOG_DIR").map(PathBuf::from),
            width: get_raw(WIDTH_VAR),
            test_format: get_raw(TEST_FORMAT_VAR),
            script_root: get_raw(SCRIPT_ROOT_VAR).map(PathBuf::from),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.resource_profile.is_some()
            || self.max_view_entries.is_some()
            || self.max_search_results.is_some()
            || self.fossilization_threshold.is_some()
            || self.wal_checkpoint_interval.is_some()
            || self.log_level.is_some()
            || self.bind_address.is_some()
            || self.bind_port.is_some()
            || self.encryption.is_some()
            || self.data_dir.is_some()
            || self.config_dir.is_some()
            || self.log_dir.is_some()
            || self.width.is_some()
            || self.test_format.is_some()
            || self.script_root.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {ENV_PREFIX}_RESOURCE_PROFILE:  {:?}", self.resource_profile);
        println!("  {ENV_PREFIX}_LOG_LEVEL:         {:?}", self.log_level);
        println!("  {ENV_PREFIX}_BIND_ADDRESS:      {:?}", self.bind_address);
        println!("  {ENV_PREFIX}_BIND_PORT:         {:?}", self.bind_port);
        println!("  {ENV_PREFIX}_ENCRYPTION:        {:?}", self.encryption);
        println!("  {ENV_PREFIX}_DATA_DIR:          {:?}", self.data_dir);
        println!("  {WIDTH_VAR}:                         {:?}", self.width);
        println!("  {TEST_FORMAT_VAR}:                   {:?}", self.test_format);
        println!("  {SCRIPT_ROOT_VAR}:                   {:?}", self.script_root);
    }
}

/// Unprefixed variable, empty treated as unset
fn get_raw(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    get_raw(&format!("{ENV_PREFIX}_{name}"))
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.trim().parse().ok())
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, Option<String>)>,
}

impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set an arbitrary variable
    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), Some(value.into())));
        self
    }

    /// Remove a variable while the guard is alive
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.vars.push((key.into(), None));
        self
    }

    /// Set a MEMOGARDEN_ variable
    pub fn setting(self, name: &str, value: impl Into<String>) -> Self {
        self.var(format!("{ENV_PREFIX}_{name}"), value)
    }

    /// Set WIDTH
    pub fn width(self, width: impl Into<String>) -> Self {
        self.var(WIDTH_VAR, width)
    }

    /// Set TEST_FORMAT
    pub fn test_format(self, format: impl Into<String>) -> Self {
        self.var(TEST_FORMAT_VAR, format)
    }

    /// Set SCRIPT_ROOT
    pub fn script_root(self, root: impl Into<String>) -> Self {
        self.var(SCRIPT_ROOT_VAR, root)
    }

    /// Clear every banner variable
    pub fn clear_banner(self) -> Self {
        self.unset(WIDTH_VAR)
            .unset(TEST_FORMAT_VAR)
            .unset(SCRIPT_ROOT_VAR)
    }

    /// Apply environment variables
    pub fn apply(self) {
        apply_vars(&self.vars);
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        apply_vars(&self.vars);

        EnvGuard {
            previous,
            _lock: lock,
        }
    }
}

fn apply_vars(vars: &[(String, Option<String>)]) {
    for (key, value) in vars {
        match value {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.iter().rev() {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all supported environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {WIDTH_VAR}                              Minimum banner width (default 60)");
    println!("  {TEST_FORMAT_VAR}                        Banner formatter: textbox, markdown, plaintext");
    println!("  {SCRIPT_ROOT_VAR}                        Root directory of the formatter scripts");
    println!("  {ENV_PREFIX}_RESOURCE_PROFILE         Resource profile (embedded, standard)");
    println!("  {ENV_PREFIX}_MAX_VIEW_ENTRIES         Maximum view entries");
    println!("  {ENV_PREFIX}_MAX_SEARCH_RESULTS       Maximum search results");
    println!("  {ENV_PREFIX}_FOSSILIZATION_THRESHOLD  Fossilization threshold (0.0-1.0)");
    println!("  {ENV_PREFIX}_WAL_CHECKPOINT_INTERVAL  WAL checkpoint interval in seconds");
    println!("  {ENV_PREFIX}_LOG_LEVEL                Log level (trace, debug, info, warning, error)");
    println!("  {ENV_PREFIX}_BIND_ADDRESS             Bind address");
    println!("  {ENV_PREFIX}_BIND_PORT                Bind port");
    println!("  {ENV_PREFIX}_ENCRYPTION               Encryption mode");
    println!("  {ENV_PREFIX}_DATA_DIR                 Data directory");
    println!("  {ENV_PREFIX}_CONFIG_DIR               Config directory");
    println!("  {ENV_PREFIX}_LOG_DIR                  Log directory");
    println!();
    println!("Example:");
    println!("  export {TEST_FORMAT_VAR}=markdown");
    println!("  testbanner header \"Core Tests\" memogarden-core run-42");
}
