//! Configuration management for previewd.
//!
//! All settings load from environment variables with sensible defaults, so
//! the service runs out of the box against a locally installed Flutter SDK.
//!
//! # Environment Variables
//!
//! - `PORT`: listening port - default: 8080
//! - `PREVIEWD_TMP_ROOT`: root for staging directories - default: system temp dir
//! - `PREVIEWD_PUBLIC_ROOT`: web-served root for published previews - default: "public"
//! - `PREVIEWD_DEPS_CMD`: best-effort dependency-resolution command - default: "flutter pub get"
//! - `PREVIEWD_BUILD_CMD`: release-build command - default: "flutter build web --release"
//! - `PREVIEWD_ARTIFACT_DIR`: artifact tree the build produces, relative to the
//!   staging directory - default: "build/web"
//! - `PREVIEWD_ENTRY_FILE`: preview entry file inside the artifact tree - default: "index.html"
//! - `PREVIEWD_DEPS_OUTPUT_LIMIT`: captured-output ceiling for the dependency
//!   step, in bytes - default: 200 MiB
//! - `PREVIEWD_BUILD_OUTPUT_LIMIT`: captured-output ceiling for the build
//!   step, in bytes - default: 400 MiB
//! - `PREVIEWD_BODY_LIMIT`: maximum request body size, in bytes - default: 500 MiB
//! - `PREVIEWD_LOG_LEVEL`: logging level - default: "info"

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Default values for configuration
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PUBLIC_ROOT: &str = "public";
const DEFAULT_DEPS_CMD: &str = "flutter pub get";
const DEFAULT_BUILD_CMD: &str = "flutter build web --release";
const DEFAULT_ARTIFACT_DIR: &str = "build/web";
const DEFAULT_ENTRY_FILE: &str = "index.html";
const DEFAULT_DEPS_OUTPUT_LIMIT: u64 = 200 * 1024 * 1024;
const DEFAULT_BUILD_OUTPUT_LIMIT: u64 = 400 * 1024 * 1024;
const DEFAULT_BODY_LIMIT: usize = 500 * 1024 * 1024;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse a configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime configuration for the build-and-preview service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub port: u16,

    /// Root directory under which per-build staging directories are created.
    pub tmp_root: PathBuf,

    /// Root directory served statically; published previews live under
    /// `<public_root>/preview/<project_id>`.
    pub public_root: PathBuf,

    /// Dependency-resolution command, run best-effort before the build.
    pub deps_cmd: String,

    /// Release-build command. Must succeed and produce the artifact tree.
    pub build_cmd: String,

    /// Path of the artifact tree the build produces, relative to the
    /// staging directory.
    pub artifact_dir: PathBuf,

    /// Entry file of the published preview, used to compute the preview URL.
    pub entry_file: String,

    /// Captured-output ceiling for the dependency step, in bytes.
    pub deps_output_limit: u64,

    /// Captured-output ceiling for the build step, in bytes.
    pub build_output_limit: u64,

    /// Maximum accepted request body size, in bytes.
    pub body_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tmp_root: env::temp_dir(),
            public_root: PathBuf::from(DEFAULT_PUBLIC_ROOT),
            deps_cmd: DEFAULT_DEPS_CMD.to_string(),
            build_cmd: DEFAULT_BUILD_CMD.to_string(),
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            entry_file: DEFAULT_ENTRY_FILE.to_string(),
            deps_output_limit: DEFAULT_DEPS_OUTPUT_LIMIT,
            build_output_limit: DEFAULT_BUILD_OUTPUT_LIMIT,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = parse_env::<u16>("PORT")? {
            config.port = port;
        }
        if let Some(root) = env_var("PREVIEWD_TMP_ROOT") {
            config.tmp_root = PathBuf::from(root);
        }
        if let Some(root) = env_var("PREVIEWD_PUBLIC_ROOT") {
            config.public_root = PathBuf::from(root);
        }
        if let Some(cmd) = env_var("PREVIEWD_DEPS_CMD") {
            config.deps_cmd = cmd;
        }
        if let Some(cmd) = env_var("PREVIEWD_BUILD_CMD") {
            config.build_cmd = cmd;
        }
        if let Some(dir) = env_var("PREVIEWD_ARTIFACT_DIR") {
            config.artifact_dir = PathBuf::from(dir);
        }
        if let Some(file) = env_var("PREVIEWD_ENTRY_FILE") {
            config.entry_file = file;
        }
        if let Some(limit) = parse_env::<u64>("PREVIEWD_DEPS_OUTPUT_LIMIT")? {
            config.deps_output_limit = limit;
        }
        if let Some(limit) = parse_env::<u64>("PREVIEWD_BUILD_OUTPUT_LIMIT")? {
            config.build_output_limit = limit;
        }
        if let Some(limit) = parse_env::<usize>("PREVIEWD_BODY_LIMIT")? {
            config.body_limit = limit;
        }

        Ok(config)
    }

    /// Validates invariants that `from_env` cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build_cmd.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "build command must not be empty".to_string(),
            ));
        }
        if self.artifact_dir.is_absolute() {
            return Err(ConfigError::ValidationFailed(format!(
                "artifact dir must be relative to the staging directory, got {}",
                self.artifact_dir.display()
            )));
        }
        if self.entry_file.is_empty() || self.entry_file.contains('/') {
            return Err(ConfigError::ValidationFailed(format!(
                "entry file must be a bare file name, got {:?}",
                self.entry_file
            )));
        }
        Ok(())
    }
}

/// Reads an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Reads and parses an environment variable, treating empty values as unset.
fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| ConfigError::ParseError {
            field: name.to_string(),
            error: e.to_string(),
        }),
    }
}
