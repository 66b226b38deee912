#![deny(unsafe_code)]

//! Configuration loading and validation for bzlnav.
//!
//! Loads TOML configuration files and validates them. Provides the
//! [`AppConfig`] type as the central configuration structure shared by the
//! resolver core and the CLI.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root discovery.
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// External build-graph query tool.
    #[serde(default)]
    pub query: QueryConfig,

    /// BUILD file definition lookup.
    #[serde(default)]
    pub definition: DefinitionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Workspace root discovery configuration.
///
/// ## TOML Example
///
/// ```toml
/// [workspace]
/// markers = ["MODULE.bazel", "WORKSPACE"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Marker file names identifying a workspace root, checked in order
    /// within each ancestor directory.
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
        }
    }
}

fn default_markers() -> Vec<String> {
    ["MODULE.bazel", "WORKSPACE.bazel", "WORKSPACE", "REPO.bazel"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Query tool configuration.
///
/// The tool is invoked as `<command...> query <expression> <flags...>` from
/// the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Program and leading arguments (e.g. `["bazel"]` or `["bazelisk"]`).
    #[serde(default = "default_query_command")]
    pub command: Vec<String>,

    /// Flags appended after the query expression.
    #[serde(default = "default_query_flags")]
    pub flags: Vec<String>,

    /// Query timeout in seconds (0 = wait forever).
    #[serde(default = "default_query_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            command: default_query_command(),
            flags: default_query_flags(),
            timeout_secs: default_query_timeout_secs(),
        }
    }
}

impl QueryConfig {
    /// The configured timeout, or `None` when queries may block indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn default_query_command() -> Vec<String> {
    vec!["bazel".to_string()]
}

fn default_query_flags() -> Vec<String> {
    ["--color", "no", "--curses", "no", "--noshow_progress"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_query_timeout_secs() -> u64 {
    30
}

/// Definition lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionConfig {
    /// Build file names to look for in a package directory, in priority order.
    #[serde(default = "default_build_file_names")]
    pub build_file_names: Vec<String>,
}

impl Default for DefinitionConfig {
    fn default() -> Self {
        Self {
            build_file_names: default_build_file_names(),
        }
    }
}

fn default_build_file_names() -> Vec<String> {
    vec!["BUILD.bazel".to_string(), "BUILD".to_string()]
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "warn", "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace.markers.is_empty() {
            return Err(ConfigError::Validation(
                "workspace.markers must list at least one marker file".to_string(),
            ));
        }
        for (i, marker) in self.workspace.markers.iter().enumerate() {
            if marker.is_empty() || marker.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "workspace.markers[{i}] must be a plain file name, got {marker:?}"
                )));
            }
        }

        match self.query.command.first() {
            None => {
                return Err(ConfigError::Validation(
                    "query.command must not be empty".to_string(),
                ));
            }
            Some(program) if program.is_empty() => {
                return Err(ConfigError::Validation(
                    "query.command[0] must name a program".to_string(),
                ));
            }
            Some(_) => {}
        }

        if self.definition.build_file_names.is_empty() {
            return Err(ConfigError::Validation(
                "definition.build_file_names must not be empty".to_string(),
            ));
        }
        if let Some(i) = self
            .definition
            .build_file_names
            .iter()
            .position(|n| n.is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "definition.build_file_names[{i}] must not be empty"
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace", "off"];
        if !valid_levels.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.query.command, vec!["bazel".to_string()]);
        assert_eq!(
            config.query.flags,
            vec!["--color", "no", "--curses", "no", "--noshow_progress"]
        );
        assert_eq!(config.workspace.markers[0], "MODULE.bazel");
        assert!(config.workspace.markers.contains(&"WORKSPACE".to_string()));
        assert_eq!(config.definition.build_file_names, vec!["BUILD.bazel", "BUILD"]);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.query.timeout_secs, 30);
        assert_eq!(config.query.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [workspace]
            markers = ["WORKSPACE"]

            [query]
            command = ["bazelisk", "--output_user_root=/tmp/bz"]
            flags = ["--keep_going"]
            timeout_secs = 0

            [definition]
            build_file_names = ["BUILD"]

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.workspace.markers, vec!["WORKSPACE"]);
        assert_eq!(config.query.command[0], "bazelisk");
        assert_eq!(config.query.flags, vec!["--keep_going"]);
        assert_eq!(config.query.timeout(), None);
        assert_eq!(config.definition.build_file_names, vec!["BUILD"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_empty_markers() {
        let toml = r#"
            [workspace]
            markers = []
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_marker_with_slash() {
        let toml = r#"
            [workspace]
            markers = ["tools/WORKSPACE"]
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_command() {
        let toml = r#"
            [query]
            command = []
        "#;
        assert!(AppConfig::parse(toml).is_err());

        let toml = r#"
            [query]
            command = [""]
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_build_file_name() {
        let toml = r#"
            [definition]
            build_file_names = ["BUILD", ""]
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("build_file_names[1]"));
    }

    #[test]
    fn test_validation_rejects_unknown_log_level() {
        let toml = r#"
            [logging]
            level = "chatty"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let toml = r#"
            [logging]
            level = "DEBUG"
        "#;
        assert!(AppConfig::parse(toml).is_ok());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::parse(&text).unwrap();
        assert_eq!(parsed.query.flags, config.query.flags);
        assert_eq!(parsed.workspace.markers, config.workspace.markers);
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bzlnav.toml");
        tokio::fs::write(&path, b"[query]\ncommand = [\"bazelisk\"]\ntimeout_secs = 5\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.query.command, vec!["bazelisk"]);
        assert_eq!(config.query.timeout(), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/bzlnav.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
