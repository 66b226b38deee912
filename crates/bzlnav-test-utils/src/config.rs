//! Configuration builders for tests.

use bzlnav_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .query_command(&["sh", "-c", "echo //pkg:foo", "sh"])
///     .query_timeout_secs(2)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn markers(mut self, markers: &[&str]) -> Self {
        self.config.workspace.markers = markers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn query_command(mut self, command: &[&str]) -> Self {
        self.config.query.command = command.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn query_flags(mut self, flags: &[&str]) -> Self {
        self.config.query.flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn query_timeout_secs(mut self, secs: u64) -> Self {
        self.config.query.timeout_secs = secs;
        self
    }

    pub fn build_file_names(mut self, names: &[&str]) -> Self {
        self.config.definition.build_file_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }

    /// Render the configuration as TOML, for tests that go through a file.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(&self.config).expect("config serializes to TOML")
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
