//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: ACTON_WINSTON_, `__` separates sections)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/acton-winston/{service_name}/config.toml
//! 4. System directory: /etc/acton-winston/{service_name}/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Provider,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ACTON_WINSTON_";

/// Payload shaping flags
///
/// Fixed at registration time and copied into every event context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Attach event tags to the log line
    pub include_tags: bool,

    /// Attach non-string event data to the log line
    pub include_data: bool,

    /// Merge object data into the top level instead of nesting it
    pub merge_data: bool,

    /// Skip events that carry nothing worth logging
    pub skip_undefined: bool,

    /// Separator used to join tags into one string
    pub join_tags: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include_tags: false,
            include_data: true,
            merge_data: false,
            skip_undefined: true,
            join_tags: None,
        }
    }
}

impl Settings {
    /// Extract settings from a provider, filling anything it leaves out with defaults
    ///
    /// Values supplied by `provider` always win over the defaults.
    pub fn extract(provider: impl Provider) -> Result<Self> {
        let settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(provider)
            .extract()?;
        Ok(settings)
    }

    /// Enable or disable tag inclusion
    pub fn with_include_tags(mut self, enabled: bool) -> Self {
        self.include_tags = enabled;
        self
    }

    /// Enable or disable data inclusion
    pub fn with_include_data(mut self, enabled: bool) -> Self {
        self.include_data = enabled;
        self
    }

    /// Enable or disable merging object data into the top level
    pub fn with_merge_data(mut self, enabled: bool) -> Self {
        self.merge_data = enabled;
        self
    }

    /// Enable or disable skipping events without loggable data
    pub fn with_skip_undefined(mut self, enabled: bool) -> Self {
        self.skip_undefined = enabled;
        self
    }

    /// Join tags with `separator`
    pub fn with_join_tags(mut self, separator: impl Into<String>) -> Self {
        self.join_tags = Some(separator.into());
        self
    }
}

/// Output configuration for the crate's own tracing subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive (trace, debug, info, warn, error or an EnvFilter expression)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Plugin shaping flags
    #[serde(default)]
    pub plugin: Settings,

    /// Tracing output
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the running binary.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "acton-winston".to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so higher priority files override
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Config file locations for a service, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("acton-winston");
        if let Some(path) = xdg_dirs.find_config_file(Path::new(service_name).join("config.toml")) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc/acton-winston")
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.include_tags);
        assert!(settings.include_data);
        assert!(!settings.merge_data);
        assert!(settings.skip_undefined);
        assert_eq!(settings.join_tags, None);
    }

    #[test]
    fn test_caller_values_win_over_defaults() {
        let settings = Settings::extract(Toml::string(
            r#"
            include_tags = true
            skip_undefined = false
            join_tags = ","
            "#,
        ))
        .unwrap();

        assert!(settings.include_tags);
        assert!(!settings.skip_undefined);
        assert_eq!(settings.join_tags.as_deref(), Some(","));
        // untouched keys keep their defaults
        assert!(settings.include_data);
        assert!(!settings.merge_data);
    }

    #[test]
    fn test_extract_rejects_wrong_types() {
        let result = Settings::extract(Toml::string("include_tags = \"yes please\""));
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_builder_pattern() {
        let settings = Settings::default()
            .with_include_tags(true)
            .with_include_data(false)
            .with_merge_data(true)
            .with_skip_undefined(false)
            .with_join_tags("|");

        assert!(settings.include_tags);
        assert!(!settings.include_data);
        assert!(settings.merge_data);
        assert!(!settings.skip_undefined);
        assert_eq!(settings.join_tags.as_deref(), Some("|"));
    }

    #[test]
    fn test_load_from_file() {
        // inside a jail so env overrides set by other tests cannot leak in
        Jail::expect_with(|_jail| {
            let mut file = tempfile::NamedTempFile::new().expect("temp file");
            writeln!(
                file,
                "[plugin]\ninclude_tags = true\njoin_tags = \" \"\n\n[log]\nlevel = \"debug\"\njson = false"
            )
            .expect("write config");

            let config = Config::load_from(file.path()).expect("config loads");
            assert!(config.plugin.include_tags);
            assert_eq!(config.plugin.join_tags.as_deref(), Some(" "));
            assert!(config.plugin.include_data);
            assert_eq!(config.log.level, "debug");
            assert!(!config.log.json);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("winston.toml", "[plugin]\ninclude_data = true")?;
            jail.set_env("ACTON_WINSTON_PLUGIN__INCLUDE_DATA", "false");
            jail.set_env("ACTON_WINSTON_LOG__LEVEL", "warn");

            let config = Config::load_from("winston.toml").expect("config loads");
            assert!(!config.plugin.include_data);
            assert_eq!(config.log.level, "warn");
            Ok(())
        });
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.plugin, Settings::default());
        assert_eq!(config.log.level, "info");
        assert!(config.log.json);
    }
}
