//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tf_core::DateRange;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Refresh period of the tracker display, in milliseconds.
    pub tick_ms: u64,
    /// Due-date window used by `task list` and `report` without `--range`.
    #[serde(default)]
    pub default_range: DateRange,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("tick_ms", &self.tick_ms)
            .field("default_range", &self.default_range)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("taskflow.db"),
            tick_ms: 1000,
            default_range: DateRange::All,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources override earlier ones: defaults, the platform config
    /// file, `config_path`, then `TF_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("TF_"));

        figment.extract()
    }

    /// Tick period for trackers, never below one millisecond.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Returns the platform-specific config directory for taskflow.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("taskflow"))
}

/// Returns the platform-specific data directory for taskflow.
///
/// On Linux: `~/.local/share/taskflow`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("taskflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_dirs_data_path_ends_with_taskflow() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "taskflow");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("taskflow.db"));
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert_eq!(config.default_range, DateRange::All);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"database_path = "/tmp/other.db""#).unwrap();
        writeln!(file, "tick_ms = 250").unwrap();
        writeln!(file, r#"default_range = "quarter""#).unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.tick_period(), Duration::from_millis(250));
        assert_eq!(config.default_range, DateRange::Quarter);
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let config = Config {
            tick_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.tick_period(), Duration::from_millis(1));
    }
}
