use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{AppError, Config, ConfigError};

/// Application state and lifecycle: owns the config and where it came from.
///
/// The config is loaded once and handed out by reference; a reload swaps in a
/// complete new `Config` or leaves the current one untouched.
pub struct App {
    config_path: PathBuf,
    config: Arc<Config>,
}

impl App {
    /// Load (or create) the config at `config_path` and validate it
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let (config, _) = Config::load_validated_from(&config_path)?;

        tracing::info!(
            "Loaded config from {} (station {})",
            config_path.display(),
            config.station_id
        );

        Ok(Self {
            config_path,
            config: Arc::new(config),
        })
    }

    /// Build an app around an already loaded config
    pub fn with_config(config_path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            config_path: config_path.into(),
            config: Arc::new(config),
        }
    }

    /// Re-read the config file.
    ///
    /// A missing file is regenerated with defaults. On a parse or validation
    /// failure the current config is kept and the error returned.
    pub fn reload(&mut self) -> Result<Arc<Config>, AppError> {
        let config = Config::load_from(&self.config_path)
            .map_err(|e| ConfigError::ParseError(format!("{:#}", e)))?;

        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }
        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        tracing::info!("Configuration reloaded from {}", self.config_path.display());
        self.config = Arc::new(config);
        Ok(self.config.clone())
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down Lotus sidebar");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the current config
    pub fn config_arc(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Path of the backing config file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory weather snapshots are written to
    pub fn snapshot_dir(&self) -> PathBuf {
        self.config.effective_snapshot_dir(&self.config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let app = App::new(&path).unwrap();
        assert_eq!(app.config().station_id, "rwUnO");
        assert_eq!(app.snapshot_dir(), dir.path().join("WeatherJson"));
    }

    #[test]
    fn test_reload_picks_up_new_station() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = App::new(&path).unwrap();

        let edited = Config {
            station_id: "Wqsps".to_string(),
            ..Config::default()
        };
        edited.save_to(&path).unwrap();

        let config = app.reload().unwrap();
        assert_eq!(config.station_id, "Wqsps");
        assert_eq!(app.config().station_id, "Wqsps");
    }

    #[test]
    fn test_reload_keeps_config_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = App::new(&path).unwrap();

        std::fs::write(&path, "{ \"stationid\": ").unwrap();

        let err = app.reload().unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::ParseError(_))));
        assert_eq!(app.config().station_id, "rwUnO");
    }

    #[test]
    fn test_reload_keeps_config_on_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = App::new(&path).unwrap();

        std::fs::write(&path, r#"{ "stationid": "", "quote_font_size": 0 }"#).unwrap();

        let err = app.reload().unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::Invalid(_))));
        assert_eq!(app.config().quote_font_size, 32);
    }

    #[test]
    fn test_reload_regenerates_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = App::new(&path).unwrap();

        std::fs::remove_file(&path).unwrap();
        app.reload().unwrap();
        assert!(path.exists());
    }
}
