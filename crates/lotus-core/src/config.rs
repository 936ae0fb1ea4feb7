use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV_VAR: &str = "LOTUS_CONFIG";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Sidebar colour theme.
///
/// Stored upper-case in the file; any value other than `LIGHT` or `DARK`
/// (in any case) falls back to `AUTO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

impl From<String> for Theme {
    fn from(value: String) -> Self {
        match value.to_uppercase().as_str() {
            "LIGHT" => Theme::Light,
            "DARK" => Theme::Dark,
            _ => Theme::Auto,
        }
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Auto => "AUTO",
            Theme::Light => "LIGHT",
            Theme::Dark => "DARK",
        }
        .to_string()
    }
}

/// The subset of the config a front end needs to style the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub theme: Theme,
    /// `None` when the theme's own background should be used
    pub custom_color: Option<String>,
    pub date_time_font_size: u32,
    pub quote_font_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Colour theme
    #[serde(default)]
    pub theme: Theme,

    /// Background colour override, or "AUTO"
    #[serde(default = "default_custom_color")]
    pub custom_color: String,

    /// Point size of the clock
    #[serde(default = "default_date_time_font_size")]
    pub date_time_font_size: u32,

    /// Point size of the quote
    #[serde(default = "default_quote_font_size")]
    pub quote_font_size: u32,

    /// Weather station identifier sent to the weather endpoint
    #[serde(rename = "stationid", default = "default_station_id")]
    pub station_id: String,

    /// Weather endpoint; the station id is appended as `?stationid=`
    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    /// Plain-text quote endpoint
    #[serde(default = "default_quote_url")]
    pub quote_url: String,

    /// Where weather snapshots are written.
    /// Defaults to `WeatherJson/` next to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,

    /// Weather refresh period in minutes, aligned to half-hour boundaries
    #[serde(default = "default_refresh_minutes")]
    pub weather_refresh_minutes: u32,

    /// Quote refresh period in minutes
    #[serde(default = "default_refresh_minutes")]
    pub quote_refresh_minutes: u32,

    /// Current-weather fields that fall back to the most recent reported
    /// value in the snapshot history when the live feed has none
    #[serde(default = "default_history_fields")]
    pub history_fields: Vec<String>,
}

fn default_custom_color() -> String {
    "AUTO".to_string()
}

fn default_date_time_font_size() -> u32 {
    48
}

fn default_quote_font_size() -> u32 {
    32
}

fn default_station_id() -> String {
    "rwUnO".to_string()
}

fn default_weather_url() -> String {
    "http://www.nmc.cn/rest/weather".to_string()
}

fn default_quote_url() -> String {
    "https://v1.hitokoto.cn/?c=a&c=c&c=d&c=e&c=f&c=g&c=h&c=i&c=j&c=k&c=l&encode=text".to_string()
}

fn default_refresh_minutes() -> u32 {
    30
}

fn default_history_fields() -> Vec<String> {
    vec!["direct".to_string(), "power".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::Auto,
            custom_color: default_custom_color(),
            date_time_font_size: default_date_time_font_size(),
            quote_font_size: default_quote_font_size(),
            station_id: default_station_id(),
            weather_url: default_weather_url(),
            quote_url: default_quote_url(),
            snapshot_dir: None,
            weather_refresh_minutes: default_refresh_minutes(),
            quote_refresh_minutes: default_refresh_minutes(),
            history_fields: default_history_fields(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, writing the defaults there first if
    /// the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.station_id.trim().is_empty() {
            result.add_error("stationid", "Station id must not be empty");
        } else if self.station_id.contains(['/', '\\']) {
            result.add_error("stationid", "Station id must not contain path separators");
        }

        self.validate_url(&self.weather_url, "weather_url", &mut result);
        self.validate_url(&self.quote_url, "quote_url", &mut result);

        Self::validate_font_size(self.date_time_font_size, "date_time_font_size", &mut result);
        Self::validate_font_size(self.quote_font_size, "quote_font_size", &mut result);

        Self::validate_refresh(
            self.weather_refresh_minutes,
            "weather_refresh_minutes",
            &mut result,
        );
        Self::validate_refresh(
            self.quote_refresh_minutes,
            "quote_refresh_minutes",
            &mut result,
        );

        if self.custom_color().is_some() && !is_plausible_color(&self.custom_color) {
            result.add_warning(
                "custom_color",
                format!("Unrecognised colour '{}', it may be ignored", self.custom_color),
            );
        }

        if self.history_fields.is_empty() {
            result.add_warning(
                "history_fields",
                "History fallback disabled, missing values will show as Err",
            );
        }

        result
    }

    fn validate_font_size(size: u32, field: &str, result: &mut ValidationResult) {
        if size == 0 {
            result.add_error(field, "Font size must be greater than 0");
        } else if size > 200 {
            result.add_warning(field, "Font size is unusually large (>200)");
        }
    }

    fn validate_refresh(minutes: u32, field: &str, result: &mut ValidationResult) {
        if minutes == 0 {
            result.add_error(field, "Refresh interval must be at least 1 minute");
        } else if minutes > 1440 {
            result.add_warning(field, "Refresh interval is more than 24 hours");
        }
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Custom background colour, or `None` for "AUTO"
    pub fn custom_color(&self) -> Option<&str> {
        let color = self.custom_color.trim();
        if color.is_empty() || color.eq_ignore_ascii_case("AUTO") {
            None
        } else {
            Some(color)
        }
    }

    /// Styling handed to the front end
    pub fn display(&self) -> DisplaySettings {
        DisplaySettings {
            theme: self.theme,
            custom_color: self.custom_color().map(str::to_string),
            date_time_font_size: self.date_time_font_size,
            quote_font_size: self.quote_font_size,
        }
    }

    /// Snapshot directory to use given where the config file lives
    pub fn effective_snapshot_dir(&self, config_path: &Path) -> PathBuf {
        match &self.snapshot_dir {
            Some(dir) => dir.clone(),
            None => config_path
                .parent()
                .map(|p| p.join("WeatherJson"))
                .unwrap_or_else(|| PathBuf::from("WeatherJson")),
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Resolve the config file location: explicit argument, then
    /// `LOTUS_CONFIG`, then the platform config directory
    pub fn resolve_path(explicit: Option<String>) -> Result<PathBuf> {
        if let Some(path) = explicit.filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("lotus-sidebar");

        Ok(config_dir.join("config.json"))
    }
}

/// Accepts `#rgb`, `#rrggbb`, `#aarrggbb` and bare colour names
fn is_plausible_color(value: &str) -> bool {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else {
        !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic())
    }
}
