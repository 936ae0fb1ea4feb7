use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Value the weather endpoint uses for "not reported"
pub const SENTINEL: &str = "9999";

/// Text shown in place of a value nobody could provide
pub const ERR_MARKER: &str = "Err";

/// Decode one upstream scalar, mapping the sentinel (string or number) to `None`
pub fn reported_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim() == SENTINEL => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_i64() == Some(9999) || n.as_f64() == Some(9999.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn reported<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(reported_text))
}

// Wire format of the station endpoint. Only the paths the sidebar reads are
// declared; `data.real.{station,weather,wind}` must be present.

#[derive(Debug, Deserialize)]
struct Payload {
    data: PayloadData,
}

#[derive(Debug, Deserialize)]
struct PayloadData {
    real: Real,
    #[serde(default)]
    air: Option<Air>,
    #[serde(default)]
    tempchart: Vec<TempChartEntry>,
}

#[derive(Debug, Deserialize)]
struct Real {
    station: Station,
    weather: WeatherFields,
    wind: WindFields,
    #[serde(default)]
    warn: Option<Warn>,
}

#[derive(Debug, Deserialize)]
struct Station {
    #[serde(default, deserialize_with = "reported")]
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherFields {
    #[serde(default, deserialize_with = "reported")]
    temperature: Option<String>,
    #[serde(default, deserialize_with = "reported")]
    humidity: Option<String>,
    #[serde(default, deserialize_with = "reported")]
    rain: Option<String>,
    #[serde(default, deserialize_with = "reported")]
    feelst: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WindFields {
    #[serde(default, deserialize_with = "reported")]
    direct: Option<String>,
    #[serde(default, deserialize_with = "reported")]
    power: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Air {
    #[serde(default, deserialize_with = "reported")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Warn {
    #[serde(default, deserialize_with = "reported")]
    alert: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TempChartEntry {
    #[serde(default)]
    time: String,
    #[serde(default, deserialize_with = "reported")]
    max_temp: Option<String>,
    #[serde(default, deserialize_with = "reported")]
    min_temp: Option<String>,
    #[serde(default, deserialize_with = "reported")]
    day_text: Option<String>,
    #[serde(default, deserialize_with = "reported")]
    night_text: Option<String>,
}

/// Parse a forecast date as sent by the endpoint (`yyyy/MM/dd`)
pub fn parse_forecast_date(time: &str) -> Option<NaiveDate> {
    let time = time.trim();
    NaiveDate::parse_from_str(time, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(time, "%Y-%m-%d"))
        .ok()
}

/// One day of the upstream forecast series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// `None` when the upstream date could not be parsed
    pub date: Option<NaiveDate>,
    pub max_temp: Option<String>,
    pub min_temp: Option<String>,
    pub day_text: Option<String>,
    pub night_text: Option<String>,
}

/// Everything one fetch returned for one station.
///
/// `None` means the endpoint reported the sentinel or left the field out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub station_id: String,
    pub fetched_at: NaiveDateTime,
    pub city: Option<String>,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub wind_direction: Option<String>,
    pub wind_power: Option<String>,
    pub air_quality: Option<String>,
    pub rain: Option<String>,
    pub feels_like: Option<String>,
    pub alert: Option<String>,
    pub forecast: Vec<ForecastEntry>,
}

impl WeatherSnapshot {
    /// Build a snapshot from a raw endpoint payload
    pub fn from_value(
        station_id: &str,
        fetched_at: NaiveDateTime,
        payload: &Value,
    ) -> Result<Self, WeatherError> {
        let payload =
            Payload::deserialize(payload).map_err(|e| WeatherError::Parse(e.to_string()))?;
        let PayloadData {
            real,
            air,
            tempchart,
        } = payload.data;

        let forecast = tempchart
            .into_iter()
            .map(|day| ForecastEntry {
                date: parse_forecast_date(&day.time),
                max_temp: day.max_temp,
                min_temp: day.min_temp,
                day_text: day.day_text,
                night_text: day.night_text,
            })
            .collect();

        Ok(Self {
            station_id: station_id.to_string(),
            fetched_at,
            city: real.station.city,
            temperature: real.weather.temperature,
            humidity: real.weather.humidity,
            wind_direction: real.wind.direct,
            wind_power: real.wind.power,
            air_quality: air.and_then(|a| a.text),
            rain: real.weather.rain,
            feels_like: real.weather.feelst,
            alert: real.warn.and_then(|w| w.alert),
            forecast,
        })
    }

    /// Build a snapshot from a raw JSON body
    pub fn from_json(
        station_id: &str,
        fetched_at: NaiveDateTime,
        body: &str,
    ) -> Result<Self, WeatherError> {
        let payload: Value =
            serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))?;
        Self::from_value(station_id, fetched_at, &payload)
    }

    /// Reported value of a current-weather field
    pub fn field(&self, key: FieldKey) -> Option<&str> {
        let value = match key {
            FieldKey::Temperature => &self.temperature,
            FieldKey::Humidity => &self.humidity,
            FieldKey::Rain => &self.rain,
            FieldKey::FeelsLike => &self.feels_like,
            FieldKey::WindDirection => &self.wind_direction,
            FieldKey::WindPower => &self.wind_power,
        };
        value.as_deref()
    }
}

/// Which upstream object a field lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    Weather,
    Wind,
}

/// Current-weather fields that can be looked up by key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Temperature,
    Humidity,
    Rain,
    FeelsLike,
    WindDirection,
    WindPower,
}

impl FieldKey {
    pub const ALL: [FieldKey; 6] = [
        FieldKey::Temperature,
        FieldKey::Humidity,
        FieldKey::Rain,
        FieldKey::FeelsLike,
        FieldKey::WindDirection,
        FieldKey::WindPower,
    ];

    /// Key used by the endpoint
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Rain => "rain",
            Self::FeelsLike => "feelst",
            Self::WindDirection => "direct",
            Self::WindPower => "power",
        }
    }

    pub fn group(&self) -> FieldGroup {
        match self {
            Self::WindDirection | Self::WindPower => FieldGroup::Wind,
            _ => FieldGroup::Weather,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FieldKey {
    type Err = UnknownField;

    /// Accepts the endpoint's keys and the snake_case variant names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "temperature" => Ok(Self::Temperature),
            "humidity" => Ok(Self::Humidity),
            "rain" => Ok(Self::Rain),
            "feelst" | "feels_like" => Ok(Self::FeelsLike),
            "direct" | "wind_direction" => Ok(Self::WindDirection),
            "power" | "wind_power" => Ok(Self::WindPower),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// Heading of one forecast row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Weekday(Weekday),
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayLabel::Today => f.write_str("Today"),
            DayLabel::Weekday(day) => write!(f, "{}", day),
        }
    }
}

/// A forecast day ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct DayForecast {
    pub label: DayLabel,
    pub date: NaiveDate,
    pub max_temp: Option<String>,
    pub min_temp: Option<String>,
    pub day_text: Option<String>,
    pub night_text: Option<String>,
}

impl DayForecast {
    /// Row with every value unknown
    pub fn placeholder(label: DayLabel, date: NaiveDate) -> Self {
        Self {
            label,
            date,
            max_temp: None,
            min_temp: None,
            day_text: None,
            night_text: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.max_temp.is_none()
            && self.min_temp.is_none()
            && self.day_text.is_none()
            && self.night_text.is_none()
    }

    /// `{label} {max}°C/{min}°C {day}/{night}` with `Err` for unknowns
    pub fn line(&self) -> String {
        format!(
            "{} {}°C/{}°C {}/{}",
            self.label,
            or_err(&self.max_temp),
            or_err(&self.min_temp),
            or_err(&self.day_text),
            or_err(&self.night_text),
        )
    }
}

/// Display text for an optional value
pub fn or_err(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(ERR_MARKER)
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown weather field: {0}")]
pub struct UnknownField(pub String);

/// Snapshot directory errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather endpoint returned HTTP {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),
}

impl WeatherError {
    /// True when the failure means "no update this cycle" rather than a local fault
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status(_))
    }
}
