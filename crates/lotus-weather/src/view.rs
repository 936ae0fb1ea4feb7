//! Current-weather view-model: what the sidebar shows after fallback
//! resolution, independent of how it is drawn.

use chrono::NaiveDate;

use crate::resolve::{resolve_forecast_window, FieldPolicy};
use crate::store::SnapshotStore;
use crate::types::{or_err, DayForecast, FieldKey, WeatherSnapshot};

/// Marker that ends the headline of an upstream warning
const SIGNAL_MARKER: &str = "信号";

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub city: Option<String>,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub wind_direction: Option<String>,
    pub wind_power: Option<String>,
    pub air_quality: Option<String>,
    pub rain: Option<String>,
    pub feels_like: Option<String>,
    pub alert: Option<String>,
    pub forecast: Vec<DayForecast>,
}

impl WeatherView {
    /// Resolve every displayed value of `snapshot` for `today`
    pub fn build(
        snapshot: &WeatherSnapshot,
        store: &SnapshotStore,
        policy: &FieldPolicy,
        today: NaiveDate,
    ) -> Self {
        let field = |key| policy.resolve(snapshot, key, store);

        Self {
            city: snapshot.city.clone(),
            temperature: field(FieldKey::Temperature),
            humidity: field(FieldKey::Humidity),
            wind_direction: field(FieldKey::WindDirection),
            wind_power: field(FieldKey::WindPower),
            air_quality: snapshot.air_quality.clone(),
            rain: field(FieldKey::Rain),
            feels_like: field(FieldKey::FeelsLike),
            alert: snapshot.alert.as_deref().map(alert_headline),
            forecast: resolve_forecast_window(&snapshot.forecast, today),
        }
    }

    /// Sidebar rows, top to bottom
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{} {}°C Humidity: {}% Wind: {} {}",
                or_err(&self.city),
                or_err(&self.temperature),
                or_err(&self.humidity),
                or_err(&self.wind_direction),
                or_err(&self.wind_power),
            ),
            format!(
                "Air: {} Rain: {}mm Feels like: {}°C",
                or_err(&self.air_quality),
                or_err(&self.rain),
                or_err(&self.feels_like),
            ),
        ];

        if let Some(alert) = &self.alert {
            lines.push(alert.clone());
        }

        lines.extend(self.forecast.iter().map(DayForecast::line));
        lines
    }
}

/// Shorten a warning to its headline, ending at the first signal marker
pub fn alert_headline(alert: &str) -> String {
    match alert.find(SIGNAL_MARKER) {
        Some(pos) => alert[..pos + SIGNAL_MARKER.len()].to_string(),
        None => alert.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn at(hour: u32) -> NaiveDateTime {
        today().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn payload(direct: &str, alert: Option<&str>) -> serde_json::Value {
        let mut payload = json!({
            "data": {
                "real": {
                    "station": { "city": "广州" },
                    "weather": { "temperature": 31.2, "humidity": 9999, "rain": 0.5, "feelst": 35.0 },
                    "wind": { "direct": direct, "power": "微风" }
                },
                "air": { "text": "良" },
                "tempchart": [
                    { "time": "2024/06/03", "max_temp": 33, "min_temp": 26, "day_text": "雷阵雨", "night_text": "多云" },
                    { "time": "2024/06/04", "max_temp": 32, "min_temp": 26, "day_text": "阵雨", "night_text": "阵雨" }
                ]
            }
        });
        if let Some(alert) = alert {
            payload["data"]["real"]["warn"] = json!({ "alert": alert });
        }
        payload
    }

    #[test]
    fn test_alert_headline() {
        assert_eq!(
            alert_headline("广州市气象台发布暴雨黄色预警信号[III级/较重]，请注意防范"),
            "广州市气象台发布暴雨黄色预警信号"
        );
        assert_eq!(alert_headline(" Heat advisory "), "Heat advisory");
    }

    #[test]
    fn test_lines_with_history_and_alert() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.save("gz", at(8), &payload("东南风", None)).unwrap();
        let body = payload("9999", Some("广州市气象台发布暴雨黄色预警信号[III级]"));
        store.save("gz", at(10), &body).unwrap();
        let snapshot = WeatherSnapshot::from_value("gz", at(10), &body).unwrap();

        let view = WeatherView::build(&snapshot, &store, &FieldPolicy::default(), today());
        let lines = view.lines();

        assert_eq!(lines[0], "广州 31.2°C Humidity: Err% Wind: 东南风 微风");
        assert_eq!(lines[1], "Air: 良 Rain: 0.5mm Feels like: 35.0°C");
        assert_eq!(lines[2], "广州市气象台发布暴雨黄色预警信号");
        assert_eq!(lines[3], "Today 33°C/26°C 雷阵雨/多云");
        assert_eq!(lines[4], "Tue 32°C/26°C 阵雨/阵雨");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_lines_without_alert_or_forecast_for_today() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let body = payload("北风", None);
        let snapshot = WeatherSnapshot::from_value("gz", at(10), &body).unwrap();
        // a Monday the forecast does not cover
        let later = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        let view = WeatherView::build(&snapshot, &store, &FieldPolicy::default(), later);
        let lines = view.lines();

        assert_eq!(lines.len(), 2 + 7);
        assert_eq!(lines[2], "Mon Err°C/Err°C Err/Err");
    }
}
