//! Fallback resolution for values the live feed did not report.
//!
//! Current weather can borrow the last reported value from the snapshot
//! history. Forecast days never do: a missing forecast value stays missing and
//! renders as `Err`.

use chrono::{Datelike, Days, NaiveDate};

use crate::store::SnapshotStore;
use crate::types::{DayForecast, DayLabel, FieldKey, ForecastEntry, WeatherSnapshot};

/// Number of days the forecast window aims for
pub const WINDOW_DAYS: usize = 7;

/// Value of `key` from the snapshot, or from the newest snapshot of the same
/// station that reported it. `None` once the history is exhausted.
///
/// Only reads the store, so repeated calls agree.
pub fn resolve_field(
    snapshot: &WeatherSnapshot,
    key: FieldKey,
    store: &SnapshotStore,
) -> Option<String> {
    match snapshot.field(key) {
        Some(value) => Some(value.to_string()),
        None => resolve_from_history(store, &snapshot.station_id, key),
    }
}

/// Like [`resolve_field`] with the key given as the endpoint's field name.
/// Names that are neither weather nor wind attributes resolve to `None`.
pub fn resolve_field_named(
    snapshot: &WeatherSnapshot,
    key: &str,
    store: &SnapshotStore,
) -> Option<String> {
    match key.parse::<FieldKey>() {
        Ok(key) => resolve_field(snapshot, key, store),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    }
}

/// Newest reported value of `key` for `station_id`
pub fn resolve_from_history(
    store: &SnapshotStore,
    station_id: &str,
    key: FieldKey,
) -> Option<String> {
    match store.latest_value(station_id, key) {
        Ok(value) => {
            if value.is_none() {
                tracing::debug!("No reported {} in history for {}", key, station_id);
            }
            value
        }
        Err(e) => {
            tracing::warn!("Failed to scan snapshot history: {}", e);
            None
        }
    }
}

/// Which current-weather fields may fall back to history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPolicy {
    history_fields: Vec<FieldKey>,
}

impl Default for FieldPolicy {
    /// Wind direction and wind power only
    fn default() -> Self {
        Self {
            history_fields: vec![FieldKey::WindDirection, FieldKey::WindPower],
        }
    }
}

impl FieldPolicy {
    pub fn new(history_fields: impl IntoIterator<Item = FieldKey>) -> Self {
        let mut fields: Vec<FieldKey> = Vec::new();
        for key in history_fields {
            if !fields.contains(&key) {
                fields.push(key);
            }
        }
        Self {
            history_fields: fields,
        }
    }

    /// Build from configured field names, logging and dropping unknown ones
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().filter_map(|name| {
            match name.as_ref().parse::<FieldKey>() {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!("Ignoring history field: {}", e);
                    None
                }
            }
        }))
    }

    pub fn uses_history(&self, key: FieldKey) -> bool {
        self.history_fields.contains(&key)
    }

    /// Value to display for `key` under this policy
    pub fn resolve(
        &self,
        snapshot: &WeatherSnapshot,
        key: FieldKey,
        store: &SnapshotStore,
    ) -> Option<String> {
        if self.uses_history(key) {
            resolve_field(snapshot, key, store)
        } else {
            snapshot.field(key).map(str::to_string)
        }
    }
}

/// The forecast rows for `today` and the days after it.
///
/// Starts at the entry dated `today` and takes up to [`WINDOW_DAYS`]
/// consecutive entries, accepting a shorter tail when the series ends early.
/// Without an entry for `today` every row is a placeholder.
pub fn resolve_forecast_window(series: &[ForecastEntry], today: NaiveDate) -> Vec<DayForecast> {
    let Some(start) = series.iter().position(|e| e.date == Some(today)) else {
        tracing::debug!("Forecast has no entry for {}", today);
        return placeholder_window(today);
    };

    for days in (1..=WINDOW_DAYS).rev() {
        if let Some(window) = series.get(start..start + days) {
            return window
                .iter()
                .enumerate()
                .map(|(offset, entry)| {
                    let date = entry.date.unwrap_or_else(|| day_after(today, offset));
                    let label = if offset == 0 {
                        DayLabel::Today
                    } else {
                        DayLabel::Weekday(date.weekday())
                    };
                    DayForecast {
                        label,
                        date,
                        max_temp: entry.max_temp.clone(),
                        min_temp: entry.min_temp.clone(),
                        day_text: entry.day_text.clone(),
                        night_text: entry.night_text.clone(),
                    }
                })
                .collect();
        }
    }

    placeholder_window(today)
}

/// Seven unknown days labelled by weekday, starting at `today`
fn placeholder_window(today: NaiveDate) -> Vec<DayForecast> {
    (0..WINDOW_DAYS)
        .map(|offset| {
            let date = day_after(today, offset);
            DayForecast::placeholder(DayLabel::Weekday(date.weekday()), date)
        })
        .collect()
}

fn day_after(today: NaiveDate, offset: usize) -> NaiveDate {
    today + Days::new(offset as u64)
}
