use chrono::{Local, NaiveDateTime};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::store::SnapshotStore;
use crate::types::{WeatherError, WeatherSnapshot};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Fetches station observations and records each one in the snapshot store
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    store: SnapshotStore,
}

impl WeatherProvider {
    /// `base_url` is the station endpoint; the station id is sent as the
    /// `stationid` query parameter
    pub fn new(base_url: impl Into<String>, store: SnapshotStore) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into(),
            store,
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch current observations for `station_id`, stamped with local time
    pub async fn fetch(&self, station_id: &str) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_at(station_id, Local::now().naive_local()).await
    }

    /// Fetch and record the snapshot as taken at `fetched_at`.
    ///
    /// Non-success statuses fail without touching the store. A body that
    /// parses is written to the store before it is returned.
    pub async fn fetch_at(
        &self,
        station_id: &str,
        fetched_at: NaiveDateTime,
    ) -> Result<WeatherSnapshot, WeatherError> {
        tracing::debug!("Fetching weather for station {}", station_id);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("stationid", station_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Weather endpoint returned {} for {}", status, station_id);
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let payload: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let snapshot = WeatherSnapshot::from_value(station_id, fetched_at, &payload)?;
        self.store.save(station_id, fetched_at, &payload)?;

        tracing::info!(
            "Weather updated for {} ({})",
            snapshot.city.as_deref().unwrap_or(station_id),
            fetched_at
        );
        Ok(snapshot)
    }
}
