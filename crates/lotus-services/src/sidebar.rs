//! Sidebar backend: the single-threaded refresh loop.
//!
//! Both timers and the settings commands are polled from one task. A branch
//! runs to completion, network wait included, before the next one is polled,
//! so refreshes never overlap. Every change is published as a `SidebarFrame`
//! over an mpsc channel for the front end to draw.

use chrono::{Local, NaiveDateTime};
use lotus_core::{App, AppError, DisplaySettings};
use lotus_weather::{FieldPolicy, SnapshotStore, WeatherProvider, WeatherView};
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc;

use crate::quote::QuoteClient;
use crate::schedule::RefreshSchedule;

/// Requests from the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarCommand {
    RefreshWeather,
    RefreshQuote,
    ReloadConfig,
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown command '{0}' (try: weather, quote, reload, quit)")]
pub struct UnknownCommand(pub String);

impl FromStr for SidebarCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "w" | "weather" => Ok(Self::RefreshWeather),
            "q" | "quote" => Ok(Self::RefreshQuote),
            "r" | "reload" => Ok(Self::ReloadConfig),
            "x" | "exit" | "quit" => Ok(Self::Shutdown),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Everything the front end needs to draw one state of the sidebar
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarFrame {
    pub clock: String,
    /// Empty until the first successful weather fetch
    pub weather: Vec<String>,
    pub quote: Option<String>,
    pub display: DisplaySettings,
}

impl fmt::Display for SidebarFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.clock)?;
        for line in &self.weather {
            writeln!(f, "{}", line)?;
        }
        if let Some(quote) = &self.quote {
            writeln!(f)?;
            writeln!(f, "{}", quote)?;
        }
        Ok(())
    }
}

/// Clock widget text: `MM/dd ddd` over `HH:MM:SS`
pub fn clock_text(now: NaiveDateTime) -> String {
    now.format("%m/%d %a\n%H:%M:%S").to_string()
}

pub struct Sidebar {
    app: App,
    weather: WeatherProvider,
    quotes: QuoteClient,
    policy: FieldPolicy,
    schedule: RefreshSchedule,
    view: Option<WeatherView>,
    quote: Option<String>,
    frames: mpsc::UnboundedSender<SidebarFrame>,
}

impl Sidebar {
    pub fn new(app: App, frames: mpsc::UnboundedSender<SidebarFrame>) -> Result<Self, AppError> {
        let (weather, quotes) = Self::clients(&app)?;
        let config = app.config();
        let policy = FieldPolicy::from_names(&config.history_fields);
        let schedule = RefreshSchedule::from_config(config);

        Ok(Self {
            app,
            weather,
            quotes,
            policy,
            schedule,
            view: None,
            quote: None,
            frames,
        })
    }

    fn clients(app: &App) -> Result<(WeatherProvider, QuoteClient), AppError> {
        let config = app.config();
        let store = SnapshotStore::new(app.snapshot_dir());

        let weather = WeatherProvider::new(config.weather_url.clone(), store)
            .map_err(|e| AppError::Service(e.to_string()))?;
        let quotes = QuoteClient::new(config.quote_url.clone())
            .map_err(|e| AppError::Service(e.to_string()))?;

        Ok((weather, quotes))
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn weather_view(&self) -> Option<&WeatherView> {
        self.view.as_ref()
    }

    pub fn quote(&self) -> Option<&str> {
        self.quote.as_deref()
    }

    /// Fetch, persist and resolve the weather for the configured station.
    /// On failure the previous view stays up. Returns whether it changed.
    pub async fn refresh_weather(&mut self) -> bool {
        let station = self.app.config().station_id.clone();

        match self.weather.fetch(&station).await {
            Ok(snapshot) => {
                let today = snapshot.fetched_at.date();
                self.view = Some(WeatherView::build(
                    &snapshot,
                    self.weather.store(),
                    &self.policy,
                    today,
                ));
                true
            }
            Err(e) if e.is_network() => {
                tracing::warn!("Skipping weather refresh for {}: {}", station, e);
                false
            }
            Err(e) => {
                tracing::error!("Weather refresh for {} failed: {}", station, e);
                false
            }
        }
    }

    /// Fetch a new quote, keeping the old one on failure
    pub async fn refresh_quote(&mut self) -> bool {
        match self.quotes.fetch().await {
            Ok(quote) => {
                tracing::debug!("Quote updated");
                self.quote = Some(quote);
                true
            }
            Err(e) => {
                tracing::warn!("Skipping quote refresh: {}", e);
                false
            }
        }
    }

    /// Re-read the config file and rebuild everything derived from it
    pub fn reload_config(&mut self) -> Result<(), AppError> {
        let config = self.app.reload()?;
        let (weather, quotes) = Self::clients(&self.app)?;

        self.weather = weather;
        self.quotes = quotes;
        self.policy = FieldPolicy::from_names(&config.history_fields);
        self.schedule = RefreshSchedule::from_config(&config);
        Ok(())
    }

    pub fn frame_at(&self, now: NaiveDateTime) -> SidebarFrame {
        SidebarFrame {
            clock: clock_text(now),
            weather: self.view.as_ref().map(WeatherView::lines).unwrap_or_default(),
            quote: self.quote.clone(),
            display: self.app.config().display(),
        }
    }

    fn publish(&self) {
        // A closed receiver only means nobody is drawing
        let _ = self.frames.send(self.frame_at(Local::now().naive_local()));
    }

    /// Refresh both widgets, then serve timers and commands until
    /// `Shutdown` arrives or the command channel closes
    pub async fn run(mut self, mut commands: mpsc::Receiver<SidebarCommand>) -> Result<(), AppError> {
        self.refresh_quote().await;
        self.refresh_weather().await;
        self.publish();

        let mut quote_timer = self.schedule.quote_timer();
        let mut weather_timer = self.schedule.weather_timer(&Local::now());

        loop {
            tokio::select! {
                _ = quote_timer.tick() => {
                    self.refresh_quote().await;
                }
                _ = weather_timer.tick() => {
                    self.refresh_weather().await;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("Command channel closed");
                        break;
                    };
                    tracing::debug!("Handling {:?}", command);

                    match command {
                        SidebarCommand::RefreshWeather => {
                            self.refresh_weather().await;
                        }
                        SidebarCommand::RefreshQuote => {
                            self.refresh_quote().await;
                        }
                        SidebarCommand::ReloadConfig => {
                            let station = self.app.config().station_id.clone();
                            let schedule = self.schedule;

                            match self.reload_config() {
                                Ok(()) => {
                                    if self.schedule != schedule {
                                        quote_timer = self.schedule.quote_timer();
                                        weather_timer = self.schedule.weather_timer(&Local::now());
                                    }
                                    if self.app.config().station_id != station {
                                        self.refresh_weather().await;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Reload failed: {} ({})", e, e.user_message());
                                }
                            }
                        }
                        SidebarCommand::Shutdown => break,
                    }
                }
            }

            self.publish();
        }

        self.app.shutdown()?;
        Ok(())
    }
}
