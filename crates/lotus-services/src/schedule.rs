//! Refresh timing for the two periodic jobs.

use chrono::Timelike;
use lotus_core::Config;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

const HALF_HOUR_SECS: u32 = 30 * 60;

/// Time from `now` to the next :00 or :30 on the wall clock.
///
/// Sub-second precision is ignored, and exactly on a boundary the answer is
/// a full half hour.
pub fn until_next_half_hour<T: Timelike>(now: &T) -> Duration {
    let elapsed = (now.minute() % 30) * 60 + now.second().min(59);
    Duration::from_secs(u64::from(HALF_HOUR_SECS - elapsed))
}

/// Periods for the quote and weather jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub quote_every: Duration,
    pub weather_every: Duration,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            quote_every: Duration::from_secs(u64::from(HALF_HOUR_SECS)),
            weather_every: Duration::from_secs(u64::from(HALF_HOUR_SECS)),
        }
    }
}

impl RefreshSchedule {
    pub fn from_config(config: &Config) -> Self {
        Self {
            quote_every: minutes(config.quote_refresh_minutes),
            weather_every: minutes(config.weather_refresh_minutes),
        }
    }

    /// First tick one period from now
    pub fn quote_timer(&self) -> Interval {
        timer(Instant::now() + self.quote_every, self.quote_every)
    }

    /// First tick on the next half-hour boundary after `now`
    pub fn weather_timer<T: Timelike>(&self, now: &T) -> Interval {
        timer(Instant::now() + until_next_half_hour(now), self.weather_every)
    }
}

fn minutes(value: u32) -> Duration {
    Duration::from_secs(u64::from(value.max(1)) * 60)
}

fn timer(start: Instant, period: Duration) -> Interval {
    let mut interval = interval_at(start, period);
    // A suspended machine gets one catch-up refresh, not a burst
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_until_next_half_hour() {
        assert_eq!(until_next_half_hour(&time(10, 12, 0)), Duration::from_secs(18 * 60));
        assert_eq!(until_next_half_hour(&time(10, 29, 59)), Duration::from_secs(1));
        assert_eq!(until_next_half_hour(&time(10, 45, 30)), Duration::from_secs(14 * 60 + 30));
        assert_eq!(until_next_half_hour(&time(23, 59, 59)), Duration::from_secs(1));
    }

    #[test]
    fn test_on_boundary_waits_full_period() {
        assert_eq!(until_next_half_hour(&time(10, 0, 0)), Duration::from_secs(1800));
        assert_eq!(until_next_half_hour(&time(10, 30, 0)), Duration::from_secs(1800));
    }

    #[test]
    fn test_schedule_from_config() {
        let config = Config {
            quote_refresh_minutes: 5,
            weather_refresh_minutes: 60,
            ..Config::default()
        };
        let schedule = RefreshSchedule::from_config(&config);
        assert_eq!(schedule.quote_every, Duration::from_secs(300));
        assert_eq!(schedule.weather_every, Duration::from_secs(3600));
        assert_eq!(RefreshSchedule::from_config(&Config::default()), RefreshSchedule::default());
    }

    #[test]
    fn test_zero_minutes_clamped() {
        let config = Config {
            quote_refresh_minutes: 0,
            ..Config::default()
        };
        assert_eq!(
            RefreshSchedule::from_config(&config).quote_every,
            Duration::from_secs(60)
        );
    }

    #[tokio::test]
    async fn test_timers_use_configured_period() {
        let schedule = RefreshSchedule {
            quote_every: Duration::from_secs(120),
            weather_every: Duration::from_secs(900),
        };
        assert_eq!(schedule.quote_timer().period(), Duration::from_secs(120));
        assert_eq!(schedule.weather_timer(&time(10, 20, 0)).period(), Duration::from_secs(900));
    }
}
