// Engine settings, loaded from a JSON file or the embedded defaults.
use crate::error::EngineError;
use serde::Deserialize;
use shared::models::CooldownCategory;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG: &str = include_str!("../../config/default.json");

/// Upper bound for every configured duration, in seconds. Keeps deadline and
/// timer arithmetic far from the chrono and tokio overflow limits.
pub const MAX_DURATION_SECS: u64 = 366 * 24 * 60 * 60;
pub const MAX_WINDOW_SIZE: usize = 10_000;

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct EngineSettings {
    pub market: MarketSettings,
    pub cooldowns: CooldownSettings,
    pub signals: SignalSettings,
    pub crowd: CrowdSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MarketSettings {
    pub base_price: f64,
    pub window_size: usize,
    pub tick_interval_ms: u64,
    /// Spacing of the seeded history candles.
    pub seed_spacing_ms: i64,
    pub default_instrument: String,
}

impl Default for MarketSettings {
    fn default() -> Self {
        MarketSettings {
            base_price: 1.0850,
            window_size: 50,
            tick_interval_ms: 1500,
            seed_spacing_ms: 5000,
            default_instrument: "EUR/USD".to_string(),
        }
    }
}

impl MarketSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CooldownSettings {
    pub express_secs: u64,
    pub hourly_secs: u64,
    pub five_hour_secs: u64,
    pub twenty_four_hour_secs: u64,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        CooldownSettings {
            express_secs: 15 * 60,
            hourly_secs: 60 * 60,
            five_hour_secs: 5 * 60 * 60,
            twenty_four_hour_secs: 24 * 60 * 60,
        }
    }
}

impl CooldownSettings {
    pub fn duration_secs(&self, category: CooldownCategory) -> u64 {
        match category {
            CooldownCategory::Express => self.express_secs,
            CooldownCategory::Hourly => self.hourly_secs,
            CooldownCategory::FiveHour => self.five_hour_secs,
            CooldownCategory::TwentyFourHour => self.twenty_four_hour_secs,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SignalSettings {
    pub display_secs: u64,
    pub recommendation_secs: u64,
    pub entry_base_price: f64,
    /// Full width of the entry price perturbation around the base.
    pub entry_spread: f64,
    pub blink_interval_ms: u64,
    pub scheduled_hours: Vec<u32>,
    pub schedule_utc_offset_hours: i32,
    pub schedule_horizon_secs: u64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        SignalSettings {
            display_secs: 60,
            recommendation_secs: 30,
            entry_base_price: 1.0850,
            entry_spread: 0.01,
            blink_interval_ms: 2000,
            scheduled_hours: vec![11, 16, 21],
            schedule_utc_offset_hours: 3,
            schedule_horizon_secs: 10 * 60 * 60,
        }
    }
}

impl SignalSettings {
    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CrowdSettings {
    pub initial: u32,
    pub min: u32,
    pub max: u32,
    pub max_step: u32,
}

impl Default for CrowdSettings {
    fn default() -> Self {
        CrowdSettings {
            initial: 1247,
            min: 100,
            max: 5000,
            max_step: 25,
        }
    }
}

impl EngineSettings {
    /// Settings shipped with the binary.
    pub fn embedded() -> Result<Self, EngineError> {
        Self::from_json_str(DEFAULT_CONFIG)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let settings: EngineSettings = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading engine settings");
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let max_ms = MAX_DURATION_SECS * 1000;
        if !(1..=MAX_WINDOW_SIZE).contains(&self.market.window_size) {
            return Err(EngineError::ConfigError(format!(
                "market.window_size must be in 1..={}, got {}",
                MAX_WINDOW_SIZE, self.market.window_size
            )));
        }
        check_range("market.tick_interval_ms", self.market.tick_interval_ms, max_ms)?;
        // Seeded candles must come out in ascending time order.
        if self.market.seed_spacing_ms <= 0 || self.market.seed_spacing_ms as u64 > max_ms {
            return Err(EngineError::ConfigError(format!(
                "market.seed_spacing_ms must be in 1..={}, got {}",
                max_ms, self.market.seed_spacing_ms
            )));
        }
        if !(self.market.base_price.is_finite() && self.market.base_price > 0.0) {
            return Err(EngineError::ConfigError(format!(
                "market.base_price must be a positive number, got {}",
                self.market.base_price
            )));
        }
        for category in CooldownCategory::ALL {
            check_range(
                &format!("cooldowns.{}_secs", category),
                self.cooldowns.duration_secs(category),
                MAX_DURATION_SECS,
            )?;
        }
        check_range("signals.display_secs", self.signals.display_secs, MAX_DURATION_SECS)?;
        check_range("signals.recommendation_secs", self.signals.recommendation_secs, MAX_DURATION_SECS)?;
        check_range("signals.schedule_horizon_secs", self.signals.schedule_horizon_secs, MAX_DURATION_SECS)?;
        check_range("signals.blink_interval_ms", self.signals.blink_interval_ms, max_ms)?;
        if self.signals.scheduled_hours.is_empty() {
            return Err(EngineError::ConfigError("signals.scheduled_hours must not be empty".to_string()));
        }
        if let Some(hour) = self.signals.scheduled_hours.iter().find(|h| **h >= 24) {
            return Err(EngineError::ConfigError(format!("signals.scheduled_hours contains invalid hour {}", hour)));
        }
        if !(-12..=14).contains(&self.signals.schedule_utc_offset_hours) {
            return Err(EngineError::ConfigError(format!(
                "signals.schedule_utc_offset_hours out of range: {}",
                self.signals.schedule_utc_offset_hours
            )));
        }
        if self.crowd.min > self.crowd.max {
            return Err(EngineError::ConfigError("crowd.min must not exceed crowd.max".to_string()));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: u64, max: u64) -> Result<(), EngineError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::ConfigError(format!("{} must be in 1..={}, got {}", field, max, value)))
    }
}
