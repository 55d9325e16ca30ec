use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// True when the wicks enclose the body and volume is non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
            && self.volume >= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Degenerate band used before enough closes are available.
    pub fn flat(price: f64) -> Self {
        Self { upper: price, middle: price, lower: price }
    }
}

/// Indicator values for a single candle index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub sma20: f64,
    pub sma50: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal: f64,
    pub bollinger: BollingerBands,
}

/// One named indicator line, as handed to chart overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub name: String,
    pub parameters: serde_json::Value,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: Option<String>,
    pub playing: bool,
    pub ticks: u64,
    pub candles: Vec<Candle>,
    pub indicators: Vec<IndicatorSnapshot>,
}

impl MarketData {
    pub fn current_price(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }
}

/// The fixed universe of tradable pairs a signal can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyPair {
    #[serde(rename = "EUR/USD")]
    EurUsd,
    #[serde(rename = "GBP/USD")]
    GbpUsd,
    #[serde(rename = "USD/JPY")]
    UsdJpy,
    #[serde(rename = "AUD/USD")]
    AudUsd,
    #[serde(rename = "USD/CAD")]
    UsdCad,
    #[serde(rename = "USD/CHF")]
    UsdChf,
    #[serde(rename = "NZD/USD")]
    NzdUsd,
    #[serde(rename = "EUR/GBP")]
    EurGbp,
    #[serde(rename = "EUR/JPY")]
    EurJpy,
    #[serde(rename = "GBP/JPY")]
    GbpJpy,
    #[serde(rename = "AUD/JPY")]
    AudJpy,
    #[serde(rename = "CAD/JPY")]
    CadJpy,
    #[serde(rename = "EUR/USD-OTC")]
    EurUsdOtc,
    #[serde(rename = "GBP/USD-OTC")]
    GbpUsdOtc,
    #[serde(rename = "USD/JPY-OTC")]
    UsdJpyOtc,
    #[serde(rename = "AUD/USD-OTC")]
    AudUsdOtc,
    #[serde(rename = "USD/CAD-OTC")]
    UsdCadOtc,
    #[serde(rename = "USD/CHF-OTC")]
    UsdChfOtc,
    #[serde(rename = "NZD/USD-OTC")]
    NzdUsdOtc,
    #[serde(rename = "EUR/GBP-OTC")]
    EurGbpOtc,
}

impl CurrencyPair {
    pub const ALL: [CurrencyPair; 20] = [
        Self::EurUsd,
        Self::GbpUsd,
        Self::UsdJpy,
        Self::AudUsd,
        Self::UsdCad,
        Self::UsdChf,
        Self::NzdUsd,
        Self::EurGbp,
        Self::EurJpy,
        Self::GbpJpy,
        Self::AudJpy,
        Self::CadJpy,
        Self::EurUsdOtc,
        Self::GbpUsdOtc,
        Self::UsdJpyOtc,
        Self::AudUsdOtc,
        Self::UsdCadOtc,
        Self::UsdChfOtc,
        Self::NzdUsdOtc,
        Self::EurGbpOtc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EurUsd => "EUR/USD",
            Self::GbpUsd => "GBP/USD",
            Self::UsdJpy => "USD/JPY",
            Self::AudUsd => "AUD/USD",
            Self::UsdCad => "USD/CAD",
            Self::UsdChf => "USD/CHF",
            Self::NzdUsd => "NZD/USD",
            Self::EurGbp => "EUR/GBP",
            Self::EurJpy => "EUR/JPY",
            Self::GbpJpy => "GBP/JPY",
            Self::AudJpy => "AUD/JPY",
            Self::CadJpy => "CAD/JPY",
            Self::EurUsdOtc => "EUR/USD-OTC",
            Self::GbpUsdOtc => "GBP/USD-OTC",
            Self::UsdJpyOtc => "USD/JPY-OTC",
            Self::AudUsdOtc => "AUD/USD-OTC",
            Self::UsdCadOtc => "USD/CAD-OTC",
            Self::UsdChfOtc => "USD/CHF-OTC",
            Self::NzdUsdOtc => "NZD/USD-OTC",
            Self::EurGbpOtc => "EUR/GBP-OTC",
        }
    }

    pub fn is_otc(self) -> bool {
        self.as_str().ends_with("-OTC")
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|pair| pair.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown currency pair '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Higher,
    Lower,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Higher => f.write_str("HIGHER"),
            Direction::Lower => f.write_str("LOWER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expiration {
    #[serde(rename = "1 min")]
    OneMinute,
    #[serde(rename = "2 min")]
    TwoMinutes,
    #[serde(rename = "3 min")]
    ThreeMinutes,
    #[serde(rename = "4 min")]
    FourMinutes,
    #[serde(rename = "5 min")]
    FiveMinutes,
}

impl Expiration {
    pub const ALL: [Expiration; 5] = [
        Self::OneMinute,
        Self::TwoMinutes,
        Self::ThreeMinutes,
        Self::FourMinutes,
        Self::FiveMinutes,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Self::OneMinute => 1,
            Self::TwoMinutes => 2,
            Self::ThreeMinutes => 3,
            Self::FourMinutes => 4,
            Self::FiveMinutes => 5,
        }
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub pair: CurrencyPair,
    pub direction: Direction,
    pub expiration: Expiration,
    pub entry_price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub pair: CurrencyPair,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownCategory {
    Express,
    Hourly,
    FiveHour,
    TwentyFourHour,
}

impl CooldownCategory {
    pub const ALL: [CooldownCategory; 4] = [
        Self::Express,
        Self::Hourly,
        Self::FiveHour,
        Self::TwentyFourHour,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Express => "express",
            Self::Hourly => "hourly",
            Self::FiveHour => "five_hour",
            Self::TwentyFourHour => "twenty_four_hour",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Express => 0,
            Self::Hourly => 1,
            Self::FiveHour => 2,
            Self::TwentyFourHour => 3,
        }
    }
}

impl fmt::Display for CooldownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CooldownCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "express" => Ok(Self::Express),
            "hourly" | "1h" => Ok(Self::Hourly),
            "five_hour" | "5h" => Ok(Self::FiveHour),
            "twenty_four_hour" | "24h" | "daily" => Ok(Self::TwentyFourHour),
            other => Err(format!("unknown cooldown category '{}'", other)),
        }
    }
}

/// Display view of one cooldown gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownState {
    pub category: CooldownCategory,
    pub can_use: bool,
    pub last_trigger_time: Option<DateTime<Utc>>,
    pub time_left_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Initialization,
    DataCollection,
    TrendAnalysis,
    SignalFormation,
    ReadyToTrade,
}

impl AnalysisStage {
    pub fn from_progress(progress_percent: f64) -> Self {
        if progress_percent < 25.0 {
            Self::Initialization
        } else if progress_percent < 50.0 {
            Self::DataCollection
        } else if progress_percent < 75.0 {
            Self::TrendAnalysis
        } else if progress_percent < 95.0 {
            Self::SignalFormation
        } else {
            Self::ReadyToTrade
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub next_slot: DateTime<Utc>,
    pub time_left_seconds: u64,
    pub horizon_seconds: u64,
    pub progress_percent: f64,
    pub stage: AnalysisStage,
}
