// Synthetic market engine: a bounded candle window extended by a random walk,
// with the indicator series kept in step.
use crate::config::settings::MarketSettings;
use crate::data::random::RandomSource;
use crate::data::walk::{Step, WalkProfile};
use crate::error::EngineError;
use crate::indicators::{self, compute_series};
use chrono::{DateTime, Duration, Utc};
use shared::models::{Candle, Indicator, IndicatorSnapshot, MarketData};
use std::collections::VecDeque;

pub struct MarketEngine {
    settings: MarketSettings,
    symbol: Option<String>,
    candles: VecDeque<Candle>,
    indicators: Vec<IndicatorSnapshot>,
    playing: bool,
    ticks: u64,
}

impl MarketEngine {
    pub fn new(settings: MarketSettings) -> Self {
        let capacity = settings.window_size;
        MarketEngine {
            settings,
            symbol: None,
            candles: VecDeque::with_capacity(capacity + 1),
            indicators: Vec::with_capacity(capacity),
            playing: true,
            ticks: 0,
        }
    }

    /// Replaces the history with a freshly seeded window for `symbol`. The
    /// key is opaque; any non-blank string is accepted.
    pub fn select_instrument(
        &mut self,
        symbol: &str,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> Result<(), EngineError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(EngineError::InvalidInstrument(symbol.to_string()));
        }

        let count = self.settings.window_size;
        let spacing = Duration::milliseconds(self.settings.seed_spacing_ms);
        if spacing <= Duration::zero() {
            return Err(EngineError::ConfigError(format!(
                "seed spacing must be positive, got {}ms",
                self.settings.seed_spacing_ms
            )));
        }
        // The oldest timestamp bounds every other one.
        let oldest = i32::try_from(count)
            .ok()
            .and_then(|n| spacing.checked_mul(n))
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                EngineError::ConfigError(format!(
                    "{} candles spaced {}ms apart do not fit before {}",
                    count, self.settings.seed_spacing_ms, now
                ))
            })?;
        let mut open = self.settings.base_price;

        self.candles.clear();
        for i in 0..count {
            let timestamp = oldest + spacing * i as i32;
            let step = WalkProfile::SEED.step(open, rng);
            open = step.close;
            self.candles.push_back(to_candle(symbol, timestamp, step));
        }
        self.symbol = Some(symbol.to_string());
        self.ticks = 0;
        self.recompute();

        tracing::info!(
            symbol = %symbol,
            candles = self.candles.len(),
            last_close = ?self.current_price(),
            "Seeded synthetic market history"
        );
        Ok(())
    }

    /// Appends one live candle unless paused or not yet seeded.
    pub fn tick(&mut self, now: DateTime<Utc>, rng: &mut dyn RandomSource) -> Option<Candle> {
        if !self.playing {
            return None;
        }
        let symbol = self.symbol.clone()?;
        let open = self.candles.back()?.close;

        let candle = to_candle(&symbol, now, WalkProfile::LIVE.step(open, rng));
        self.candles.push_back(candle.clone());
        while self.candles.len() > self.settings.window_size {
            self.candles.pop_front();
        }
        self.recompute();
        self.ticks += 1;

        tracing::debug!(symbol = %symbol, close = candle.close, tick = self.ticks, "Appended live candle");
        Some(candle)
    }

    // The series restarts at the oldest retained candle, so it is rebuilt
    // whenever the window moves.
    fn recompute(&mut self) {
        self.indicators = compute_series(self.candles.make_contiguous());
    }

    /// Returns whether the play state changed.
    pub fn set_playing(&mut self, playing: bool) -> bool {
        let changed = self.playing != playing;
        self.playing = playing;
        changed
    }

    pub fn toggle_playing(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_ready(&self) -> bool {
        !self.candles.is_empty()
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn candles(&self) -> impl ExactSizeIterator<Item = &Candle> {
        self.candles.iter()
    }

    pub fn indicators(&self) -> &[IndicatorSnapshot] {
        &self.indicators
    }

    pub fn current_price(&self) -> Option<f64> {
        self.candles.back().map(|c| c.close)
    }

    pub fn latest(&self) -> Result<(&Candle, &IndicatorSnapshot), EngineError> {
        match (self.candles.back(), self.indicators.last()) {
            (Some(candle), Some(snapshot)) => Ok((candle, snapshot)),
            _ => Err(EngineError::MarketNotReady),
        }
    }

    /// Overlay lines for the current window.
    pub fn indicator_lines(&self) -> Result<Vec<Indicator>, EngineError> {
        if !self.is_ready() {
            return Err(EngineError::MarketNotReady);
        }
        let window: Vec<Candle> = self.candles.iter().cloned().collect();
        Ok(indicators::default_calculators()
            .iter()
            .map(|calculator| indicators::line(calculator.as_ref(), &window))
            .collect())
    }

    pub fn snapshot(&self) -> MarketData {
        MarketData {
            symbol: self.symbol.clone(),
            playing: self.playing,
            ticks: self.ticks,
            candles: self.candles.iter().cloned().collect(),
            indicators: self.indicators.clone(),
        }
    }
}

fn to_candle(symbol: &str, timestamp: DateTime<Utc>, step: Step) -> Candle {
    Candle {
        symbol: symbol.to_string(),
        timestamp,
        open: step.open,
        high: step.high,
        low: step.low,
        close: step.close,
        volume: step.volume,
    }
}
