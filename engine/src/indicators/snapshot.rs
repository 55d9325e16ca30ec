// Streaming computation of the full indicator snapshot per candle.
use super::bollinger::BollingerState;
use super::macd::MacdState;
use super::rsi::RsiState;
use super::sma::SmaState;
use shared::models::{Candle, IndicatorSnapshot};

/// Carries every indicator's running state so each new close costs a bounded
/// amount of work. A snapshot at index `i` only ever sees closes `0..=i`.
#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    sma20: SmaState,
    sma50: SmaState,
    rsi: RsiState,
    macd: MacdState,
    bollinger: BollingerState,
}

impl Default for IndicatorPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorPipeline {
    pub fn new() -> Self {
        Self {
            sma20: SmaState::new(20),
            sma50: SmaState::new(50),
            rsi: RsiState::new(14),
            macd: MacdState::new(12, 26, 9),
            bollinger: BollingerState::new(20, 2.0),
        }
    }

    pub fn push(&mut self, close: f64) -> IndicatorSnapshot {
        let macd = self.macd.update(close);
        IndicatorSnapshot {
            sma20: self.sma20.update(close),
            sma50: self.sma50.update(close),
            ema12: macd.fast,
            ema26: macd.slow,
            rsi: self.rsi.update(close),
            macd: macd.macd,
            signal: macd.signal,
            bollinger: self.bollinger.update(close),
        }
    }
}

/// Indicator series for a candle window, recomputed from its first candle.
pub fn compute_series(candles: &[Candle]) -> Vec<IndicatorSnapshot> {
    let mut pipeline = IndicatorPipeline::new();
    candles.iter().map(|c| pipeline.push(c.close)).collect()
}
