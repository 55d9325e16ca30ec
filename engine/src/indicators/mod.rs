// Technical indicators module
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;

pub use bollinger::{Band, Bollinger, BollingerState};
pub use ema::{Ema, EmaState};
pub use macd::{Macd, MacdLine, MacdPoint, MacdState};
pub use rsi::{Rsi, RsiState};
pub use sma::{Sma, SmaState};
pub use snapshot::{compute_series, IndicatorPipeline};

use serde_json::Value;
use shared::models::{Candle, Indicator};

// Common trait for all indicators. Every index yields a value: indicators with
// a warm-up period fall back to a defined default instead of a gap.
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value;
    fn calculate(&self, data: &[Candle]) -> Vec<f64>;
}

/// Runs a calculator over the candles and packages the result for display.
pub fn line(calculator: &dyn IndicatorCalculator, data: &[Candle]) -> Indicator {
    Indicator {
        name: calculator.name().to_string(),
        parameters: calculator.parameters(),
        values: calculator.calculate(data),
    }
}

/// The lines a chart draws by default, one per `IndicatorSnapshot` field.
pub fn default_calculators() -> Vec<Box<dyn IndicatorCalculator>> {
    vec![
        Box::new(Sma::new(20)),
        Box::new(Sma::new(50)),
        Box::new(Ema::new(12)),
        Box::new(Ema::new(26)),
        Box::new(Rsi::new(14)),
        Box::new(Macd::standard()),
        Box::new(Macd::standard().line(MacdLine::Signal)),
        Box::new(Bollinger::new(20, 2.0).band(Band::Upper)),
        Box::new(Bollinger::new(20, 2.0)),
        Box::new(Bollinger::new(20, 2.0).band(Band::Lower)),
    ]
}
