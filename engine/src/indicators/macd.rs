// Moving Average Convergence Divergence (MACD) indicator implementation
use super::ema::EmaState;
use super::IndicatorCalculator;
use serde::Serialize;
use serde_json::Value;
use shared::models::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

pub struct Macd {
    name: String,
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            name: format!("MACD({},{},{})", fast, slow, signal),
            fast,
            slow,
            signal,
            line: MacdLine::Macd,
        }
    }

    pub fn standard() -> Self {
        Self::new(12, 26, 9)
    }

    pub fn line(mut self, line: MacdLine) -> Self {
        let base = format!("MACD({},{},{})", self.fast, self.slow, self.signal);
        self.name = match line {
            MacdLine::Macd => base,
            MacdLine::Signal => format!("{} signal", base),
            MacdLine::Histogram => format!("{} histogram", base),
        };
        self.line = line;
        self
    }
}

impl IndicatorCalculator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "fast": self.fast, "slow": self.slow, "signal": self.signal })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<f64> {
        let mut state = MacdState::new(self.fast, self.slow, self.signal);
        data.iter()
            .map(|c| {
                let point = state.update(c.close);
                match self.line {
                    MacdLine::Macd => point.macd,
                    MacdLine::Signal => point.signal,
                    MacdLine::Histogram => point.histogram,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdPoint {
    pub fast: f64,
    pub slow: f64,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
}

impl MacdState {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: EmaState::new(fast),
            slow: EmaState::new(slow),
            signal: EmaState::new(signal),
        }
    }

    pub fn update(&mut self, close: f64) -> MacdPoint {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        let macd = fast - slow;
        let signal = self.signal.update(macd);
        MacdPoint {
            fast,
            slow,
            macd,
            signal,
            histogram: macd - signal,
        }
    }
}
