// Relative Strength Index (RSI) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::Candle;
use std::collections::VecDeque;

/// Value reported while fewer than `period` price changes are available.
pub const NEUTRAL_RSI: f64 = 50.0;

pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<f64> {
        let mut state = RsiState::new(self.period);
        data.iter().map(|c| state.update(c.close)).collect()
    }
}

/// RSI over a sliding window of the last `period` close-to-close changes,
/// averaged with a plain mean (no Wilder smoothing).
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    previous_close: Option<f64>,
    // (gain, loss) per change, both non-negative
    changes: VecDeque<(f64, f64)>,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            previous_close: None,
            changes: VecDeque::with_capacity(period.max(1) + 1),
        }
    }

    pub fn update(&mut self, close: f64) -> f64 {
        if let Some(previous) = self.previous_close {
            let change = close - previous;
            let entry = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };
            self.changes.push_back(entry);
            if self.changes.len() > self.period {
                self.changes.pop_front();
            }
        }
        self.previous_close = Some(close);

        if self.changes.len() < self.period {
            return NEUTRAL_RSI;
        }

        let (gains, losses) = self
            .changes
            .iter()
            .fold((0.0, 0.0), |(g, l), (gain, loss)| (g + gain, l + loss));
        let avg_gain = gains / self.period as f64;
        let avg_loss = losses / self.period as f64;

        if avg_loss == 0.0 {
            // No losses in the window, RSI saturates.
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
    }
}
