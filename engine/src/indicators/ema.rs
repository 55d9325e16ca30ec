// Exponential Moving Average (EMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::Candle;

pub struct Ema {
    name: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("EMA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<f64> {
        let mut state = EmaState::new(self.period);
        data.iter().map(|c| state.update(c.close)).collect()
    }
}

/// Recursive EMA seeded with the first value it sees.
#[derive(Debug, Clone)]
pub struct EmaState {
    multiplier: f64,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        Self {
            multiplier: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, input: f64) -> f64 {
        let next = match self.value {
            None => input,
            Some(previous) => input * self.multiplier + previous * (1.0 - self.multiplier),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
