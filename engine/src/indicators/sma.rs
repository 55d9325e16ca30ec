// Simple Moving Average (SMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::Candle;
use std::collections::VecDeque;

pub struct Sma {
    name: String,
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        if period == 0 {
            panic!("SMA period must be greater than 0");
        }
        Self {
            name: format!("SMA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<f64> {
        let mut state = SmaState::new(self.period);
        data.iter().map(|c| state.update(c.close)).collect()
    }
}

/// Rolling mean over the last `period` values. Until the window is full the
/// mean covers every value seen so far.
#[derive(Debug, Clone)]
pub struct SmaState {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl SmaState {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            window: VecDeque::with_capacity(period.max(1) + 1),
            sum: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
            }
        }
        self.sum / self.window.len() as f64
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.period
    }

    pub fn values(&self) -> impl Iterator<Item = &f64> {
        self.window.iter()
    }
}
