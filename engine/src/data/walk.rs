// Bounded random walk producing one OHLCV step at a time.
use super::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkProfile {
    pub volatility_base: f64,
    pub volatility_span: f64,
    /// A draw above this threshold moves the price up.
    pub up_threshold: f64,
    pub change_floor: f64,
    pub change_span: f64,
    pub wick_jitter: f64,
    pub volume_base: f64,
    pub volume_span: f64,
}

impl WalkProfile {
    /// Used to seed the history when an instrument is selected.
    pub const SEED: WalkProfile = WalkProfile {
        volatility_base: 0.0005,
        volatility_span: 0.0010,
        up_threshold: 0.5,
        change_floor: 0.5,
        change_span: 1.0,
        wick_jitter: 0.0003,
        volume_base: 1000.0,
        volume_span: 5000.0,
    };

    /// Used for live ticks: wider moves with a slight upward bias.
    pub const LIVE: WalkProfile = WalkProfile {
        volatility_base: 0.0005,
        volatility_span: 0.0015,
        up_threshold: 0.48,
        change_floor: 0.3,
        change_span: 0.7,
        wick_jitter: 0.0004,
        volume_base: 800.0,
        volume_span: 4000.0,
    };

    pub fn step(&self, open: f64, rng: &mut dyn RandomSource) -> Step {
        let volatility = self.volatility_base + rng.next_unit() * self.volatility_span;
        let direction = if rng.next_unit() > self.up_threshold { 1.0 } else { -1.0 };
        let change = direction * volatility * (self.change_floor + rng.next_unit() * self.change_span);
        let close = open + change;

        let high = open.max(close) + rng.next_unit() * self.wick_jitter;
        let low = open.min(close) - rng.next_unit() * self.wick_jitter;
        let volume = self.volume_base + rng.next_unit() * self.volume_span;

        Step { open, high, low, close, volume }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}
