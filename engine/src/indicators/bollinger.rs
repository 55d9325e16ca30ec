// Bollinger Bands indicator implementation
use super::sma::SmaState;
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::{BollingerBands, Candle};

/// Which of the three bands a `Bollinger` calculator emits as its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Upper,
    Middle,
    Lower,
}

impl Band {
    fn pick(self, bands: BollingerBands) -> f64 {
        match self {
            Band::Upper => bands.upper,
            Band::Middle => bands.middle,
            Band::Lower => bands.lower,
        }
    }
}

pub struct Bollinger {
    name: String,
    period: usize,
    multiplier: f64,
    band: Band,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self {
            name: format!("BB({},{})", period, multiplier),
            period,
            multiplier,
            band: Band::Middle,
        }
    }

    pub fn band(mut self, band: Band) -> Self {
        self.band = band;
        self.name = match band {
            Band::Middle => format!("BB({},{})", self.period, self.multiplier),
            Band::Upper => format!("BB({},{}) upper", self.period, self.multiplier),
            Band::Lower => format!("BB({},{}) lower", self.period, self.multiplier),
        };
        self
    }
}

impl IndicatorCalculator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "period": self.period,
            "multiplier": self.multiplier,
            "band": format!("{:?}", self.band).to_lowercase(),
        })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<f64> {
        let mut state = BollingerState::new(self.period, self.multiplier);
        data.iter().map(|c| self.band.pick(state.update(c.close))).collect()
    }
}

/// Bands of `multiplier` population standard deviations around the rolling
/// mean. Collapses onto the close until `period` closes have been seen.
#[derive(Debug, Clone)]
pub struct BollingerState {
    multiplier: f64,
    mean: SmaState,
}

impl BollingerState {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self {
            multiplier,
            mean: SmaState::new(period),
        }
    }

    pub fn update(&mut self, close: f64) -> BollingerBands {
        let middle = self.mean.update(close);
        if !self.mean.is_full() {
            return BollingerBands::flat(close);
        }

        let (sum_sq, count) = self
            .mean
            .values()
            .fold((0.0, 0usize), |(acc, n), price| (acc + (price - middle).powi(2), n + 1));
        let std_dev = (sum_sq / count as f64).sqrt();
        let offset = std_dev * self.multiplier;
        BollingerBands {
            upper: middle + offset,
            middle,
            lower: middle - offset,
        }
    }
}
