// Random signal content and the boards that hold it for a fixed time.
use crate::config::settings::{SignalSettings, MAX_DURATION_SECS};
use crate::data::random::{pick, RandomSource};
use chrono::{DateTime, Duration, Utc};
use shared::models::{CurrencyPair, Direction, Expiration, Recommendation, Signal};
use uuid::Uuid;

/// Draws signals uniformly over pairs, directions and expirations. Nothing
/// here looks at the market engine.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    entry_base_price: f64,
    entry_spread: f64,
}

impl SignalGenerator {
    pub fn new(settings: &SignalSettings) -> Self {
        Self {
            entry_base_price: settings.entry_base_price,
            entry_spread: settings.entry_spread,
        }
    }

    pub fn generate(&self, now: DateTime<Utc>, rng: &mut dyn RandomSource) -> Signal {
        let pair = random_pair(rng);
        let direction = if rng.next_unit() > 0.5 { Direction::Higher } else { Direction::Lower };
        let expiration = pick(rng, &Expiration::ALL).copied().unwrap_or(Expiration::OneMinute);
        let entry_price = self.entry_base_price + (rng.next_unit() - 0.5) * self.entry_spread;

        Signal {
            id: Uuid::new_v4(),
            pair,
            direction,
            expiration,
            entry_price,
            timestamp: now,
        }
    }
}

pub fn random_pair(rng: &mut dyn RandomSource) -> CurrencyPair {
    pick(rng, &CurrencyPair::ALL).copied().unwrap_or(CurrencyPair::EurUsd)
}

/// The signal currently on display. A new signal replaces the old one and
/// restarts the display window.
#[derive(Debug, Clone)]
pub struct SignalBoard {
    display: Duration,
    current: Option<Signal>,
    clears_at: Option<DateTime<Utc>>,
    issued: u64,
}

impl SignalBoard {
    pub fn new(display_secs: u64) -> Self {
        Self {
            display: Duration::seconds(display_secs.min(MAX_DURATION_SECS) as i64),
            current: None,
            clears_at: None,
            issued: 0,
        }
    }

    pub fn show(&mut self, signal: Signal) {
        self.clears_at = Some(signal.timestamp + self.display);
        self.current = Some(signal);
        self.issued += 1;
    }

    /// Clears the signal once its window has passed and hands it back.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Signal> {
        match self.clears_at {
            Some(at) if now >= at => {
                self.clears_at = None;
                self.current.take()
            }
            _ => None,
        }
    }

    pub fn current(&self) -> Option<&Signal> {
        self.current.as_ref()
    }

    pub fn clears_at(&self) -> Option<DateTime<Utc>> {
        self.clears_at
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Express requests also surface a recommended pair for a short while.
#[derive(Debug, Clone)]
pub struct RecommendationBoard {
    ttl: Duration,
    current: Option<Recommendation>,
}

impl RecommendationBoard {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs.min(MAX_DURATION_SECS) as i64),
            current: None,
        }
    }

    pub fn issue(&mut self, pair: CurrencyPair, now: DateTime<Utc>) -> Recommendation {
        let recommendation = Recommendation {
            pair,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        self.current = Some(recommendation.clone());
        recommendation
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Recommendation> {
        if self.current.as_ref().map_or(false, |r| now >= r.expires_at) {
            return self.current.take();
        }
        None
    }

    pub fn current(&self) -> Option<&Recommendation> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::random::SequenceSource;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap()
    }

    #[test]
    fn generated_signals_stay_in_their_domains() {
        let generator = SignalGenerator::new(&SignalSettings::default());
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            let signal = generator.generate(t0(), &mut rng);
            assert!(CurrencyPair::ALL.contains(&signal.pair));
            assert!(matches!(signal.direction, Direction::Higher | Direction::Lower));
            assert!((1..=5).contains(&signal.expiration.minutes()));
            assert!((signal.entry_price - 1.0850).abs() <= 0.005 + 1e-12);
            assert_eq!(signal.timestamp, t0());
        }
    }

    #[test]
    fn draws_map_onto_fields() {
        let generator = SignalGenerator::new(&SignalSettings::default());
        // pair, direction, expiration, entry perturbation
        let mut rng = SequenceSource::new(vec![0.0, 0.75, 0.99, 0.8]);
        let signal = generator.generate(t0(), &mut rng);
        assert_eq!(signal.pair, CurrencyPair::EurUsd);
        assert_eq!(signal.direction, Direction::Higher);
        assert_eq!(signal.expiration, Expiration::FiveMinutes);
        assert!(signal.entry_price > 1.0850 && signal.entry_price < 1.0900);

        let mut rng = SequenceSource::new(vec![0.99, 0.5, 0.0, 0.5]);
        let signal = generator.generate(t0(), &mut rng);
        assert_eq!(signal.pair, CurrencyPair::EurGbpOtc);
        assert_eq!(signal.direction, Direction::Lower);
        assert_eq!(signal.expiration, Expiration::OneMinute);
        assert_eq!(signal.entry_price, 1.0850);
    }

    #[test]
    fn signal_clears_after_display_window() {
        let generator = SignalGenerator::new(&SignalSettings::default());
        let mut board = SignalBoard::new(60);
        let signal = generator.generate(t0(), &mut SequenceSource::constant(0.3));
        board.show(signal.clone());

        for second in 1..60 {
            assert!(board.tick(t0() + Duration::seconds(second)).is_none());
            assert!(board.current().is_some());
        }
        assert_eq!(board.tick(t0() + Duration::seconds(60)), Some(signal));
        assert!(board.current().is_none());
        assert!(board.tick(t0() + Duration::seconds(61)).is_none());
        assert_eq!(board.issued(), 1);
    }

    #[test]
    fn replacement_restarts_the_window() {
        let generator = SignalGenerator::new(&SignalSettings::default());
        let mut rng = SequenceSource::constant(0.6);
        let mut board = SignalBoard::new(60);
        board.show(generator.generate(t0(), &mut rng));
        let second = generator.generate(t0() + Duration::seconds(45), &mut rng);
        board.show(second.clone());

        assert!(board.tick(t0() + Duration::seconds(60)).is_none());
        assert_eq!(board.current(), Some(&second));
        assert_eq!(board.tick(t0() + Duration::seconds(105)), Some(second));
        assert_eq!(board.issued(), 2);
    }

    #[test]
    fn oversized_windows_are_clamped() {
        let mut board = SignalBoard::new(u64::MAX);
        let signal = SignalGenerator::new(&SignalSettings::default()).generate(t0(), &mut SequenceSource::constant(0.4));
        board.show(signal);
        assert_eq!(board.clears_at(), Some(t0() + Duration::seconds(MAX_DURATION_SECS as i64)));

        let mut recommendations = RecommendationBoard::new(u64::MAX);
        let issued = recommendations.issue(CurrencyPair::EurUsd, t0());
        assert_eq!(issued.expires_at, t0() + Duration::seconds(MAX_DURATION_SECS as i64));
    }

    #[test]
    fn recommendation_expires_after_ttl() {
        let mut board = RecommendationBoard::new(30);
        let issued = board.issue(CurrencyPair::AudJpy, t0());
        assert_eq!(issued.expires_at, t0() + Duration::seconds(30));
        assert!(board.tick(t0() + Duration::seconds(29)).is_none());
        assert_eq!(board.tick(t0() + Duration::seconds(30)), Some(issued));
        assert!(board.current().is_none());
    }
}
