// Orchestrates the market engine, the cooldown gates and the signal boards.
// Every method takes `now` explicitly and returns the events it caused, so the
// whole dashboard can be driven by a simulated clock.
use crate::config::settings::EngineSettings;
use crate::data::market_data::MarketEngine;
use crate::data::random::RandomSource;
use crate::error::EngineError;
use crate::services::cooldown::{CooldownBoard, Trigger};
use crate::services::crowd::WaitingUsers;
use crate::services::schedule::SignalClock;
use crate::services::signals::{random_pair, RecommendationBoard, SignalBoard, SignalGenerator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{
    Candle, CooldownCategory, CooldownState, IndicatorSnapshot, MarketData, Recommendation, ScheduleStatus, Signal,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    MarketReset { symbol: String },
    CandleAppended { candle: Candle, snapshot: IndicatorSnapshot },
    PlaybackChanged { playing: bool },
    TriggerAccepted { category: CooldownCategory },
    TriggerIgnored { category: CooldownCategory, time_left_seconds: u64 },
    CooldownCompleted { category: CooldownCategory },
    SignalIssued { signal: Signal },
    SignalCleared { signal: Signal },
    RecommendationIssued { recommendation: Recommendation },
    RecommendationCleared { recommendation: Recommendation },
    ScheduledSlotReached { slot: DateTime<Utc> },
    ExpressBlink { lit: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub taken_at: DateTime<Utc>,
    pub market: MarketData,
    pub cooldowns: Vec<CooldownState>,
    pub signal: Option<Signal>,
    pub signal_clears_at: Option<DateTime<Utc>>,
    pub recommendation: Option<Recommendation>,
    pub schedule: ScheduleStatus,
    pub signal_triggers: u64,
    pub waiting_users: u32,
    pub waiting_for_signal: bool,
    pub express_blink: bool,
}

pub struct Dashboard {
    rng: Box<dyn RandomSource>,
    market: MarketEngine,
    cooldowns: CooldownBoard,
    generator: SignalGenerator,
    signals: SignalBoard,
    recommendations: RecommendationBoard,
    schedule: SignalClock,
    crowd: WaitingUsers,
    express_blink: bool,
    signal_triggers: u64,
    tick_interval: std::time::Duration,
    blink_interval: std::time::Duration,
}

impl Dashboard {
    pub fn new(settings: &EngineSettings, rng: Box<dyn RandomSource>) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self {
            rng,
            market: MarketEngine::new(settings.market.clone()),
            cooldowns: CooldownBoard::new(&settings.cooldowns),
            generator: SignalGenerator::new(&settings.signals),
            signals: SignalBoard::new(settings.signals.display_secs),
            recommendations: RecommendationBoard::new(settings.signals.recommendation_secs),
            schedule: SignalClock::new(&settings.signals)?,
            crowd: WaitingUsers::new(&settings.crowd),
            express_blink: false,
            signal_triggers: 0,
            tick_interval: settings.market.tick_interval(),
            blink_interval: settings.signals.blink_interval(),
        })
    }

    pub fn market(&self) -> &MarketEngine {
        &self.market
    }

    pub fn cooldowns(&self) -> &CooldownBoard {
        &self.cooldowns
    }

    /// Period of the live market ticker.
    pub fn tick_interval(&self) -> std::time::Duration {
        self.tick_interval
    }

    pub fn blink_interval(&self) -> std::time::Duration {
        self.blink_interval
    }

    pub fn select_instrument(&mut self, symbol: &str, now: DateTime<Utc>) -> Result<Vec<DashboardEvent>, EngineError> {
        self.market.select_instrument(symbol, now, self.rng.as_mut())?;
        Ok(vec![DashboardEvent::MarketReset {
            symbol: symbol.trim().to_string(),
        }])
    }

    pub fn set_playing(&mut self, playing: bool) -> Vec<DashboardEvent> {
        if self.market.set_playing(playing) {
            tracing::info!(playing, "Market playback changed");
            vec![DashboardEvent::PlaybackChanged { playing }]
        } else {
            Vec::new()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.market.is_playing()
    }

    /// One live market step: a new candle plus the crowd counter drift.
    pub fn market_tick(&mut self, now: DateTime<Utc>) -> Vec<DashboardEvent> {
        let Some(candle) = self.market.tick(now, self.rng.as_mut()) else {
            return Vec::new();
        };
        self.crowd.drift(self.rng.as_mut());
        match self.market.indicators().last() {
            Some(snapshot) => vec![DashboardEvent::CandleAppended {
                candle,
                snapshot: *snapshot,
            }],
            None => Vec::new(),
        }
    }

    /// A user asked for a signal in `category`. Ignored silently (apart from
    /// the returned event) while that category is cooling down.
    pub fn request_signal(&mut self, category: CooldownCategory, now: DateTime<Utc>) -> Vec<DashboardEvent> {
        let completed_previous = match self.cooldowns.try_trigger(category, now) {
            Trigger::Accepted { completed_previous } => completed_previous,
            Trigger::Ignored => {
                return vec![DashboardEvent::TriggerIgnored {
                    category,
                    time_left_seconds: self.cooldowns.gate(category).time_left_seconds(now),
                }];
            }
        };

        let mut events = Vec::new();
        // The previous cycle ended before any housekeeping tick saw it.
        if completed_previous {
            events.push(DashboardEvent::CooldownCompleted { category });
        }
        events.push(DashboardEvent::TriggerAccepted { category });
        if category == CooldownCategory::Express {
            let pair = random_pair(self.rng.as_mut());
            let recommendation = self.recommendations.issue(pair, now);
            tracing::info!(pair = %pair, "Express recommendation issued");
            events.push(DashboardEvent::RecommendationIssued { recommendation });
        }
        self.issue_signal(now, &mut events);
        events
    }

    fn issue_signal(&mut self, now: DateTime<Utc>, events: &mut Vec<DashboardEvent>) {
        self.signal_triggers += 1;
        let signal = self.generator.generate(now, self.rng.as_mut());
        tracing::info!(
            pair = %signal.pair,
            direction = %signal.direction,
            expiration = %signal.expiration,
            entry_price = signal.entry_price,
            "Signal issued"
        );
        self.signals.show(signal.clone());
        events.push(DashboardEvent::SignalIssued { signal });
    }

    /// The one-second tick: cooldown completions, expiry of the displayed
    /// signal and recommendation, and scheduled signal slots.
    pub fn housekeeping_tick(&mut self, now: DateTime<Utc>) -> Vec<DashboardEvent> {
        let mut events: Vec<DashboardEvent> = self
            .cooldowns
            .tick(now)
            .into_iter()
            .map(|category| DashboardEvent::CooldownCompleted { category })
            .collect();

        if let Some(signal) = self.signals.tick(now) {
            tracing::debug!(pair = %signal.pair, "Signal display window elapsed");
            events.push(DashboardEvent::SignalCleared { signal });
        }
        if let Some(recommendation) = self.recommendations.tick(now) {
            events.push(DashboardEvent::RecommendationCleared { recommendation });
        }
        if let Some(slot) = self.schedule.poll(now) {
            events.push(DashboardEvent::ScheduledSlotReached { slot });
            self.issue_signal(now, &mut events);
        }
        events
    }

    /// Cosmetic blink of the express control, only while express is ready.
    pub fn blink_tick(&mut self, now: DateTime<Utc>) -> Vec<DashboardEvent> {
        let lit = if self.cooldowns.gate(CooldownCategory::Express).is_ready(now) {
            !self.express_blink
        } else {
            false
        };
        if lit == self.express_blink {
            return Vec::new();
        }
        self.express_blink = lit;
        vec![DashboardEvent::ExpressBlink { lit }]
    }

    pub fn toggle_waiting(&mut self) -> bool {
        self.crowd.toggle_waiting()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        DashboardSnapshot {
            taken_at: now,
            market: self.market.snapshot(),
            cooldowns: self.cooldowns.states(now),
            signal: self.signals.current().cloned(),
            signal_clears_at: self.signals.clears_at(),
            recommendation: self.recommendations.current().cloned(),
            schedule: self.schedule.status(now),
            signal_triggers: self.signal_triggers,
            waiting_users: self.crowd.count(),
            waiting_for_signal: self.crowd.is_waiting(),
            express_blink: self.express_blink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::random::SequenceSource;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::models::{CurrencyPair, Direction};

    // 10:00 UTC, 13:00 at UTC+3: three hours from the next scheduled slot.
    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn dashboard(seed: u64) -> Dashboard {
        let mut dashboard = Dashboard::new(&EngineSettings::default(), Box::new(StdRng::seed_from_u64(seed))).unwrap();
        dashboard.select_instrument("EUR/USD", t0()).unwrap();
        dashboard
    }

    fn issued_signal(events: &[DashboardEvent]) -> Option<&Signal> {
        events.iter().find_map(|event| match event {
            DashboardEvent::SignalIssued { signal } => Some(signal),
            _ => None,
        })
    }

    #[test]
    fn seeded_from_base_price() {
        let dashboard = dashboard(1);
        let snapshot = dashboard.snapshot(t0());
        assert_eq!(snapshot.market.candles.len(), 50);
        assert_eq!(snapshot.market.candles[0].open, 1.0850);
        assert!(snapshot.cooldowns.iter().all(|c| c.can_use));
        assert!(snapshot.signal.is_none());
    }

    #[test]
    fn market_tick_emits_candle_with_latest_snapshot() {
        let mut dashboard = dashboard(2);
        let events = dashboard.market_tick(t0() + Duration::milliseconds(1500));
        match &events[..] {
            [DashboardEvent::CandleAppended { candle, snapshot }] => {
                assert_eq!(Some(candle.close), dashboard.market().current_price());
                assert_eq!(Some(snapshot), dashboard.market().indicators().last());
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn paused_market_emits_nothing() {
        let mut dashboard = dashboard(3);
        assert_eq!(dashboard.set_playing(false), vec![DashboardEvent::PlaybackChanged { playing: false }]);
        assert!(dashboard.set_playing(false).is_empty());
        assert!(dashboard.market_tick(t0()).is_empty());
    }

    #[test]
    fn hourly_request_issues_signal_and_starts_cooldown() {
        let mut dashboard = dashboard(4);
        let events = dashboard.request_signal(CooldownCategory::Hourly, t0());
        assert_eq!(events[0], DashboardEvent::TriggerAccepted { category: CooldownCategory::Hourly });
        let signal = issued_signal(&events).cloned().unwrap();
        assert!(CurrencyPair::ALL.contains(&signal.pair));
        assert!(matches!(signal.direction, Direction::Higher | Direction::Lower));
        assert!((1..=5).contains(&signal.expiration.minutes()));

        let snapshot = dashboard.snapshot(t0());
        let hourly = &snapshot.cooldowns[CooldownCategory::Hourly.index()];
        assert!(!hourly.can_use);
        assert_eq!(hourly.time_left_seconds, 3600);
        assert_eq!(snapshot.signal, Some(signal));
        assert_eq!(snapshot.signal_triggers, 1);
        assert!(snapshot.recommendation.is_none());
    }

    #[test]
    fn second_request_while_cooling_is_ignored() {
        let mut dashboard = dashboard(5);
        dashboard.request_signal(CooldownCategory::FiveHour, t0());
        let before = dashboard.snapshot(t0() + Duration::seconds(10));

        let events = dashboard.request_signal(CooldownCategory::FiveHour, t0() + Duration::seconds(10));
        assert_eq!(
            events,
            vec![DashboardEvent::TriggerIgnored {
                category: CooldownCategory::FiveHour,
                time_left_seconds: 5 * 3600 - 10,
            }]
        );
        assert_eq!(dashboard.snapshot(t0() + Duration::seconds(10)), before);
    }

    #[test]
    fn express_request_adds_recommendation_that_expires() {
        let mut dashboard = dashboard(6);
        let events = dashboard.request_signal(CooldownCategory::Express, t0());
        assert!(events
            .iter()
            .any(|e| matches!(e, DashboardEvent::RecommendationIssued { .. })));
        assert!(dashboard.snapshot(t0()).recommendation.is_some());

        let mut cleared = false;
        for second in 1..=30 {
            let events = dashboard.housekeeping_tick(t0() + Duration::seconds(second));
            cleared |= events
                .iter()
                .any(|e| matches!(e, DashboardEvent::RecommendationCleared { .. }));
        }
        assert!(cleared);
        let snapshot = dashboard.snapshot(t0() + Duration::seconds(30));
        assert!(snapshot.recommendation.is_none());
        // The signal outlives the recommendation.
        assert!(snapshot.signal.is_some());
        assert!(!snapshot.cooldowns[CooldownCategory::Express.index()].can_use);
    }

    #[test]
    fn signal_clears_after_sixty_simulated_seconds() {
        let mut dashboard = dashboard(7);
        let issued = issued_signal(&dashboard.request_signal(CooldownCategory::TwentyFourHour, t0()))
            .cloned()
            .unwrap();

        for second in 1..60 {
            dashboard.housekeeping_tick(t0() + Duration::seconds(second));
        }
        assert_eq!(dashboard.snapshot(t0() + Duration::seconds(59)).signal, Some(issued.clone()));

        let events = dashboard.housekeeping_tick(t0() + Duration::seconds(60));
        assert!(events.contains(&DashboardEvent::SignalCleared { signal: issued }));
        assert!(dashboard.snapshot(t0() + Duration::seconds(60)).signal.is_none());
    }

    #[test]
    fn cooldown_completion_is_reported_once() {
        let mut dashboard = dashboard(8);
        dashboard.request_signal(CooldownCategory::Express, t0());
        let mut completions = 0;
        for second in 1..=1000 {
            completions += dashboard
                .housekeeping_tick(t0() + Duration::seconds(second))
                .iter()
                .filter(|e| matches!(e, DashboardEvent::CooldownCompleted { .. }))
                .count();
        }
        assert_eq!(completions, 1);
        let events = dashboard.request_signal(CooldownCategory::Express, t0() + Duration::seconds(1000));
        assert_eq!(events[0], DashboardEvent::TriggerAccepted { category: CooldownCategory::Express });
    }

    #[test]
    fn request_right_after_deadline_still_reports_completion() {
        let mut dashboard = dashboard(11);
        dashboard.request_signal(CooldownCategory::Express, t0());
        let mut completions = 0;
        for second in 1..900 {
            completions += dashboard
                .housekeeping_tick(t0() + Duration::seconds(second))
                .iter()
                .filter(|e| matches!(e, DashboardEvent::CooldownCompleted { .. }))
                .count();
        }
        assert_eq!(completions, 0);

        // No tick between the deadline and this request.
        let events = dashboard.request_signal(CooldownCategory::Express, t0() + Duration::milliseconds(900_400));
        assert_eq!(
            events[..2],
            [
                DashboardEvent::CooldownCompleted { category: CooldownCategory::Express },
                DashboardEvent::TriggerAccepted { category: CooldownCategory::Express },
            ]
        );
        for second in 901..1000 {
            completions += dashboard
                .housekeeping_tick(t0() + Duration::seconds(second))
                .iter()
                .filter(|e| matches!(e, DashboardEvent::CooldownCompleted { .. }))
                .count();
        }
        assert_eq!(completions, 0);
    }

    #[test]
    fn scheduled_slot_issues_a_signal() {
        let mut dashboard = dashboard(9);
        // Arms the schedule: next slot 16:00 at UTC+3, 13:00 UTC.
        assert!(dashboard.housekeeping_tick(t0()).is_empty());
        let slot = t0() + Duration::hours(3);
        assert_eq!(dashboard.snapshot(t0()).schedule.next_slot, slot);

        let events = dashboard.housekeeping_tick(slot);
        assert_eq!(events[0], DashboardEvent::ScheduledSlotReached { slot });
        assert!(issued_signal(&events).is_some());
        // Scheduled signals do not consume any cooldown.
        assert!(dashboard.snapshot(slot).cooldowns.iter().all(|c| c.can_use));
    }

    #[test]
    fn blink_toggles_only_while_express_ready() {
        let mut dashboard = dashboard(10);
        assert_eq!(dashboard.blink_tick(t0()), vec![DashboardEvent::ExpressBlink { lit: true }]);
        assert_eq!(dashboard.blink_tick(t0()), vec![DashboardEvent::ExpressBlink { lit: false }]);
        assert_eq!(dashboard.blink_tick(t0()), vec![DashboardEvent::ExpressBlink { lit: true }]);

        dashboard.request_signal(CooldownCategory::Express, t0());
        assert_eq!(dashboard.blink_tick(t0()), vec![DashboardEvent::ExpressBlink { lit: false }]);
        assert!(dashboard.blink_tick(t0() + Duration::seconds(2)).is_empty());
        assert!(!dashboard.snapshot(t0()).express_blink);
    }

    #[test]
    fn fixed_sequence_reproduces_market() {
        let run = || {
            let rng = SequenceSource::new(vec![0.21, 0.67, 0.43, 0.12, 0.88, 0.5, 0.31]);
            let mut dashboard = Dashboard::new(&EngineSettings::default(), Box::new(rng)).unwrap();
            dashboard.select_instrument("USD/CHF", t0()).unwrap();
            for i in 1..=10 {
                dashboard.market_tick(t0() + Duration::milliseconds(1500 * i));
            }
            dashboard.snapshot(t0()).market
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut settings = EngineSettings::default();
        settings.market.window_size = 0;
        assert!(Dashboard::new(&settings, Box::new(SequenceSource::constant(0.5))).is_err());
    }
}
