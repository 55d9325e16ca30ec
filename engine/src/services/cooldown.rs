// Fixed-duration gates in front of the "request signal" actions.
use crate::config::settings::{CooldownSettings, MAX_DURATION_SECS};
use chrono::{DateTime, Duration, Utc};
use shared::models::{CooldownCategory, CooldownState};

/// Outcome of a trigger attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A new cycle started. `completed_previous` is set when the attempt also
    /// closed a finished cycle that no tick had reported yet.
    Accepted { completed_previous: bool },
    Ignored,
}

impl Trigger {
    pub fn is_accepted(self) -> bool {
        matches!(self, Trigger::Accepted { .. })
    }
}

/// One category's READY/COOLING state machine. The deadline derived from the
/// trigger time is the only source of truth; the countdown is recomputed from
/// it on every read so it cannot drift.
#[derive(Debug, Clone)]
pub struct Cooldown {
    category: CooldownCategory,
    duration: Duration,
    last_trigger: Option<DateTime<Utc>>,
}

impl Cooldown {
    pub fn new(category: CooldownCategory, duration_secs: u64) -> Self {
        Self {
            category,
            duration: Duration::seconds(duration_secs.min(MAX_DURATION_SECS) as i64),
            last_trigger: None,
        }
    }

    pub fn category(&self) -> CooldownCategory {
        self.category
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration.num_seconds() as u64
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.last_trigger.map(|at| at + self.duration)
    }

    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.deadline().map_or(true, |deadline| now >= deadline)
    }

    /// READY -> COOLING. A trigger while cooling is ignored and leaves the
    /// countdown untouched.
    pub fn try_trigger(&mut self, now: DateTime<Utc>) -> Trigger {
        let completed_previous = self.refresh(now);
        if self.last_trigger.is_some() {
            tracing::debug!(
                category = %self.category,
                time_left_seconds = self.time_left_seconds(now),
                "Trigger ignored while cooling down"
            );
            return Trigger::Ignored;
        }
        self.last_trigger = Some(now);
        tracing::info!(category = %self.category, duration_secs = self.duration_secs(), "Cooldown started");
        Trigger::Accepted { completed_previous }
    }

    /// COOLING -> READY once the deadline has passed. Returns true exactly
    /// once per completed cycle.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last_trigger = None;
                tracing::info!(category = %self.category, "Cooldown completed");
                true
            }
            _ => false,
        }
    }

    /// Whole seconds until the deadline, rounded up.
    pub fn time_left_seconds(&self, now: DateTime<Utc>) -> u64 {
        match self.deadline() {
            Some(deadline) if deadline > now => {
                let millis = (deadline - now).num_milliseconds();
                ((millis + 999) / 1000) as u64
            }
            _ => 0,
        }
    }

    pub fn state(&self, now: DateTime<Utc>) -> CooldownState {
        let can_use = self.is_ready(now);
        CooldownState {
            category: self.category,
            can_use,
            last_trigger_time: if can_use { None } else { self.last_trigger },
            time_left_seconds: self.time_left_seconds(now),
        }
    }
}

/// The four independent gates, one per category.
#[derive(Debug, Clone)]
pub struct CooldownBoard {
    gates: [Cooldown; 4],
}

impl CooldownBoard {
    pub fn new(settings: &CooldownSettings) -> Self {
        Self {
            gates: CooldownCategory::ALL.map(|category| Cooldown::new(category, settings.duration_secs(category))),
        }
    }

    pub fn gate(&self, category: CooldownCategory) -> &Cooldown {
        &self.gates[category.index()]
    }

    pub fn try_trigger(&mut self, category: CooldownCategory, now: DateTime<Utc>) -> Trigger {
        self.gates[category.index()].try_trigger(now)
    }

    /// Advances every gate; returns the categories that became ready.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<CooldownCategory> {
        self.gates
            .iter_mut()
            .filter_map(|gate| gate.refresh(now).then_some(gate.category()))
            .collect()
    }

    pub fn states(&self, now: DateTime<Utc>) -> Vec<CooldownState> {
        self.gates.iter().map(|gate| gate.state(now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn fresh_gate_is_ready() {
        let gate = Cooldown::new(CooldownCategory::Express, 900);
        let state = gate.state(t0());
        assert!(state.can_use);
        assert_eq!(state.time_left_seconds, 0);
        assert_eq!(state.last_trigger_time, None);
    }

    #[test]
    fn trigger_sets_full_countdown_for_every_category() {
        let settings = CooldownSettings::default();
        let mut board = CooldownBoard::new(&settings);
        for category in CooldownCategory::ALL {
            assert!(board.try_trigger(category, t0()).is_accepted());
            let state = board.gate(category).state(t0());
            assert!(!state.can_use);
            assert_eq!(state.time_left_seconds, settings.duration_secs(category));
            assert_eq!(state.last_trigger_time, Some(t0()));
        }
    }

    #[test]
    fn retrigger_while_cooling_changes_nothing() {
        let mut gate = Cooldown::new(CooldownCategory::FiveHour, 5 * 3600);
        assert!(gate.try_trigger(t0()).is_accepted());
        let later = t0() + Duration::seconds(120);
        let before = gate.state(later);

        assert_eq!(gate.try_trigger(later), Trigger::Ignored);
        assert_eq!(gate.state(later), before);
        assert_eq!(gate.deadline(), Some(t0() + Duration::hours(5)));
    }

    #[test]
    fn hourly_countdown_completes_after_3600_ticks() {
        let mut board = CooldownBoard::new(&CooldownSettings::default());
        assert!(board.try_trigger(CooldownCategory::Hourly, t0()).is_accepted());
        let state = board.gate(CooldownCategory::Hourly).state(t0());
        assert!(!state.can_use);
        assert_eq!(state.time_left_seconds, 3600);

        let mut completions = Vec::new();
        for second in 1..=3600 {
            let now = t0() + Duration::seconds(second);
            completions.extend(board.tick(now));
            let state = board.gate(CooldownCategory::Hourly).state(now);
            assert_eq!(state.time_left_seconds, 3600 - second as u64);
            assert_eq!(state.can_use, state.time_left_seconds == 0);
        }

        let state = board.gate(CooldownCategory::Hourly).state(t0() + Duration::seconds(3600));
        assert!(state.can_use);
        assert_eq!(state.time_left_seconds, 0);
        assert_eq!(state.last_trigger_time, None);
        assert_eq!(completions, vec![CooldownCategory::Hourly]);
    }

    #[test]
    fn countdown_rounds_partial_seconds_up() {
        let mut gate = Cooldown::new(CooldownCategory::Express, 900);
        gate.try_trigger(t0());
        assert_eq!(gate.time_left_seconds(t0() + Duration::milliseconds(300)), 900);
        assert_eq!(gate.time_left_seconds(t0() + Duration::milliseconds(1000)), 899);
    }

    #[test]
    fn late_refresh_still_reports_ready() {
        // No tick ran for a while: the view is derived from the deadline anyway.
        let mut gate = Cooldown::new(CooldownCategory::Express, 900);
        gate.try_trigger(t0());
        let much_later = t0() + Duration::hours(2);
        assert!(gate.state(much_later).can_use);
        assert!(gate.refresh(much_later));
        assert!(!gate.refresh(much_later));
        assert_eq!(
            gate.try_trigger(much_later),
            Trigger::Accepted { completed_previous: false }
        );
    }

    #[test]
    fn trigger_between_deadline_and_tick_reports_completion() {
        let mut gate = Cooldown::new(CooldownCategory::Express, 900);
        assert_eq!(gate.try_trigger(t0()), Trigger::Accepted { completed_previous: false });
        let just_after = t0() + Duration::milliseconds(900_400);
        assert_eq!(gate.try_trigger(just_after), Trigger::Accepted { completed_previous: true });
        assert_eq!(gate.deadline(), Some(just_after + Duration::seconds(900)));
        assert!(!gate.refresh(just_after + Duration::milliseconds(600)));
    }

    #[test]
    fn oversized_duration_is_clamped() {
        let mut gate = Cooldown::new(CooldownCategory::TwentyFourHour, u64::MAX);
        assert_eq!(gate.duration_secs(), MAX_DURATION_SECS);
        assert!(gate.try_trigger(t0()).is_accepted());
        assert_eq!(gate.time_left_seconds(t0()), MAX_DURATION_SECS);
    }

    #[test]
    fn categories_are_independent() {
        let mut board = CooldownBoard::new(&CooldownSettings::default());
        board.try_trigger(CooldownCategory::Express, t0());
        let states = board.states(t0());
        assert!(!states[0].can_use);
        assert!(states[1..].iter().all(|s| s.can_use));

        let completed = board.tick(t0() + Duration::minutes(15));
        assert_eq!(completed, vec![CooldownCategory::Express]);
    }
}
