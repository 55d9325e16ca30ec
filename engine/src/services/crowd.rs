// Decorative "users waiting for a signal" counter.
use crate::config::settings::CrowdSettings;
use crate::data::random::RandomSource;

#[derive(Debug, Clone)]
pub struct WaitingUsers {
    count: u32,
    min: u32,
    max: u32,
    max_step: u32,
    waiting: bool,
}

impl WaitingUsers {
    pub fn new(settings: &CrowdSettings) -> Self {
        Self {
            count: settings.initial.clamp(settings.min, settings.max),
            min: settings.min,
            max: settings.max,
            max_step: settings.max_step,
            waiting: false,
        }
    }

    /// Random walk step of `floor((r - 0.5) * 2 * max_step)`, kept in bounds.
    pub fn drift(&mut self, rng: &mut dyn RandomSource) -> u32 {
        let change = ((rng.next_unit() - 0.5) * 2.0 * self.max_step as f64).floor() as i64;
        self.set(self.count as i64 + change);
        self.count
    }

    /// Toggles this viewer's own "wait for signal" flag.
    pub fn toggle_waiting(&mut self) -> bool {
        self.waiting = !self.waiting;
        let delta = if self.waiting { 1 } else { -1 };
        self.set(self.count as i64 + delta);
        self.waiting
    }

    fn set(&mut self, value: i64) {
        self.count = value.clamp(self.min as i64, self.max as i64) as u32;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }
}
