// Daily scheduled signal slots and the "time to next signal" progress view.
use crate::config::settings::SignalSettings;
use crate::error::EngineError;
use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, Utc};
use shared::models::{AnalysisStage, ScheduleStatus};

#[derive(Debug, Clone)]
pub struct SignalClock {
    hours: Vec<u32>,
    offset: FixedOffset,
    horizon_secs: u64,
    armed: Option<DateTime<Utc>>,
}

impl SignalClock {
    pub fn new(settings: &SignalSettings) -> Result<Self, EngineError> {
        let offset = FixedOffset::east_opt(settings.schedule_utc_offset_hours * 3600).ok_or_else(|| {
            EngineError::ConfigError(format!(
                "invalid schedule offset {}h",
                settings.schedule_utc_offset_hours
            ))
        })?;
        let mut hours: Vec<u32> = settings.scheduled_hours.iter().copied().filter(|h| *h < 24).collect();
        hours.sort_unstable();
        hours.dedup();
        if hours.is_empty() {
            return Err(EngineError::ConfigError("no valid scheduled signal hours".to_string()));
        }
        Ok(Self {
            hours,
            offset,
            horizon_secs: settings.schedule_horizon_secs.max(1),
            armed: None,
        })
    }

    fn slot_on(&self, date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
        date.and_hms_opt(hour, 0, 0)?
            .and_local_timezone(self.offset)
            .single()
            .map(|local| local.with_timezone(&Utc))
    }

    /// First slot strictly after `now`.
    pub fn next_slot(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.with_timezone(&self.offset).date_naive();
        (0..=1)
            .filter_map(|days| today.checked_add_days(Days::new(days)))
            .flat_map(|date| self.hours.iter().filter_map(move |hour| self.slot_on(date, *hour)))
            .find(|slot| *slot > now)
            .unwrap_or_else(|| now + Duration::days(1))
    }

    pub fn status(&self, now: DateTime<Utc>) -> ScheduleStatus {
        let next_slot = self.armed.filter(|slot| *slot > now).unwrap_or_else(|| self.next_slot(now));
        let millis = (next_slot - now).num_milliseconds().max(0);
        let time_left_seconds = ((millis + 999) / 1000) as u64;

        let progress_percent = if time_left_seconds > 0 {
            let horizon = self.horizon_secs as f64;
            ((horizon - time_left_seconds as f64) / horizon * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        ScheduleStatus {
            next_slot,
            time_left_seconds,
            horizon_seconds: self.horizon_secs,
            progress_percent,
            stage: AnalysisStage::from_progress(progress_percent),
        }
    }

    /// Returns the slot that `now` has reached, at most once per slot. The
    /// first call only arms the clock.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.armed {
            None => {
                self.armed = Some(self.next_slot(now));
                None
            }
            Some(slot) if now >= slot => {
                self.armed = Some(self.next_slot(now));
                tracing::info!(slot = %slot, next = ?self.armed, "Scheduled signal slot reached");
                Some(slot)
            }
            Some(_) => None,
        }
    }
}
