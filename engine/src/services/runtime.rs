// Timer tasks driving a shared `Dashboard`. Each periodic activity is its own
// task tied to one cancellation token; shutdown cancels and joins all of them.
use crate::error::EngineError;
use crate::services::dashboard::{Dashboard, DashboardEvent, DashboardSnapshot};
use chrono::{DateTime, Utc};
use shared::models::{CooldownCategory, Indicator};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(1);

pub type SharedDashboard = Arc<RwLock<Dashboard>>;

/// Source of wall-clock time for the state machines.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall time that advances with tokio's clock, so paused test time moves it.
pub struct TokioClock {
    wall_origin: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    pub fn starting_at(wall_origin: DateTime<Utc>) -> Self {
        Self {
            wall_origin,
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        self.wall_origin + elapsed
    }
}

fn publish(events: &broadcast::Sender<DashboardEvent>, produced: Vec<DashboardEvent>) {
    for event in produced {
        // No subscribers is not an error.
        let _ = events.send(event);
    }
}

pub struct DashboardHandle {
    dashboard: SharedDashboard,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<DashboardEvent>,
    playing: watch::Sender<bool>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl DashboardHandle {
    /// Starts the market ticker, the one-second housekeeping tick and the
    /// express blink. Must be called inside a tokio runtime.
    pub fn spawn(dashboard: Dashboard, clock: Arc<dyn Clock>) -> Self {
        let tick_interval = dashboard.tick_interval();
        let blink_interval = dashboard.blink_interval();
        let (playing, playing_rx) = watch::channel(dashboard.is_playing());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let dashboard = Arc::new(RwLock::new(dashboard));
        let cancel = CancellationToken::new();

        let tasks = vec![
            tokio::spawn(run_market_ticker(
                dashboard.clone(),
                clock.clone(),
                events.clone(),
                playing_rx,
                tick_interval,
                cancel.clone(),
            )),
            tokio::spawn(run_periodic(
                dashboard.clone(),
                clock.clone(),
                events.clone(),
                HOUSEKEEPING_INTERVAL,
                cancel.clone(),
                Dashboard::housekeeping_tick,
            )),
            tokio::spawn(run_periodic(
                dashboard.clone(),
                clock.clone(),
                events.clone(),
                blink_interval,
                cancel.clone(),
                Dashboard::blink_tick,
            )),
        ];
        tracing::info!(
            tick_ms = tick_interval.as_millis() as u64,
            blink_ms = blink_interval.as_millis() as u64,
            "Dashboard timers started"
        );

        Self {
            dashboard,
            clock,
            events,
            playing,
            cancel,
            tasks,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn shared(&self) -> SharedDashboard {
        self.dashboard.clone()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let now = self.clock.now();
        self.dashboard.read().await.snapshot(now)
    }

    /// Named indicator lines over the current window.
    pub async fn indicator_lines(&self) -> Result<Vec<Indicator>, EngineError> {
        self.dashboard.read().await.market().indicator_lines()
    }

    /// Returns whether the request was accepted.
    pub async fn request_signal(&self, category: CooldownCategory) -> bool {
        let now = self.clock.now();
        let produced = self.dashboard.write().await.request_signal(category, now);
        let accepted = produced
            .iter()
            .any(|event| matches!(event, DashboardEvent::TriggerAccepted { .. }));
        publish(&self.events, produced);
        accepted
    }

    pub async fn select_instrument(&self, symbol: &str) -> Result<(), EngineError> {
        let now = self.clock.now();
        let produced = self.dashboard.write().await.select_instrument(symbol, now)?;
        publish(&self.events, produced);
        Ok(())
    }

    pub async fn set_playing(&self, playing: bool) {
        let produced = self.dashboard.write().await.set_playing(playing);
        publish(&self.events, produced);
        self.playing.send_if_modified(|current| {
            let changed = *current != playing;
            *current = playing;
            changed
        });
    }

    pub async fn toggle_playing(&self) -> bool {
        let playing = !*self.playing.borrow();
        self.set_playing(playing).await;
        playing
    }

    pub async fn toggle_waiting(&self) -> bool {
        self.dashboard.write().await.toggle_waiting()
    }

    /// Cancels every timer and waits for them to finish. No state changes
    /// and no events happen after this returns.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Dashboard task ended abnormally");
            }
        }
        tracing::info!("Dashboard timers stopped");
    }
}

impl Drop for DashboardHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn run_market_ticker(
    dashboard: SharedDashboard,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<DashboardEvent>,
    mut playing: watch::Receiver<bool>,
    period: Duration,
    cancel: CancellationToken,
) {
    loop {
        if !*playing.borrow_and_update() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                changed = playing.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
            }
        }

        // Restarted on every resume so the first live candle comes one full
        // period after playback starts.
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                changed = playing.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*playing.borrow_and_update() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let now = clock.now();
                    let produced = dashboard.write().await.market_tick(now);
                    publish(&events, produced);
                }
            }
        }
    }
}

async fn run_periodic(
    dashboard: SharedDashboard,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<DashboardEvent>,
    period: Duration,
    cancel: CancellationToken,
    step: fn(&mut Dashboard, DateTime<Utc>) -> Vec<DashboardEvent>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let now = clock.now();
                let produced = step(&mut *dashboard.write().await, now);
                publish(&events, produced);
            }
        }
    }
}
