use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    api::{
        regulator_control::{EncoderHandle, StatsSource},
        units::{DataRate, Timestamp},
    },
    config::{AlgorithmSelection, BitrateRange},
    error::{RegulatorError, TelemetryUnavailable},
    AlgorithmState, AlgorithmStrategy, BitrateAlgorithmInterface, DecisionInput, DecisionReason,
};

/// Events a session keeps after `take_events` is called. Older unread events
/// are kept, newer ones are dropped.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Non-fatal reports from a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum RegulatorEvent {
    /// The regulator wrote a new video bitrate to the encoder.
    BitrateChanged {
        at: Timestamp,
        from: DataRate,
        to: DataRate,
        reason: DecisionReason,
    },
    Error(RegulatorError),
}

#[derive(Debug, Clone)]
pub(crate) struct EventSink(mpsc::Sender<RegulatorEvent>);

impl EventSink {
    pub(crate) fn channel() -> (Self, mpsc::Receiver<RegulatorEvent>) {
        let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (Self(sender), receiver)
    }

    pub(crate) fn report(&self, event: RegulatorEvent) {
        if self.0.try_send(event).is_err() {
            tracing::debug!("Regulator event channel full or closed, dropping event");
        }
    }

    pub(crate) fn error(&self, error: impl Into<RegulatorError>) {
        self.report(RegulatorEvent::Error(error.into()));
    }
}

// Liveness of one session. The stopped flag doubles as the write gate: encoder
// writes happen with it locked and only while it is false, and stopping takes
// the same lock.
#[derive(Debug, Default)]
pub(crate) struct SessionLiveness {
    stopped: Mutex<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionLiveness {
    pub(crate) fn set_task(&self, task: JoinHandle<()>) {
        let mut slot = lock(&self.task);
        if self.is_stopped() {
            task.abort();
            return;
        }
        *slot = Some(task);
    }

    // Returns true for the call that actually stopped the session.
    pub(crate) fn stop(&self) -> bool {
        let newly_stopped = !std::mem::replace(&mut *lock(&self.stopped), true);
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
        newly_stopped
    }

    pub(crate) fn is_stopped(&self) -> bool {
        *lock(&self.stopped)
    }

    // Runs `write` with the gate held, unless the session is stopped.
    pub(crate) fn gated<T>(&self, write: impl FnOnce() -> T) -> Option<T> {
        let stopped = lock(&self.stopped);
        if *stopped {
            return None;
        }
        Some(write())
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to one regulated stream. Stopping it, explicitly or by dropping it,
/// guarantees the regulator makes no further encoder writes for the stream.
///
/// Encoder handles must not stop the session from inside their setters.
#[derive(Debug)]
pub struct RegulatorSession {
    liveness: Arc<SessionLiveness>,
    selection: AlgorithmSelection,
    events: Option<mpsc::Receiver<RegulatorEvent>>,
}

impl RegulatorSession {
    pub(crate) fn new(
        liveness: Arc<SessionLiveness>,
        selection: AlgorithmSelection,
        events: mpsc::Receiver<RegulatorEvent>,
    ) -> Self {
        Self {
            liveness,
            selection,
            events: Some(events),
        }
    }

    /// Stops ticking. Idempotent; once it returns no further write happens, an
    /// in-flight write finishes before it returns.
    pub fn stop(&self) {
        if self.liveness.stop() {
            tracing::info!(algorithm = %self.selection, "Bitrate regulation stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        !self.liveness.is_stopped()
    }

    /// The event receiver. Only the first call returns it.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<RegulatorEvent>> {
        self.events.take()
    }

    pub fn selection(&self) -> AlgorithmSelection {
        self.selection
    }
}

impl Drop for RegulatorSession {
    fn drop(&mut self) {
        self.stop();
    }
}

// Writes `target`. When the encoder rejects it, retries once with the closest
// value both the encoder and `range` accept. Returns what was written.
pub(crate) fn apply_video_bitrate(
    encoder: &dyn EncoderHandle,
    range: BitrateRange,
    target: DataRate,
    events: &EventSink,
) -> Option<DataRate> {
    let rejected = match encoder.set_video_bitrate(target) {
        Ok(()) => return Some(target),
        Err(rejected) => rejected,
    };
    tracing::warn!(%rejected, "Encoder rejected video bitrate");
    events.error(rejected);

    let fallback = range.clamp(rejected.nearest_supported());
    if fallback == target {
        return None;
    }
    match encoder.set_video_bitrate(fallback) {
        Ok(()) => Some(fallback),
        Err(rejected) => {
            tracing::warn!(%rejected, "Encoder rejected fallback video bitrate");
            events.error(rejected);
            None
        }
    }
}

/// Everything one session's tick needs. Owned by the session's tick task.
pub(crate) struct TickLoop {
    range: BitrateRange,
    strategy: AlgorithmStrategy,
    state: AlgorithmState,
    stats: Arc<dyn StatsSource>,
    encoder: Arc<dyn EncoderHandle>,
    liveness: Arc<SessionLiveness>,
    events: EventSink,
}

impl TickLoop {
    pub(crate) fn new(
        range: BitrateRange,
        strategy: AlgorithmStrategy,
        stats: Arc<dyn StatsSource>,
        encoder: Arc<dyn EncoderHandle>,
        liveness: Arc<SessionLiveness>,
        events: EventSink,
    ) -> Self {
        Self {
            range,
            strategy,
            state: AlgorithmState::new(),
            stats,
            encoder,
            liveness,
            events,
        }
    }

    // The first tick fires one period after start. A tick that overruns delays
    // the following ones instead of bunching them up. A tick that panics stops
    // the session, so the handle reports it as inactive.
    pub(crate) async fn run(mut self, period: Duration) {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.liveness.is_stopped() {
                break;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| self.tick())).is_err() {
                tracing::error!(
                    algorithm = self.strategy.name(),
                    "Regulator tick panicked, stopping session"
                );
                self.liveness.stop();
                break;
            }
        }
    }

    pub(crate) fn tick(&mut self) {
        match self.try_tick() {
            Ok(()) => {}
            Err(RegulatorError::Telemetry(reason)) => {
                tracing::debug!(%reason, "No usable telemetry, keeping bitrate");
            }
            Err(error) => {
                tracing::warn!(algorithm = self.strategy.name(), %error, "Skipping regulator tick");
                self.events.error(error);
            }
        }
    }

    fn try_tick(&mut self) -> Result<(), RegulatorError> {
        let snapshot = self
            .stats
            .latest_snapshot()
            .ok_or(TelemetryUnavailable::NoSnapshot)?;
        self.state
            .consume(snapshot.timestamp)
            .map_err(|previous| TelemetryUnavailable::Stale {
                latest: snapshot.timestamp,
                previous,
            })?;

        // Someone else may have changed the bitrate since the last tick; start
        // from whatever the encoder runs at now.
        let encoder_bitrate = self.encoder.video_bitrate();
        let current = self.range.clamp(encoder_bitrate);
        let decision = self.strategy.decide(
            &DecisionInput {
                current,
                snapshot: &snapshot,
                range: self.range,
            },
            &mut self.state,
        )?;
        let target = self.range.clamp(decision.proposed);
        tracing::debug!(
            algorithm = self.strategy.name(),
            rtt = %snapshot.round_trip_time,
            loss_fraction = snapshot.loss_fraction(),
            packets_in_flight = snapshot.packets_in_flight,
            %current,
            proposed = %decision.proposed,
            %target,
            reason = %decision.reason,
            "Bitrate decision"
        );
        if target == encoder_bitrate {
            return Ok(());
        }

        let applied = self.liveness.gated(|| {
            apply_video_bitrate(self.encoder.as_ref(), self.range, target, &self.events)
        });
        if let Some(Some(applied)) = applied {
            if applied != encoder_bitrate {
                tracing::debug!(
                    from = %encoder_bitrate,
                    to = %applied,
                    reason = %decision.reason,
                    "Video bitrate updated"
                );
                self.events.report(RegulatorEvent::BitrateChanged {
                    at: snapshot.timestamp,
                    from: encoder_bitrate,
                    to: applied,
                    reason: decision.reason,
                });
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &AlgorithmState {
        &self.state
    }
}
