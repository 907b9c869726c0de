use crate::{
    api::units::{TimeDelta, Timestamp},
    MinRttFilter,
};

/// Coarse regulator phase. Congestion signals move to `Backoff`, healthy ticks
/// move back to `Growth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegulatorPhase {
    #[default]
    Growth,
    Backoff,
}

/// Mutable per-session algorithm state. Owned by one session, handed by `&mut`
/// to the session's algorithm each tick and dropped with the session.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmState {
    pub(crate) rtt_baseline: MinRttFilter,
    pub(crate) last_decrease: Option<Timestamp>,
    pub(crate) healthy_ticks: u32,
    pub(crate) phase: RegulatorPhase,
    pub(crate) last_consumed: Option<Timestamp>,
}

impl AlgorithmState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RegulatorPhase {
        self.phase
    }

    pub fn healthy_ticks(&self) -> u32 {
        self.healthy_ticks
    }

    pub fn last_decrease(&self) -> Option<Timestamp> {
        self.last_decrease
    }

    pub fn rtt_baseline(&self) -> Option<TimeDelta> {
        self.rtt_baseline.baseline()
    }

    /// Timestamp of the newest snapshot a tick has acted on.
    pub fn last_consumed(&self) -> Option<Timestamp> {
        self.last_consumed
    }

    // Marks `snapshot_time` as consumed. Returns the previous timestamp as an
    // error when the snapshot is not strictly newer.
    pub(crate) fn consume(&mut self, snapshot_time: Timestamp) -> Result<(), Timestamp> {
        match self.last_consumed {
            Some(previous) if snapshot_time <= previous => Err(previous),
            _ => {
                self.last_consumed = Some(snapshot_time);
                Ok(())
            }
        }
    }

    pub(crate) fn on_backoff(&mut self, at_time: Timestamp) {
        self.phase = RegulatorPhase::Backoff;
        self.last_decrease = Some(at_time);
        self.healthy_ticks = 0;
    }

    pub(crate) fn on_healthy_tick(&mut self) {
        self.phase = RegulatorPhase::Growth;
        self.healthy_ticks = self.healthy_ticks.saturating_add(1);
    }
}
