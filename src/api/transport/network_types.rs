use crate::api::units::{DataRate, DataSize, TimeDelta, Timestamp};

/// Transport statistics sampled once per regulator tick. Counters ending in
/// `_since_last_snapshot` are deltas against the previous snapshot produced by the
/// same source, the rest are instantaneous readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStatsSnapshot {
    /// When the transport produced the snapshot. Strictly increasing per session.
    pub timestamp: Timestamp,
    pub measured_bandwidth: DataRate,
    pub round_trip_time: TimeDelta,
    /// Packets sent but not yet acknowledged.
    pub packets_in_flight: u64,
    /// Bytes queued at the sender awaiting transmission or acknowledgement.
    pub send_buffer_occupancy: DataSize,
    pub packets_lost_since_last_snapshot: u64,
    pub packets_sent_since_last_snapshot: u64,
}

impl Default for NetworkStatsSnapshot {
    fn default() -> Self {
        Self {
            timestamp: Timestamp::zero(),
            measured_bandwidth: DataRate::zero(),
            round_trip_time: TimeDelta::zero(),
            packets_in_flight: 0,
            send_buffer_occupancy: DataSize::zero(),
            packets_lost_since_last_snapshot: 0,
            packets_sent_since_last_snapshot: 0,
        }
    }
}

impl NetworkStatsSnapshot {
    pub fn has_loss(&self) -> bool {
        self.packets_lost_since_last_snapshot > 0
    }

    // Fraction of the packets accounted for in this interval that were lost.
    pub fn loss_fraction(&self) -> f64 {
        let total = self.packets_lost_since_last_snapshot + self.packets_sent_since_last_snapshot;
        if total == 0 {
            return 0.0;
        }
        self.packets_lost_since_last_snapshot as f64 / total as f64
    }
}
