use std::fmt;

use crate::{
    api::{transport::NetworkStatsSnapshot, units::DataRate},
    config::BitrateRange,
    error::AlgorithmFault,
    AlgorithmState,
};

/// What every algorithm sees on a tick.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    // Current video bitrate, already clamped into `range`.
    pub current: DataRate,
    pub snapshot: &'a NetworkStatsSnapshot,
    pub range: BitrateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionReason {
    LossBackoff,
    BufferBackoff,
    RttBackoff,
    AdditiveIncrease,
    InFlightIncrease,
    Hold,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::LossBackoff => "loss backoff",
            Self::BufferBackoff => "buffer backoff",
            Self::RttBackoff => "rtt backoff",
            Self::AdditiveIncrease => "additive increase",
            Self::InFlightIncrease => "in-flight increase",
            Self::Hold => "hold",
        })
    }
}

/// A proposed bitrate, before the controller clamps it into the session range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub proposed: DataRate,
    pub reason: DecisionReason,
}

impl Decision {
    pub const fn new(proposed: DataRate, reason: DecisionReason) -> Self {
        Self { proposed, reason }
    }

    pub const fn hold(current: DataRate) -> Self {
        Self::new(current, DecisionReason::Hold)
    }
}

pub trait BitrateAlgorithmInterface {
    // Short name used in logs and fault reports.
    fn name(&self) -> &'static str;

    // Proposes the next video bitrate. `state` belongs to the calling session and
    // is only ever handed to one algorithm instance.
    fn decide(
        &self,
        input: &DecisionInput,
        state: &mut AlgorithmState,
    ) -> Result<Decision, AlgorithmFault>;
}

// Converts an intermediate bits-per-second value, rejecting results that have no
// DataRate representation.
pub(crate) fn checked_rate(algorithm: &'static str, bps: f64) -> Result<DataRate, AlgorithmFault> {
    if !bps.is_finite() || bps < 0.0 || bps >= i64::MAX as f64 {
        return Err(AlgorithmFault::InvalidRate {
            algorithm,
            value: bps,
        });
    }
    Ok(DataRate::from_bits_per_sec_float(bps))
}
