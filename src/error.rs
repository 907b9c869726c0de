use thiserror::Error;

use crate::api::units::{DataRate, TimeDelta, Timestamp};

/// Rejected session configuration. Surfaced synchronously by `start()`; the
/// session never begins and the encoder is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("video bitrate bounds must be positive and finite (min {min_bps} bps, max {max_bps} bps)")]
    NonPositiveBound { min_bps: i64, max_bps: i64 },
    #[error("minimum video bitrate {min} exceeds maximum {max}")]
    InvertedRange { min: DataRate, max: DataRate },
    #[error("initial bitrate {initial_bps} bps outside [{min}, {max}]")]
    InitialOutOfRange {
        initial_bps: i64,
        min: DataRate,
        max: DataRate,
    },
    #[error("tick interval must be positive, got {0}")]
    NonPositiveTickInterval(TimeDelta),
    #[error("audio bitrate must be positive, got {0}")]
    NonPositiveAudioBitrate(DataRate),
    #[error("unknown bitrate algorithm {0:?}")]
    UnknownAlgorithm(String),
}

/// No usable snapshot for a tick. Recovered locally by skipping the tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryUnavailable {
    #[error("stats source has no snapshot")]
    NoSnapshot,
    #[error("snapshot at {latest} is not newer than the last consumed one at {previous}")]
    Stale {
        latest: Timestamp,
        previous: Timestamp,
    },
}

/// Decision logic failed for one tick. The tick is skipped and the bitrate kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlgorithmFault {
    #[error("{algorithm} produced an unusable rate of {value} bps")]
    InvalidRate { algorithm: &'static str, value: f64 },
    #[error("{algorithm} got an unusable round trip time {rtt}")]
    InvalidRoundTripTime {
        algorithm: &'static str,
        rtt: TimeDelta,
    },
}

/// The encoder refused a bitrate, reporting the range its codec supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("encoder rejected {requested}, supported range is [{supported_min}, {supported_max}]")]
pub struct ApplyRejected {
    pub requested: DataRate,
    pub supported_min: DataRate,
    pub supported_max: DataRate,
}

impl ApplyRejected {
    /// The supported value closest to the rejected request.
    pub fn nearest_supported(&self) -> DataRate {
        self.requested
            .clamped(self.supported_min, self.supported_max)
    }
}

/// Runtime errors a running session reports without stopping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegulatorError {
    #[error("telemetry unavailable: {0}")]
    Telemetry(#[from] TelemetryUnavailable),
    #[error("algorithm fault: {0}")]
    Algorithm(#[from] AlgorithmFault),
    #[error("apply rejected: {0}")]
    ApplyRejected(#[from] ApplyRejected),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nearest_supported_clamps_to_codec_range() {
        let rejected = ApplyRejected {
            requested: DataRate::from_kilobits_per_sec(12_000),
            supported_min: DataRate::from_kilobits_per_sec(100),
            supported_max: DataRate::from_kilobits_per_sec(8_000),
        };
        assert_eq!(
            rejected.nearest_supported(),
            DataRate::from_kilobits_per_sec(8_000)
        );

        let rejected = ApplyRejected {
            requested: DataRate::from_kilobits_per_sec(50),
            ..rejected
        };
        assert_eq!(
            rejected.nearest_supported(),
            DataRate::from_kilobits_per_sec(100)
        );
    }

    #[test]
    fn messages_carry_units() {
        let error = ConfigurationError::InvertedRange {
            min: DataRate::from_kilobits_per_sec(5_000),
            max: DataRate::from_kilobits_per_sec(1_000),
        };
        assert_eq!(
            error.to_string(),
            "minimum video bitrate 5000 kbps exceeds maximum 1000 kbps"
        );

        let error: RegulatorError = TelemetryUnavailable::NoSnapshot.into();
        assert_eq!(
            error.to_string(),
            "telemetry unavailable: stats source has no snapshot"
        );
    }
}
