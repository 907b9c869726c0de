use std::fmt;
use std::str::FromStr;

use crate::{
    api::units::{DataRate, TimeDelta},
    error::ConfigurationError,
    field_trials::RegulatorTuning,
};

/// Which decision algorithm drives the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlgorithmSelection {
    /// The initial bitrate is applied once and never regulated.
    #[default]
    Disabled,
    /// Loss and send-buffer driven AIMD.
    Reactive,
    /// Queuing-delay driven regulation, tuned to react quickly.
    RttFairnessFast,
    /// Queuing-delay driven regulation, tolerant of transient spikes.
    RttFairnessSlow,
}

impl AlgorithmSelection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Reactive => "reactive",
            Self::RttFairnessFast => "rtt-fairness-fast",
            Self::RttFairnessSlow => "rtt-fairness-slow",
        }
    }
}

impl fmt::Display for AlgorithmSelection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmSelection {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "reactive" => Ok(Self::Reactive),
            "rtt-fairness-fast" => Ok(Self::RttFairnessFast),
            "rtt-fairness-slow" => Ok(Self::RttFairnessSlow),
            other => Err(ConfigurationError::UnknownAlgorithm(other.to_owned())),
        }
    }
}

/// Inclusive video bitrate bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitrateRange {
    pub min: DataRate,
    pub max: DataRate,
}

impl BitrateRange {
    pub const fn new(min: DataRate, max: DataRate) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, bitrate: DataRate) -> bool {
        self.min <= bitrate && bitrate <= self.max
    }

    pub fn clamp(&self, bitrate: DataRate) -> DataRate {
        bitrate.clamped(self.min, self.max)
    }

    pub fn width(&self) -> DataRate {
        self.max - self.min
    }

    /// Builds a range from raw kbps settings. Values that are not positive, or
    /// too large to represent, are rejected rather than reaching `DataRate`.
    pub fn from_kbps(min_kbps: i64, max_kbps: i64) -> Result<Self, ConfigurationError> {
        match (rate_from_kbps(min_kbps), rate_from_kbps(max_kbps)) {
            (Some(min), Some(max)) => Ok(Self::new(min, max)),
            _ => Err(ConfigurationError::NonPositiveBound {
                min_bps: min_kbps.saturating_mul(1000),
                max_bps: max_kbps.saturating_mul(1000),
            }),
        }
    }
}

fn rate_from_kbps(kbps: i64) -> Option<DataRate> {
    kbps.checked_mul(1000)
        .filter(|&bps| bps > 0 && bps != i64::MAX)
        .map(DataRate::from_bits_per_sec)
}

/// Per-session regulator configuration. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct BitrateRegulatorConfig {
    pub video_bitrate_range: BitrateRange,
    pub initial_bitrate: DataRate,
    /// Applied once at session start when set. The regulator never changes it.
    pub audio_bitrate: Option<DataRate>,
    pub algorithm: AlgorithmSelection,
    pub tick_interval: TimeDelta,
    pub tuning: RegulatorTuning,
}

impl Default for BitrateRegulatorConfig {
    fn default() -> Self {
        Self {
            video_bitrate_range: BitrateRange::new(
                DataRate::from_kilobits_per_sec(250),
                DataRate::from_kilobits_per_sec(6_000),
            ),
            initial_bitrate: DataRate::from_kilobits_per_sec(3_000),
            audio_bitrate: None,
            algorithm: AlgorithmSelection::default(),
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            tuning: RegulatorTuning::default(),
        }
    }
}

impl BitrateRegulatorConfig {
    pub const DEFAULT_TICK_INTERVAL: TimeDelta = TimeDelta::from_millis(200);

    pub fn new(
        range: BitrateRange,
        initial_bitrate: DataRate,
        algorithm: AlgorithmSelection,
    ) -> Self {
        Self {
            video_bitrate_range: range,
            initial_bitrate,
            algorithm,
            ..Default::default()
        }
    }

    /// Builds and validates a config from raw kbps settings.
    pub fn from_kbps(
        min_kbps: i64,
        max_kbps: i64,
        initial_kbps: i64,
        algorithm: AlgorithmSelection,
    ) -> Result<Self, ConfigurationError> {
        let range = BitrateRange::from_kbps(min_kbps, max_kbps)?;
        let initial_bitrate =
            rate_from_kbps(initial_kbps).ok_or(ConfigurationError::InitialOutOfRange {
                initial_bps: initial_kbps.saturating_mul(1000),
                min: range.min,
                max: range.max,
            })?;
        let config = Self::new(range, initial_bitrate, algorithm);
        config.validate()?;
        Ok(config)
    }

    // Checks bounds, interval and audio bitrate. Tuning is validated separately
    // and never fails, it falls back to presets.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let BitrateRange { min, max } = self.video_bitrate_range;
        if min <= DataRate::zero() || max <= DataRate::zero() || max.is_infinite() {
            return Err(ConfigurationError::NonPositiveBound {
                min_bps: min.bps_or(i64::MAX),
                max_bps: max.bps_or(i64::MAX),
            });
        }
        if min > max {
            return Err(ConfigurationError::InvertedRange { min, max });
        }
        if !self.video_bitrate_range.contains(self.initial_bitrate) {
            return Err(ConfigurationError::InitialOutOfRange {
                initial_bps: self.initial_bitrate.bps_or(i64::MAX),
                min,
                max,
            });
        }
        if self.tick_interval <= TimeDelta::zero() || self.tick_interval.is_infinite() {
            return Err(ConfigurationError::NonPositiveTickInterval(self.tick_interval));
        }
        if let Some(audio_bitrate) = self.audio_bitrate {
            if audio_bitrate <= DataRate::zero() || audio_bitrate.is_infinite() {
                return Err(ConfigurationError::NonPositiveAudioBitrate(audio_bitrate));
            }
        }
        Ok(())
    }
}
