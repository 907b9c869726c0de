use crate::api::units::{DataRate, DataSize, TimeDelta};

/// Tuning for the loss and buffer driven AIMD regulator. Overridden through the
/// `Reactive/` trial group.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactiveSettings {
    /// `LossFraction`: share of the bitrate cut when packets are lost.
    pub loss_decrease_fraction: f64,
    /// `BufferFraction`: share of the bitrate cut when the send buffer is full.
    pub buffer_decrease_fraction: f64,
    /// `MinDecrease`
    pub minimum_decrease: DataRate,
    /// `Watermark`: send buffer level counted as full.
    pub high_watermark: DataSize,
    /// `HealthyTicks`
    pub healthy_ticks_before_increase: u32,
    /// `StepFraction`
    pub increase_step_fraction: f64,
    /// `MaxStep`
    pub max_increase_step: DataRate,
    /// `MinBitrate`: decreases stop here.
    pub minimum_bitrate: DataRate,
}

impl Default for ReactiveSettings {
    fn default() -> Self {
        Self {
            loss_decrease_fraction: 0.20,
            buffer_decrease_fraction: 0.10,
            minimum_decrease: DataRate::from_kilobits_per_sec(100),
            high_watermark: DataSize::from_bytes(200_000),
            healthy_ticks_before_increase: 5,
            increase_step_fraction: 0.02,
            max_increase_step: DataRate::from_kilobits_per_sec(250),
            minimum_bitrate: DataRate::from_kilobits_per_sec(250),
        }
    }
}

impl ReactiveSettings {
    pub fn validate(&mut self) {
        let defaults = Self::default();
        if !is_fraction(self.loss_decrease_fraction) {
            tracing::warn!(
                value = self.loss_decrease_fraction,
                "Loss decrease fraction must be in (0, 1). Using default."
            );
            self.loss_decrease_fraction = defaults.loss_decrease_fraction;
        }
        if !is_fraction(self.buffer_decrease_fraction) {
            tracing::warn!(
                value = self.buffer_decrease_fraction,
                "Buffer decrease fraction must be in (0, 1). Using default."
            );
            self.buffer_decrease_fraction = defaults.buffer_decrease_fraction;
        }
        if self.healthy_ticks_before_increase == 0 {
            tracing::warn!("Healthy ticks before increase must be at least 1. Using default.");
            self.healthy_ticks_before_increase = defaults.healthy_ticks_before_increase;
        }
        if !is_fraction(self.increase_step_fraction) {
            tracing::warn!(
                value = self.increase_step_fraction,
                "Increase step fraction must be in (0, 1). Using default."
            );
            self.increase_step_fraction = defaults.increase_step_fraction;
        }
        if self.max_increase_step.is_zero() || self.max_increase_step.is_infinite() {
            tracing::warn!("Max increase step must be positive and finite. Using default.");
            self.max_increase_step = defaults.max_increase_step;
        }
        if self.minimum_decrease.is_infinite() {
            tracing::warn!("Minimum decrease must be finite. Using default.");
            self.minimum_decrease = defaults.minimum_decrease;
        }
        if self.minimum_bitrate.is_infinite() {
            tracing::warn!("Minimum bitrate must be finite. Using default.");
            self.minimum_bitrate = defaults.minimum_bitrate;
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "LossFraction" => assign(&mut self.loss_decrease_fraction, parse_float(key, value)),
            "BufferFraction" => assign(&mut self.buffer_decrease_fraction, parse_float(key, value)),
            "MinDecrease" => assign(&mut self.minimum_decrease, parse_rate(key, value)),
            "Watermark" => assign(&mut self.high_watermark, parse_size(key, value)),
            "HealthyTicks" => assign(
                &mut self.healthy_ticks_before_increase,
                parse_count(key, value).and_then(|ticks| u32::try_from(ticks).ok()),
            ),
            "StepFraction" => assign(&mut self.increase_step_fraction, parse_float(key, value)),
            "MaxStep" => assign(&mut self.max_increase_step, parse_rate(key, value)),
            "MinBitrate" => assign(&mut self.minimum_bitrate, parse_rate(key, value)),
            _ => return false,
        }
        true
    }
}

/// Tuning for the RTT-fairness regulator. [fast](Self::fast) and
/// [slow](Self::slow) are the two shipped presets, overridden through the
/// `RttFast/` and `RttSlow/` trial groups.
#[derive(Debug, Clone, PartialEq)]
pub struct RttFairnessSettings {
    /// `Spike`: RTT rise over the baseline tolerated before backing off.
    pub allowed_spike: TimeDelta,
    /// `Factor`
    pub decrease_factor: f64,
    /// `TargetPif`: packets in flight below which the bitrate may grow.
    pub target_packets_in_flight: u64,
    /// `MinBitrate`
    pub minimum_bitrate: DataRate,
    /// `Step`
    pub increase_step: DataRate,
    /// `StableMargin`
    pub stable_rtt_margin: TimeDelta,
    /// `Window`: how long an RTT sample counts toward the baseline.
    pub baseline_window: TimeDelta,
}

impl RttFairnessSettings {
    pub fn fast() -> Self {
        Self {
            allowed_spike: TimeDelta::from_millis(50),
            decrease_factor: 0.9,
            target_packets_in_flight: 200,
            minimum_bitrate: DataRate::from_kilobits_per_sec(250),
            increase_step: DataRate::from_kilobits_per_sec(100),
            stable_rtt_margin: TimeDelta::from_millis(25),
            baseline_window: TimeDelta::from_seconds(10),
        }
    }

    pub fn slow() -> Self {
        Self {
            allowed_spike: TimeDelta::from_millis(150),
            decrease_factor: 0.95,
            target_packets_in_flight: 500,
            minimum_bitrate: DataRate::from_kilobits_per_sec(150),
            increase_step: DataRate::from_kilobits_per_sec(25),
            stable_rtt_margin: TimeDelta::from_millis(50),
            baseline_window: TimeDelta::from_seconds(30),
        }
    }

    // Out-of-range values fall back to the matching field of `preset`.
    pub fn validate(&mut self, preset: &Self) {
        if !is_positive_finite(self.allowed_spike) {
            tracing::warn!(
                value = ?self.allowed_spike,
                "Allowed RTT spike must be positive. Using preset."
            );
            self.allowed_spike = preset.allowed_spike;
        }
        if !is_fraction(self.decrease_factor) {
            tracing::warn!(
                value = self.decrease_factor,
                "RTT decrease factor must be in (0, 1). Using preset."
            );
            self.decrease_factor = preset.decrease_factor;
        }
        if self.target_packets_in_flight == 0 {
            tracing::warn!("Target packets in flight must be at least 1. Using preset.");
            self.target_packets_in_flight = preset.target_packets_in_flight;
        }
        if self.minimum_bitrate.is_infinite() {
            tracing::warn!("Minimum bitrate must be finite. Using preset.");
            self.minimum_bitrate = preset.minimum_bitrate;
        }
        if self.increase_step.is_zero() || self.increase_step.is_infinite() {
            tracing::warn!("Increase step must be positive and finite. Using preset.");
            self.increase_step = preset.increase_step;
        }
        if self.stable_rtt_margin.is_infinite() || self.stable_rtt_margin < TimeDelta::zero() {
            tracing::warn!(
                value = ?self.stable_rtt_margin,
                "Stable RTT margin must be finite and non-negative. Using preset."
            );
            self.stable_rtt_margin = preset.stable_rtt_margin;
        }
        if !is_positive_finite(self.baseline_window) {
            tracing::warn!(
                value = ?self.baseline_window,
                "Baseline window must be positive. Using preset."
            );
            self.baseline_window = preset.baseline_window;
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "Spike" => assign(&mut self.allowed_spike, parse_millis(key, value)),
            "Factor" => assign(&mut self.decrease_factor, parse_float(key, value)),
            "TargetPif" => assign(&mut self.target_packets_in_flight, parse_count(key, value)),
            "MinBitrate" => assign(&mut self.minimum_bitrate, parse_rate(key, value)),
            "Step" => assign(&mut self.increase_step, parse_rate(key, value)),
            "StableMargin" => assign(&mut self.stable_rtt_margin, parse_millis(key, value)),
            "Window" => assign(&mut self.baseline_window, parse_millis(key, value)),
            _ => return false,
        }
        true
    }
}

/// All tunable constants of the regulator algorithms.
#[derive(Clone, Debug, PartialEq)]
pub struct RegulatorTuning {
    pub reactive: ReactiveSettings,
    pub rtt_fairness_fast: RttFairnessSettings,
    pub rtt_fairness_slow: RttFairnessSettings,
}

impl Default for RegulatorTuning {
    fn default() -> Self {
        Self {
            reactive: ReactiveSettings::default(),
            rtt_fairness_fast: RttFairnessSettings::fast(),
            rtt_fairness_slow: RttFairnessSettings::slow(),
        }
    }
}

impl RegulatorTuning {
    /// Parses a field trial string such as
    /// `"Reactive/LossFraction:0.25,HealthyTicks:3/RttFast/Spike:40/"` on top of
    /// the defaults. Unknown groups, unknown keys and malformed values are logged
    /// and skipped; the result is always validated.
    pub fn parse(trials: &str) -> Self {
        let mut tuning = Self::default();
        let mut segments = trials.split('/').filter(|segment| !segment.is_empty());
        while let Some(group) = segments.next() {
            let Some(params) = segments.next() else {
                tracing::warn!(group, "Field trial group has no parameters, ignored.");
                break;
            };
            for param in params.split(',').filter(|param| !param.is_empty()) {
                let Some((key, value)) = param.split_once(':') else {
                    tracing::warn!(group, param, "Malformed field trial parameter, ignored.");
                    continue;
                };
                let known = match group {
                    "Reactive" => tuning.reactive.apply(key, value),
                    "RttFast" => tuning.rtt_fairness_fast.apply(key, value),
                    "RttSlow" => tuning.rtt_fairness_slow.apply(key, value),
                    _ => {
                        tracing::warn!(group, "Unknown field trial group, ignored.");
                        break;
                    }
                };
                if !known {
                    tracing::warn!(group, key, "Unknown field trial key, ignored.");
                }
            }
        }
        tuning.validate();
        tuning
    }

    pub fn validate(&mut self) {
        self.reactive.validate();
        self.rtt_fairness_fast.validate(&RttFairnessSettings::fast());
        self.rtt_fairness_slow.validate(&RttFairnessSettings::slow());
    }
}

fn is_fraction(value: f64) -> bool {
    value > 0.0 && value < 1.0
}

fn is_positive_finite(delta: TimeDelta) -> bool {
    delta.is_finite() && delta > TimeDelta::zero()
}

fn assign<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn parse_float(key: &str, value: &str) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => {
            tracing::warn!(key, value, "Failed to parse field trial value as a number.");
            None
        }
    }
}

fn parse_count(key: &str, value: &str) -> Option<u64> {
    match value.parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value, "Failed to parse field trial value as a count.");
            None
        }
    }
}

fn parse_rate(key: &str, value: &str) -> Option<DataRate> {
    parse_non_negative(key, value).map(DataRate::from_bits_per_sec)
}

fn parse_size(key: &str, value: &str) -> Option<DataSize> {
    parse_non_negative(key, value).map(DataSize::from_bytes)
}

fn parse_millis(key: &str, value: &str) -> Option<TimeDelta> {
    parse_non_negative(key, value).map(TimeDelta::from_millis)
}

// Bounded so the unit constructors never see a negative or sentinel value.
fn parse_non_negative(key: &str, value: &str) -> Option<i64> {
    const MAX_VALUE: u64 = (i64::MAX / 1_000_000) as u64;
    match value.parse::<u64>() {
        Ok(parsed) if parsed <= MAX_VALUE => Some(parsed as i64),
        _ => {
            tracing::warn!(key, value, "Field trial value must be a non-negative integer.");
            None
        }
    }
}
