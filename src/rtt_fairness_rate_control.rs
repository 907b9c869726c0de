use crate::{
    api::units::{DataRate, TimeDelta},
    bitrate_algorithm_interface::checked_rate,
    error::AlgorithmFault,
    field_trials::RttFairnessSettings,
    AlgorithmState, BitrateAlgorithmInterface, Decision, DecisionInput, DecisionReason,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RttFairnessPreset {
    Fast,
    Slow,
}

// Backs off multiplicatively when the round trip time rises above its rolling
// minimum by more than the allowed spike, which catches queue build-up before
// the transport starts losing packets. While latency is stable and fewer packets
// than the target are in flight, the bitrate grows in proportion to the unused
// in-flight headroom.
#[derive(Debug, Clone)]
pub struct RttFairnessRateControl {
    preset: RttFairnessPreset,
    settings: RttFairnessSettings,
}

impl RttFairnessRateControl {
    pub fn new(preset: RttFairnessPreset, mut settings: RttFairnessSettings) -> Self {
        let defaults = match preset {
            RttFairnessPreset::Fast => RttFairnessSettings::fast(),
            RttFairnessPreset::Slow => RttFairnessSettings::slow(),
        };
        settings.validate(&defaults);
        tracing::info!(
            ?preset,
            allowed_spike = ?settings.allowed_spike,
            decrease_factor = settings.decrease_factor,
            target_packets_in_flight = settings.target_packets_in_flight,
            "Using rtt fairness rate control"
        );
        Self { preset, settings }
    }

    pub fn fast() -> Self {
        Self::new(RttFairnessPreset::Fast, RttFairnessSettings::fast())
    }

    pub fn slow() -> Self {
        Self::new(RttFairnessPreset::Slow, RttFairnessSettings::slow())
    }

    pub fn preset(&self) -> RttFairnessPreset {
        self.preset
    }

    pub fn settings(&self) -> &RttFairnessSettings {
        &self.settings
    }

    fn increase(
        &self,
        current: DataRate,
        packets_in_flight: u64,
    ) -> Result<DataRate, AlgorithmFault> {
        let target = self.settings.target_packets_in_flight;
        let headroom = (target - packets_in_flight) as f64 / target as f64;
        let step = checked_rate(self.name(), self.settings.increase_step.bps_float() * headroom)?;
        let mut proposed = current + step;
        if packets_in_flight > 0 {
            // Do not overshoot the rate at which the target would be reached.
            let implied = checked_rate(
                self.name(),
                current.bps_float() * target as f64 / packets_in_flight as f64,
            )?;
            proposed = proposed.min(implied);
        }
        Ok(proposed)
    }
}

impl BitrateAlgorithmInterface for RttFairnessRateControl {
    fn name(&self) -> &'static str {
        match self.preset {
            RttFairnessPreset::Fast => "rtt-fairness-fast",
            RttFairnessPreset::Slow => "rtt-fairness-slow",
        }
    }

    fn decide(
        &self,
        input: &DecisionInput,
        state: &mut AlgorithmState,
    ) -> Result<Decision, AlgorithmFault> {
        let snapshot = input.snapshot;
        let current = input.current;
        let rtt = snapshot.round_trip_time;
        if rtt.is_infinite() || rtt < TimeDelta::zero() {
            return Err(AlgorithmFault::InvalidRoundTripTime {
                algorithm: self.name(),
                rtt,
            });
        }

        state
            .rtt_baseline
            .update(snapshot.timestamp, rtt, self.settings.baseline_window);
        let baseline = state.rtt_baseline.baseline().unwrap_or(rtt);
        let rtt_diff = rtt - baseline;

        let decision = if rtt_diff > self.settings.allowed_spike {
            let proposed = checked_rate(
                self.name(),
                current.bps_float() * self.settings.decrease_factor,
            )?;
            state.on_backoff(snapshot.timestamp);
            tracing::debug!(?rtt, ?baseline, %current, %proposed, "RTT spike");
            Decision::new(proposed, DecisionReason::RttBackoff)
        } else if snapshot.packets_in_flight < self.settings.target_packets_in_flight
            && rtt_diff <= self.settings.stable_rtt_margin
        {
            state.on_healthy_tick();
            let proposed = self.increase(current, snapshot.packets_in_flight)?;
            Decision::new(proposed, DecisionReason::InFlightIncrease)
        } else {
            state.on_healthy_tick();
            Decision::hold(current)
        };

        // The floor stops decreases; it never lifts a bitrate already below it.
        let floor = self.settings.minimum_bitrate.min(current);
        Ok(Decision {
            proposed: decision.proposed.max(floor),
            ..decision
        })
    }
}
