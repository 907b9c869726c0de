use crate::{
    api::units::DataRate,
    bitrate_algorithm_interface::checked_rate,
    config::BitrateRange,
    error::AlgorithmFault,
    field_trials::ReactiveSettings,
    AlgorithmState, BitrateAlgorithmInterface, Decision, DecisionInput, DecisionReason,
};

// A rate control implementation that cuts the bitrate as soon as the transport
// reports loss or a filling send buffer, and climbs with small additive
// steps after a run of healthy ticks. Cuts are relative to the current bitrate
// but never smaller than a fixed amount, so backing off stays meaningful at low
// bitrates.
#[derive(Debug, Clone)]
pub struct ReactiveRateControl {
    settings: ReactiveSettings,
}

impl Default for ReactiveRateControl {
    fn default() -> Self {
        Self::new(ReactiveSettings::default())
    }
}

impl ReactiveRateControl {
    const NAME: &'static str = "reactive";

    pub fn new(mut settings: ReactiveSettings) -> Self {
        settings.validate();
        tracing::info!(
            loss_decrease_fraction = settings.loss_decrease_fraction,
            buffer_decrease_fraction = settings.buffer_decrease_fraction,
            healthy_ticks = settings.healthy_ticks_before_increase,
            "Using reactive rate control"
        );
        Self { settings }
    }

    pub fn settings(&self) -> &ReactiveSettings {
        &self.settings
    }

    fn decrease(&self, current: DataRate, fraction: f64) -> Result<DataRate, AlgorithmFault> {
        let relative_cut = checked_rate(Self::NAME, current.bps_float() * fraction)?;
        let cut = relative_cut.max(self.settings.minimum_decrease);
        if cut >= current {
            return Ok(DataRate::zero());
        }
        Ok(current - cut)
    }

    // A fixed small share of the allowed range, at least one bit per second.
    fn increase_step(&self, range: BitrateRange) -> Result<DataRate, AlgorithmFault> {
        let step = checked_rate(
            Self::NAME,
            range.width().bps_float() * self.settings.increase_step_fraction,
        )?;
        Ok(step.clamped(
            DataRate::from_bits_per_sec(1),
            self.settings.max_increase_step,
        ))
    }
}

impl BitrateAlgorithmInterface for ReactiveRateControl {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn decide(
        &self,
        input: &DecisionInput,
        state: &mut AlgorithmState,
    ) -> Result<Decision, AlgorithmFault> {
        let snapshot = input.snapshot;
        let current = input.current;

        let decision = if snapshot.has_loss() {
            let proposed = self.decrease(current, self.settings.loss_decrease_fraction)?;
            state.on_backoff(snapshot.timestamp);
            Decision::new(proposed, DecisionReason::LossBackoff)
        } else if snapshot.send_buffer_occupancy > self.settings.high_watermark {
            let proposed = self.decrease(current, self.settings.buffer_decrease_fraction)?;
            state.on_backoff(snapshot.timestamp);
            Decision::new(proposed, DecisionReason::BufferBackoff)
        } else {
            state.on_healthy_tick();
            if state.healthy_ticks >= self.settings.healthy_ticks_before_increase {
                state.healthy_ticks = 0;
                let step = self.increase_step(input.range)?;
                Decision::new(current + step, DecisionReason::AdditiveIncrease)
            } else {
                Decision::hold(current)
            }
        };

        // The floor stops decreases; it never lifts a bitrate already below it.
        let floor = self.settings.minimum_bitrate.min(current);
        Ok(Decision {
            proposed: decision.proposed.max(floor),
            ..decision
        })
    }
}
