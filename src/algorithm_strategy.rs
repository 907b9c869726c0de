use crate::{
    config::{AlgorithmSelection, BitrateRegulatorConfig},
    error::AlgorithmFault,
    rtt_fairness_rate_control::{RttFairnessPreset, RttFairnessRateControl},
    AlgorithmState, BitrateAlgorithmInterface, Decision, DecisionInput, ReactiveRateControl,
};

/// The algorithm a session runs, fixed for the session's lifetime.
#[derive(Debug, Clone)]
pub enum AlgorithmStrategy {
    Reactive(ReactiveRateControl),
    RttFairness(RttFairnessRateControl),
}

impl AlgorithmStrategy {
    /// Builds the configured algorithm with its tuning, or None when regulation is
    /// disabled.
    pub fn from_config(config: &BitrateRegulatorConfig) -> Option<Self> {
        let tuning = &config.tuning;
        match config.algorithm {
            AlgorithmSelection::Disabled => None,
            AlgorithmSelection::Reactive => Some(Self::Reactive(ReactiveRateControl::new(
                tuning.reactive.clone(),
            ))),
            AlgorithmSelection::RttFairnessFast => Some(Self::RttFairness(
                RttFairnessRateControl::new(
                    RttFairnessPreset::Fast,
                    tuning.rtt_fairness_fast.clone(),
                ),
            )),
            AlgorithmSelection::RttFairnessSlow => Some(Self::RttFairness(
                RttFairnessRateControl::new(
                    RttFairnessPreset::Slow,
                    tuning.rtt_fairness_slow.clone(),
                ),
            )),
        }
    }
}

impl BitrateAlgorithmInterface for AlgorithmStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Reactive(control) => control.name(),
            Self::RttFairness(control) => control.name(),
        }
    }

    fn decide(
        &self,
        input: &DecisionInput,
        state: &mut AlgorithmState,
    ) -> Result<Decision, AlgorithmFault> {
        match self {
            Self::Reactive(control) => control.decide(input, state),
            Self::RttFairness(control) => control.decide(input, state),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::field_trials::RegulatorTuning;

    fn config(algorithm: AlgorithmSelection) -> BitrateRegulatorConfig {
        BitrateRegulatorConfig {
            algorithm,
            ..Default::default()
        }
    }

    #[test]
    fn disabled_has_no_strategy() {
        assert!(AlgorithmStrategy::from_config(&config(AlgorithmSelection::Disabled)).is_none());
    }

    #[test]
    fn names_match_selection() {
        for selection in [
            AlgorithmSelection::Reactive,
            AlgorithmSelection::RttFairnessFast,
            AlgorithmSelection::RttFairnessSlow,
        ] {
            let strategy = AlgorithmStrategy::from_config(&config(selection)).expect("strategy");
            assert_eq!(strategy.name(), selection.as_str());
        }
    }

    #[test]
    fn uses_configured_tuning() {
        let config = BitrateRegulatorConfig {
            algorithm: AlgorithmSelection::RttFairnessSlow,
            tuning: RegulatorTuning::parse("RttSlow/Spike:300/"),
            ..Default::default()
        };
        let Some(AlgorithmStrategy::RttFairness(control)) = AlgorithmStrategy::from_config(&config)
        else {
            panic!("expected rtt fairness");
        };
        assert_eq!(control.preset(), RttFairnessPreset::Slow);
        assert_eq!(
            control.settings().allowed_spike,
            crate::api::units::TimeDelta::from_millis(300)
        );
    }
}
