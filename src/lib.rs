mod algorithm_state;
mod algorithm_strategy;
mod bitrate_algorithm_interface;
mod min_rtt_filter;
mod reactive_rate_control;
mod regulator_controller;
mod regulator_session;
mod rtt_fairness_rate_control;

pub mod config;
pub mod error;
pub mod field_trials;

#[cfg(test)]
mod test_util;

pub use algorithm_state::*;
pub use algorithm_strategy::*;
pub use bitrate_algorithm_interface::{
    BitrateAlgorithmInterface, Decision, DecisionInput, DecisionReason,
};
pub use min_rtt_filter::*;
pub use reactive_rate_control::*;
pub use regulator_controller::*;
pub use regulator_session::{RegulatorEvent, RegulatorSession, EVENT_CHANNEL_CAPACITY};
pub use rtt_fairness_rate_control::*;

pub mod api;
