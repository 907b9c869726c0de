use std::collections::VecDeque;

use crate::api::units::{TimeDelta, Timestamp};

/// Rolling minimum of round trip time samples over a time window. The minimum
/// approximates the latency of the path without queuing.
#[derive(Debug, Clone, Default)]
pub struct MinRttFilter {
    history: VecDeque<(Timestamp, TimeDelta)>,
}

impl MinRttFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, at_time: Timestamp, rtt: TimeDelta, window: TimeDelta) {
        // Remove samples that fell out of the window.
        while let Some(&(sampled_at, _)) = self.history.front() {
            if at_time - sampled_at <= window {
                break;
            }
            self.history.pop_front();
        }

        // Typical minimum sliding-window algorithm: Pop values higher than the
        // current sample before pushing it.
        while let Some(&(_, back)) = self.history.back() {
            if rtt > back {
                break;
            }
            self.history.pop_back();
        }

        self.history.push_back((at_time, rtt));
    }

    /// The minimum over the window, or None before the first sample.
    pub fn baseline(&self) -> Option<TimeDelta> {
        self.history.front().map(|&(_, rtt)| rtt)
    }
}
