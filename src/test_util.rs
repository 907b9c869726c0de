use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use crate::{
    api::{
        regulator_control::{EncoderHandle, StatsSource},
        transport::NetworkStatsSnapshot,
        units::{DataRate, TimeDelta, Timestamp},
    },
    config::BitrateRange,
    error::ApplyRejected,
};

// Hands out queued snapshots one per call, then keeps repeating the last one.
#[derive(Default)]
pub struct ScriptedStats {
    queued: Mutex<VecDeque<NetworkStatsSnapshot>>,
    last: Mutex<Option<NetworkStatsSnapshot>>,
}

impl ScriptedStats {
    pub fn new(snapshots: impl IntoIterator<Item = NetworkStatsSnapshot>) -> Self {
        Self {
            queued: Mutex::new(snapshots.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    // Snapshots every `interval` starting at one interval, all built from `template`.
    pub fn steady(template: NetworkStatsSnapshot, interval: TimeDelta, count: i64) -> Self {
        Self::new((1..=count).map(|index| NetworkStatsSnapshot {
            timestamp: Timestamp::zero() + interval * index,
            ..template
        }))
    }
}

impl StatsSource for ScriptedStats {
    fn latest_snapshot(&self) -> Option<NetworkStatsSnapshot> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = self
            .queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            *last = Some(next);
        }
        *last
    }
}

// Records every accepted write. With `supported` set, values outside it are
// rejected the way a codec with a narrower range would.
pub struct RecordingEncoder {
    bitrate: Mutex<DataRate>,
    video_writes: Mutex<Vec<DataRate>>,
    audio_writes: Mutex<Vec<DataRate>>,
    supported: Option<BitrateRange>,
}

impl RecordingEncoder {
    pub fn new(bitrate: DataRate) -> Self {
        Self {
            bitrate: Mutex::new(bitrate),
            video_writes: Mutex::new(Vec::new()),
            audio_writes: Mutex::new(Vec::new()),
            supported: None,
        }
    }

    pub fn with_supported_range(bitrate: DataRate, supported: BitrateRange) -> Self {
        Self {
            supported: Some(supported),
            ..Self::new(bitrate)
        }
    }

    // Simulates another component changing the bitrate.
    pub fn set_externally(&self, bitrate: DataRate) {
        *self.bitrate.lock().unwrap() = bitrate;
    }

    pub fn video_writes(&self) -> Vec<DataRate> {
        self.video_writes.lock().unwrap().clone()
    }

    pub fn audio_writes(&self) -> Vec<DataRate> {
        self.audio_writes.lock().unwrap().clone()
    }
}

impl EncoderHandle for RecordingEncoder {
    fn video_bitrate(&self) -> DataRate {
        *self.bitrate.lock().unwrap()
    }

    fn set_video_bitrate(&self, bitrate: DataRate) -> Result<(), ApplyRejected> {
        if let Some(supported) = self.supported {
            if !supported.contains(bitrate) {
                return Err(ApplyRejected {
                    requested: bitrate,
                    supported_min: supported.min,
                    supported_max: supported.max,
                });
            }
        }
        *self.bitrate.lock().unwrap() = bitrate;
        self.video_writes.lock().unwrap().push(bitrate);
        Ok(())
    }

    fn set_audio_bitrate(&self, bitrate: DataRate) -> Result<(), ApplyRejected> {
        self.audio_writes.lock().unwrap().push(bitrate);
        Ok(())
    }
}
