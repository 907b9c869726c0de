use super::{transport::NetworkStatsSnapshot, units::DataRate};
use crate::error::ApplyRejected;

// StatsSource is implemented by the transport layer. The regulator pulls from it
// once per tick, from a background task, so implementations must return a cached
// value without blocking.
pub trait StatsSource: Send + Sync {
    // Returns the most recent snapshot, or None if the transport has not produced
    // one yet. Returning the same snapshot twice is allowed; the regulator skips
    // snapshots it has already consumed.
    fn latest_snapshot(&self) -> Option<NetworkStatsSnapshot>;
}

// EncoderHandle is implemented by the media pipeline. The regulator is not the
// only writer of the bitrate, so it re-reads the current value every tick.
// Setters must be lightweight.
pub trait EncoderHandle: Send + Sync {
    // Current video target bitrate.
    fn video_bitrate(&self) -> DataRate;
    // Sets the video target bitrate, or rejects it with the supported range.
    fn set_video_bitrate(&self, bitrate: DataRate) -> Result<(), ApplyRejected>;
    // Sets the audio bitrate. Pipelines without a configurable audio encoder keep
    // the default.
    fn set_audio_bitrate(&self, _bitrate: DataRate) -> Result<(), ApplyRejected> {
        Ok(())
    }
}
