/// The collaborator interfaces the regulator drives:
/// [StatsSource](regulator_control::StatsSource) and
/// [EncoderHandle](regulator_control::EncoderHandle).
pub mod regulator_control;

/// Network statistics types.
pub mod transport;

/// Unit types, such as [DataSize](units::DataSize) and [DataRate](units::DataRate).
pub mod units;
