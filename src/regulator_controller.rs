use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;

use crate::{
    api::regulator_control::{EncoderHandle, StatsSource},
    config::BitrateRegulatorConfig,
    error::ConfigurationError,
    regulator_session::{apply_video_bitrate, lock, EventSink, SessionLiveness, TickLoop},
    AlgorithmStrategy, RegulatorSession,
};

/// Starts and stops bitrate regulation for the stream owned by a streaming
/// session. At most one regulated session is active per controller.
#[derive(Debug)]
pub struct RegulatorController {
    runtime: Handle,
    active: Mutex<Option<Arc<SessionLiveness>>>,
}

impl RegulatorController {
    /// Tick loops are spawned on `runtime`, away from the media path.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            active: Mutex::new(None),
        }
    }

    /// Validates `config`, applies the initial bitrates and starts ticking.
    ///
    /// On error nothing is written to the encoder. A session already running
    /// under this controller is stopped first. Concurrent calls are serialized,
    /// so the last one to run owns the only active session. The encoder must not
    /// call back into the controller from its setters.
    pub fn start(
        &self,
        mut config: BitrateRegulatorConfig,
        stats: Arc<dyn StatsSource>,
        encoder: Arc<dyn EncoderHandle>,
    ) -> Result<RegulatorSession, ConfigurationError> {
        config.validate()?;
        let period = config
            .tick_interval
            .to_duration()
            .ok_or(ConfigurationError::NonPositiveTickInterval(config.tick_interval))?;
        config.tuning.validate();

        let mut active = lock(&self.active);
        stop_session(active.take());

        let range = config.video_bitrate_range;
        let (events, receiver) = EventSink::channel();
        apply_video_bitrate(encoder.as_ref(), range, config.initial_bitrate, &events);
        if let Some(audio_bitrate) = config.audio_bitrate {
            if let Err(rejected) = encoder.set_audio_bitrate(audio_bitrate) {
                tracing::warn!(%rejected, "Encoder rejected audio bitrate");
                events.error(rejected);
            }
        }

        let liveness = Arc::new(SessionLiveness::default());
        match AlgorithmStrategy::from_config(&config) {
            Some(strategy) => {
                let tick_loop =
                    TickLoop::new(range, strategy, stats, encoder, liveness.clone(), events);
                liveness.set_task(self.runtime.spawn(tick_loop.run(period)));
            }
            None => tracing::debug!("Bitrate regulation disabled, keeping initial bitrate"),
        }
        *active = Some(liveness.clone());
        drop(active);

        tracing::info!(
            algorithm = %config.algorithm,
            min = %range.min,
            max = %range.max,
            initial = %config.initial_bitrate,
            tick_interval = %config.tick_interval,
            "Bitrate regulation started"
        );
        Ok(RegulatorSession::new(liveness, config.algorithm, receiver))
    }

    /// Stops the active session, if any. Idempotent.
    pub fn stop(&self) {
        let active = lock(&self.active).take();
        stop_session(active);
    }

    pub fn on_session_start(
        &self,
        config: BitrateRegulatorConfig,
        stats: Arc<dyn StatsSource>,
        encoder: Arc<dyn EncoderHandle>,
    ) -> Result<RegulatorSession, ConfigurationError> {
        self.start(config, stats, encoder)
    }

    pub fn on_session_stop(&self) {
        self.stop();
    }
}

fn stop_session(active: Option<Arc<SessionLiveness>>) {
    if let Some(liveness) = active {
        if liveness.stop() {
            tracing::info!("Bitrate regulation stopped");
        }
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Duration};

    use tokio::time::sleep;

    use super::*;
    use crate::{
        api::{
            transport::NetworkStatsSnapshot,
            units::{DataRate, TimeDelta, Timestamp},
        },
        config::{AlgorithmSelection, BitrateRange},
        test_util::{RecordingEncoder, ScriptedStats},
        DecisionReason, RegulatorEvent,
    };

    fn kbps(value: i64) -> DataRate {
        DataRate::from_kilobits_per_sec(value)
    }

    fn config(algorithm: AlgorithmSelection) -> BitrateRegulatorConfig {
        BitrateRegulatorConfig::new(
            BitrateRange::new(kbps(500), kbps(5_000)),
            kbps(3_000),
            algorithm,
        )
    }

    fn lossy_stats(count: i64) -> Arc<ScriptedStats> {
        let template = NetworkStatsSnapshot {
            packets_lost_since_last_snapshot: 2,
            packets_sent_since_last_snapshot: 100,
            round_trip_time: TimeDelta::from_millis(40),
            ..Default::default()
        };
        Arc::new(ScriptedStats::steady(
            template,
            TimeDelta::from_millis(200),
            count,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_leaves_encoder_untouched() {
        let controller = RegulatorController::new(Handle::current());
        let encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let mut bad = config(AlgorithmSelection::Reactive);
        bad.video_bitrate_range = BitrateRange::new(kbps(5_000), kbps(500));
        bad.audio_bitrate = Some(kbps(64));

        let result = controller.start(bad, lossy_stats(10), encoder.clone());
        assert!(matches!(
            result,
            Err(ConfigurationError::InvertedRange { .. })
        ));
        sleep(Duration::from_secs(2)).await;
        assert!(encoder.video_writes().is_empty());
        assert!(encoder.audio_writes().is_empty());
        assert_eq!(encoder.video_bitrate(), kbps(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn start_applies_initial_and_audio_bitrates() {
        let controller = RegulatorController::new(Handle::current());
        let encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let mut config = config(AlgorithmSelection::Disabled);
        config.audio_bitrate = Some(kbps(128));

        let session = controller
            .start(config, lossy_stats(10), encoder.clone())
            .expect("valid config");
        assert_eq!(encoder.video_writes(), vec![kbps(3_000)]);
        assert_eq!(encoder.audio_writes(), vec![kbps(128)]);
        assert_eq!(session.selection(), AlgorithmSelection::Disabled);

        // Disabled regulation never ticks.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(encoder.video_writes(), vec![kbps(3_000)]);
        assert!(session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_interval() {
        let controller = RegulatorController::new(Handle::current());
        let encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let mut session = controller
            .start(config(AlgorithmSelection::Reactive), lossy_stats(100), encoder.clone())
            .expect("valid config");
        let mut events = session.take_events().expect("events");

        // No tick before the first interval has passed.
        sleep(Duration::from_millis(100)).await;
        assert_eq!(encoder.video_writes(), vec![kbps(3_000)]);

        // Ticks at 200, 400 and 600 ms.
        sleep(Duration::from_millis(600)).await;
        assert_eq!(
            encoder.video_writes(),
            vec![kbps(3_000), kbps(2_400), kbps(1_920), kbps(1_536)]
        );
        assert_eq!(
            events.recv().await,
            Some(RegulatorEvent::BitrateChanged {
                at: Timestamp::from_millis(200),
                from: kbps(3_000),
                to: kbps(2_400),
                reason: DecisionReason::LossBackoff,
            })
        );
        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_final() {
        let controller = RegulatorController::new(Handle::current());
        let encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let session = controller
            .start(
                config(AlgorithmSelection::RttFairnessFast),
                lossy_stats(1_000),
                encoder.clone(),
            )
            .expect("valid config");

        sleep(Duration::from_millis(1_100)).await;
        session.stop();
        assert!(!session.is_active());
        let writes = encoder.video_writes();

        session.stop();
        controller.stop();
        sleep(Duration::from_secs(10)).await;
        assert_eq!(encoder.video_writes(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_session_stops_writes() {
        let controller = RegulatorController::new(Handle::current());
        let encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let session = controller
            .start(config(AlgorithmSelection::Reactive), lossy_stats(1_000), encoder.clone())
            .expect("valid config");
        sleep(Duration::from_millis(500)).await;
        drop(session);
        let writes = encoder.video_writes();
        assert_eq!(writes.len(), 3);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(encoder.video_writes(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn controller_stop_ends_active_session() {
        let controller = RegulatorController::new(Handle::current());
        let encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let session = controller
            .on_session_start(
                config(AlgorithmSelection::Reactive),
                lossy_stats(1_000),
                encoder.clone(),
            )
            .expect("valid config");
        controller.on_session_stop();
        assert!(!session.is_active());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(encoder.video_writes(), vec![kbps(3_000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_replaces_previous_session() {
        let controller = RegulatorController::new(Handle::current());
        let first_encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let first = controller
            .start(config(AlgorithmSelection::Reactive), lossy_stats(1_000), first_encoder.clone())
            .expect("valid config");

        let second_encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let second = controller
            .start(
                config(AlgorithmSelection::RttFairnessSlow),
                lossy_stats(1_000),
                second_encoder.clone(),
            )
            .expect("valid config");
        assert!(!first.is_active());
        assert!(second.is_active());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(first_encoder.video_writes(), vec![kbps(3_000)]);
        assert!(second_encoder.video_writes().len() > 1);
    }

    #[test]
    fn concurrent_starts_leave_one_active_session() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let controller = RegulatorController::new(runtime.handle().clone());
        let encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));

        let sessions: Vec<RegulatorSession> = thread::scope(|scope| {
            let starts: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        controller
                            .start(
                                config(AlgorithmSelection::Reactive),
                                lossy_stats(10),
                                encoder.clone(),
                            )
                            .expect("valid config")
                    })
                })
                .collect();
            starts
                .into_iter()
                .map(|start| start.join().expect("start thread"))
                .collect()
        });

        assert_eq!(sessions.iter().filter(|session| session.is_active()).count(), 1);
        controller.stop();
        assert!(sessions.iter().all(|session| !session.is_active()));
    }

    struct PanickingStats;

    impl StatsSource for PanickingStats {
        fn latest_snapshot(&self) -> Option<NetworkStatsSnapshot> {
            panic!("transport stats unavailable");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_stats_source_ends_session() {
        let controller = RegulatorController::new(Handle::current());
        let encoder = Arc::new(RecordingEncoder::new(kbps(1_000)));
        let session = controller
            .start(
                config(AlgorithmSelection::Reactive),
                Arc::new(PanickingStats),
                encoder.clone(),
            )
            .expect("valid config");
        assert!(session.is_active());

        sleep(Duration::from_millis(500)).await;
        assert!(!session.is_active());
        assert_eq!(encoder.video_writes(), vec![kbps(3_000)]);
    }
}
