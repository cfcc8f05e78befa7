#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use log::info;
use spark_feedback::{FeedbackHub, HubSettings, LogSpeaker, LogVibrator};
use spark_starlight::config::StarlightConfig;
use spark_starlight::pipeline::FramePipeline;
use spark_starlight::replay::load_replay;
use spark_starlight::log_init;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CONFIG: &str = "./data/starlight.toml";
const DEFAULT_REPLAY: &str = "./data/frames.jsonl";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let replay_path = args.next().unwrap_or_else(|| DEFAULT_REPLAY.to_string());

    let config = StarlightConfig::load_or_default(&config_path)?;
    log_init(&config.log_level);
    info!(
        "Profile {:?}: {}x{} @ {} fps, cooldown {:.1}s",
        config.profile,
        config.frame.width,
        config.frame.height,
        config.frame.fps_target,
        config.alert.cooldown_secs
    );

    let hub = FeedbackHub::new(
        Arc::new(LogSpeaker),
        Arc::new(LogSpeaker),
        Arc::new(LogVibrator),
        HubSettings {
            audio_enabled: config.alert.audio_enabled,
            haptic_enabled: config.alert.haptic_enabled,
        },
    );
    let mut pipeline = FramePipeline::new(&config)?.with_feedback(hub);

    let frames = load_replay(&replay_path)?;
    info!("Replaying {} frames from {}", frames.len(), replay_path);

    let start = tokio::time::Instant::now();
    let (mut analyzed, mut alerts) = (0usize, 0usize);
    for frame in frames.iter() {
        let at = start + Duration::try_from_secs_f64(frame.t).unwrap_or_default();
        tokio::time::sleep_until(at).await;

        if let Some(report) = pipeline.process_frame(
            &frame.primary,
            &frame.secondary,
            frame.edge_input(),
            at.into_std(),
        ) {
            analyzed += 1;
            alerts += report.alerts.len();
        }
    }

    info!(
        "Replay finished: {} of {} frames analyzed, {} alerts, {} dropped by busy output",
        analyzed,
        frames.len(),
        alerts,
        pipeline.feedback_dropped()
    );
    pipeline.shutdown().await
}
