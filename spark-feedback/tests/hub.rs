use anyhow::anyhow;
use spark_feedback::{
    Admission, FeedbackHub, HapticPattern, HubSettings, RecordingSpeaker, RecordingVibrator,
    Speaker,
};
use std::sync::Arc;
use std::time::Duration;

struct BrokenSpeaker;

impl Speaker for BrokenSpeaker {
    fn speak(&self, _message: &str) -> anyhow::Result<()> {
        Err(anyhow!("speech engine unavailable"))
    }
}

async fn settle(hub: &FeedbackHub) {
    while !hub.is_idle() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn lanes_are_independent() -> anyhow::Result<()> {
    let primary = RecordingSpeaker::new();
    let secondary = RecordingSpeaker::new();
    let vibrator = RecordingVibrator::new();
    let hub = FeedbackHub::new(
        Arc::new(primary.clone()),
        Arc::new(secondary.clone()),
        Arc::new(vibrator.clone()),
        HubSettings {
            audio_enabled: true,
            haptic_enabled: true,
        },
    );

    assert_eq!(hub.speak_primary("DANGER: pothole directly ahead, 2 meters!".into()), Admission::Accepted);
    assert_eq!(hub.speak_secondary("Caution: Approaching sidewalk edge on left.".into()), Admission::Accepted);
    assert_eq!(
        hub.vibrate(vec![HapticPattern::ImmediateDanger, HapticPattern::CenterDirection]),
        Admission::Accepted
    );
    settle(&hub).await;
    hub.shutdown().await?;

    assert_eq!(primary.spoken(), vec!["DANGER: pothole directly ahead, 2 meters!"]);
    assert_eq!(secondary.spoken(), vec!["Caution: Approaching sidewalk edge on left."]);
    assert_eq!(
        vibrator.played(),
        vec![HapticPattern::ImmediateDanger, HapticPattern::CenterDirection]
    );
    Ok(())
}

#[tokio::test]
async fn edge_haptics_do_not_wait_for_hazard_haptics() -> anyhow::Result<()> {
    let vibrator = RecordingVibrator::new();
    let hub = FeedbackHub::new(
        Arc::new(RecordingSpeaker::new()),
        Arc::new(RecordingSpeaker::new()),
        Arc::new(vibrator.clone()),
        HubSettings {
            audio_enabled: false,
            haptic_enabled: true,
        },
    );

    assert_eq!(hub.vibrate(vec![HapticPattern::FarWarning]), Admission::Accepted);
    assert_eq!(hub.vibrate_edge(vec![HapticPattern::LeftDirection]), Admission::Accepted);
    settle(&hub).await;
    hub.shutdown().await?;

    let played = vibrator.played();
    assert_eq!(played.len(), 2);
    assert!(played.contains(&HapticPattern::FarWarning));
    assert!(played.contains(&HapticPattern::LeftDirection));
    Ok(())
}

#[tokio::test]
async fn muted_lanes_accept_nothing() -> anyhow::Result<()> {
    let primary = RecordingSpeaker::new();
    let mut hub = FeedbackHub::new(
        Arc::new(primary.clone()),
        Arc::new(RecordingSpeaker::new()),
        Arc::new(RecordingVibrator::new()),
        HubSettings {
            audio_enabled: true,
            haptic_enabled: false,
        },
    );

    assert_eq!(hub.vibrate(vec![HapticPattern::NearHazard]), Admission::Muted);
    assert_eq!(hub.vibrate_edge(vec![HapticPattern::LeftDirection]), Admission::Muted);
    assert!(!hub.toggle_audio());
    assert_eq!(hub.speak_primary("Notice: curb on the left.".into()), Admission::Muted);
    assert!(hub.toggle_audio());
    assert_eq!(hub.speak_primary("Notice: curb on the left.".into()), Admission::Accepted);

    settle(&hub).await;
    hub.shutdown().await?;
    assert_eq!(primary.spoken().len(), 1);
    Ok(())
}

#[tokio::test]
async fn speech_failure_does_not_escape_the_worker() -> anyhow::Result<()> {
    let hub = FeedbackHub::new(
        Arc::new(BrokenSpeaker),
        Arc::new(BrokenSpeaker),
        Arc::new(RecordingVibrator::new()),
        HubSettings::default(),
    );

    assert!(hub.speak_primary("Path clear ahead.".into()).accepted());
    settle(&hub).await;
    assert!(hub.speak_primary("Path clear ahead.".into()).accepted());
    settle(&hub).await;
    hub.shutdown().await?;
    Ok(())
}
