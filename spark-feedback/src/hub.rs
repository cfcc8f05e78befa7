use crate::channel::{Admission, OutputChannel};
use crate::haptic::{HapticPattern, Vibrator};
use crate::speech::Speaker;
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Copy, Clone)]
pub struct HubSettings {
    pub audio_enabled: bool,
    pub haptic_enabled: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            haptic_enabled: false,
        }
    }
}

/// The output lanes: one audio lane and one haptic lane for hazards, and the
/// same pair for edge cues. Each lane has its own worker, so a busy speech
/// engine never holds back a vibration, and a hazard buzz never swallows an
/// edge cue raised in the same frame. Both haptic lanes drive one motor.
pub struct FeedbackHub {
    primary_audio: OutputChannel<String>,
    secondary_audio: OutputChannel<String>,
    haptic: OutputChannel<Vec<HapticPattern>>,
    edge_haptic: OutputChannel<Vec<HapticPattern>>,
    settings: HubSettings,
}

fn speech_channel(name: &'static str, speaker: Arc<dyn Speaker>) -> OutputChannel<String> {
    OutputChannel::spawn(name, move |message: String| {
        if let Err(e) = speaker.speak(&message) {
            warn!("{} speech failed ({}), falling back to log", name, e);
            info!("[AUDIO] {}", message);
        }
    })
}

fn haptic_channel(
    name: &'static str,
    vibrator: Arc<dyn Vibrator>,
) -> OutputChannel<Vec<HapticPattern>> {
    OutputChannel::spawn(name, move |patterns: Vec<HapticPattern>| {
        for pattern in patterns {
            if let Err(e) = vibrator.vibrate(pattern) {
                warn!("{} {} failed: {}", name, pattern, e);
                info!("[HAPTIC] {}", pattern);
            }
        }
    })
}

impl FeedbackHub {
    /// Must be called from within a tokio runtime.
    pub fn new(
        primary: Arc<dyn Speaker>,
        secondary: Arc<dyn Speaker>,
        vibrator: Arc<dyn Vibrator>,
        settings: HubSettings,
    ) -> Self {
        Self {
            primary_audio: speech_channel("primary_audio", primary),
            secondary_audio: speech_channel("secondary_audio", secondary),
            haptic: haptic_channel("haptic", vibrator.clone()),
            edge_haptic: haptic_channel("edge_haptic", vibrator),
            settings,
        }
    }

    pub fn speak_primary(&self, message: String) -> Admission {
        if !self.settings.audio_enabled {
            return Admission::Muted;
        }
        self.primary_audio.submit(message)
    }

    pub fn speak_secondary(&self, message: String) -> Admission {
        if !self.settings.audio_enabled {
            return Admission::Muted;
        }
        self.secondary_audio.submit(message)
    }

    pub fn vibrate(&self, patterns: Vec<HapticPattern>) -> Admission {
        self.submit_haptic(&self.haptic, patterns)
    }

    pub fn vibrate_edge(&self, patterns: Vec<HapticPattern>) -> Admission {
        self.submit_haptic(&self.edge_haptic, patterns)
    }

    fn submit_haptic(
        &self,
        lane: &OutputChannel<Vec<HapticPattern>>,
        patterns: Vec<HapticPattern>,
    ) -> Admission {
        if !self.settings.haptic_enabled || patterns.is_empty() {
            return Admission::Muted;
        }
        lane.submit(patterns)
    }

    /// Flips audio output and returns the new state.
    pub fn toggle_audio(&mut self) -> bool {
        self.settings.audio_enabled = !self.settings.audio_enabled;
        info!(
            "Audio {}",
            if self.settings.audio_enabled { "ON" } else { "OFF" }
        );
        self.settings.audio_enabled
    }

    pub fn settings(&self) -> HubSettings {
        self.settings
    }

    pub fn is_idle(&self) -> bool {
        !self.primary_audio.is_busy()
            && !self.secondary_audio.is_busy()
            && !self.haptic.is_busy()
            && !self.edge_haptic.is_busy()
    }

    /// Total requests dropped across all lanes.
    pub fn dropped(&self) -> u64 {
        self.primary_audio.dropped()
            + self.secondary_audio.dropped()
            + self.haptic.dropped()
            + self.edge_haptic.dropped()
    }

    pub async fn shutdown(self) -> anyhow::Result<()> {
        let speech = futures::future::join_all([
            self.primary_audio.shutdown(),
            self.secondary_audio.shutdown(),
        ]);
        let haptics = futures::future::join_all([
            self.haptic.shutdown(),
            self.edge_haptic.shutdown(),
        ]);
        let (speech, haptics) = futures::future::join(speech, haptics).await;
        speech
            .into_iter()
            .chain(haptics)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(())
    }
}
