use log::info;
use parking_lot::Mutex;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// One step of a vibration pattern. An intensity of 0 is a pause.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pulse {
    pub duration_ms: u32,
    pub intensity: f32,
}

const fn pulse(duration_ms: u32, intensity: f32) -> Pulse {
    Pulse {
        duration_ms,
        intensity,
    }
}

const IMMEDIATE_DANGER: [Pulse; 5] = [
    pulse(200, 1.0),
    pulse(100, 0.0),
    pulse(200, 1.0),
    pulse(100, 0.0),
    pulse(200, 1.0),
];
const NEAR_HAZARD: [Pulse; 2] = [pulse(150, 0.7), pulse(150, 0.0)];
const FAR_WARNING: [Pulse; 1] = [pulse(100, 0.4)];
const LEFT_DIRECTION: [Pulse; 3] = [pulse(50, 0.6), pulse(50, 0.0), pulse(50, 0.6)];
const RIGHT_DIRECTION: [Pulse; 1] = [pulse(100, 0.6)];
const CENTER_DIRECTION: [Pulse; 5] = [
    pulse(50, 0.8),
    pulse(50, 0.0),
    pulse(50, 0.8),
    pulse(50, 0.0),
    pulse(50, 0.8),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HapticPattern {
    ImmediateDanger,
    NearHazard,
    FarWarning,
    LeftDirection,
    RightDirection,
    CenterDirection,
}

impl HapticPattern {
    pub fn name(&self) -> &'static str {
        match self {
            HapticPattern::ImmediateDanger => "immediate_danger",
            HapticPattern::NearHazard => "near_hazard",
            HapticPattern::FarWarning => "far_warning",
            HapticPattern::LeftDirection => "left_direction",
            HapticPattern::RightDirection => "right_direction",
            HapticPattern::CenterDirection => "center_direction",
        }
    }

    pub fn pulses(&self) -> &'static [Pulse] {
        match self {
            HapticPattern::ImmediateDanger => &IMMEDIATE_DANGER,
            HapticPattern::NearHazard => &NEAR_HAZARD,
            HapticPattern::FarWarning => &FAR_WARNING,
            HapticPattern::LeftDirection => &LEFT_DIRECTION,
            HapticPattern::RightDirection => &RIGHT_DIRECTION,
            HapticPattern::CenterDirection => &CENTER_DIRECTION,
        }
    }

    /// Total time the motor is busy playing this pattern.
    pub fn duration_ms(&self) -> u32 {
        self.pulses().iter().map(|p| p.duration_ms).sum()
    }
}

impl Display for HapticPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Haptic motor collaborator. Like [`crate::Speaker`], calls may block.
pub trait Vibrator: Send + Sync + 'static {
    fn vibrate(&self, pattern: HapticPattern) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct LogVibrator;

impl Vibrator for LogVibrator {
    fn vibrate(&self, pattern: HapticPattern) -> anyhow::Result<()> {
        let pulses = pattern
            .pulses()
            .iter()
            .map(|p| format!("({}ms, {:.1})", p.duration_ms, p.intensity))
            .collect::<Vec<_>>()
            .join(" ");
        info!("[HAPTIC] {}: {}", pattern, pulses);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingVibrator {
    played: Arc<Mutex<Vec<HapticPattern>>>,
}

impl RecordingVibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<HapticPattern> {
        self.played.lock().clone()
    }
}

impl Vibrator for RecordingVibrator {
    fn vibrate(&self, pattern: HapticPattern) -> anyhow::Result<()> {
        self.played.lock().push(pattern);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_danger_is_three_strong_pulses() {
        let strong = HapticPattern::ImmediateDanger
            .pulses()
            .iter()
            .filter(|p| p.intensity >= 1.0)
            .count();
        assert_eq!(strong, 3);
        assert_eq!(HapticPattern::ImmediateDanger.duration_ms(), 800);
    }

    #[test]
    fn left_and_right_patterns_feel_different() {
        assert_ne!(
            HapticPattern::LeftDirection.pulses().len(),
            HapticPattern::RightDirection.pulses().len()
        );
        assert_eq!(HapticPattern::CenterDirection.to_string(), "center_direction");
    }
}
