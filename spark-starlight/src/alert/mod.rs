pub mod key;
pub mod message;

use crate::alert::key::{AnnouncementKey, CooldownTable};
use crate::config::AlertConfig;
use crate::detect::edge::EdgeState;
use crate::detect::property::detection::AnalyzedDetection;
use crate::detect::proximity::{select_most_critical, PathClearance};
use log::{debug, info};
use spark_feedback::HapticPattern;
use std::time::{Duration, Instant};

/// Which audio lane an alert is spoken on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlertChannel {
    /// Hazards and "path clear".
    Primary,
    /// Edge cues.
    Secondary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub key: AnnouncementKey,
    pub channel: AlertChannel,
    pub message: String,
    pub haptics: Vec<HapticPattern>,
}

/// Decides, frame by frame, what (if anything) is worth saying.
///
/// Each announcement key is either quiescent or cooling down. A hazard is
/// re-announced only when it is new, i.e. a different `(kind, direction)` than
/// the last announced one, or when its threat score rose by more than
/// `escalation_margin`. Either way it still has to wait out its key's
/// cooldown, so escalation changes eligibility, never the minimum spacing.
///
/// All state lives here and is only touched by the frame loop.
#[derive(Debug, Clone)]
pub struct AlertArbiter {
    cooldown: Duration,
    min_priority: u8,
    clear_frames_threshold: u32,
    escalation_margin: u8,
    cooldowns: CooldownTable,
    clear_frames: u32,
    last_critical: Option<AnalyzedDetection>,
}

impl AlertArbiter {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            cooldown: config.cooldown(),
            min_priority: config.min_priority_for_audio,
            clear_frames_threshold: config.clear_frames_threshold,
            escalation_margin: config.escalation_margin,
            cooldowns: CooldownTable::new(),
            clear_frames: 0,
            last_critical: None,
        }
    }

    pub fn clear_frame_count(&self) -> u32 {
        self.clear_frames
    }

    /// The hazard most recently announced, forgotten once the path clears.
    pub fn last_critical(&self) -> Option<&AnalyzedDetection> {
        self.last_critical.as_ref()
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    pub fn arbitrate_hazards(
        &mut self,
        detections: &[AnalyzedDetection],
        clearance: PathClearance,
        now: Instant,
    ) -> Option<Alert> {
        if detections.is_empty() || clearance.is_clear {
            return self.on_clear_frame(clearance, now);
        }
        self.clear_frames = 0;

        let candidate = select_most_critical(
            detections
                .iter()
                .filter(|d| d.priority >= self.min_priority),
        )?;

        let eligible = match &self.last_critical {
            None => true,
            Some(last) => {
                !candidate.same_hazard(&last.kind, last.direction())
                    || candidate.threat_score()
                        > last.threat_score().saturating_add(self.escalation_margin)
            }
        };
        if !eligible {
            return None;
        }

        let key = AnnouncementKey::hazard(&candidate.kind, candidate.direction());
        if !self.cooldowns.try_fire(key, now, self.cooldown) {
            debug!("{} cooling down, dropping announcement", key);
            return None;
        }

        let alert = Alert {
            key,
            channel: AlertChannel::Primary,
            message: message::hazard_message(candidate),
            haptics: message::hazard_haptics(
                candidate.proximity.distance_category,
                candidate.direction(),
            ),
        };
        info!("{} (threat {})", alert.message, candidate.threat_score());
        self.last_critical = Some(candidate.clone());
        Some(alert)
    }

    fn on_clear_frame(&mut self, clearance: PathClearance, now: Instant) -> Option<Alert> {
        self.last_critical = None;
        self.clear_frames += 1;
        if self.clear_frames < self.clear_frames_threshold {
            return None;
        }
        self.clear_frames = 0;

        let key = AnnouncementKey::PathClear;
        if !self.cooldowns.try_fire(key, now, self.cooldown.saturating_mul(2)) {
            return None;
        }
        Some(Alert {
            key,
            channel: AlertChannel::Primary,
            message: message::path_clear_message(clearance),
            haptics: Vec::new(),
        })
    }

    /// Edge warnings are rate-limited per side and never compete with hazard
    /// announcements.
    pub fn arbitrate_edge(&mut self, edge: &EdgeState, now: Instant) -> Option<Alert> {
        let side = match (edge.near_edge, edge.edge_side) {
            (true, Some(side)) => side,
            _ => return None,
        };

        let key = AnnouncementKey::edge(side);
        if !self.cooldowns.try_fire(key, now, self.cooldown) {
            return None;
        }
        Some(Alert {
            key,
            channel: AlertChannel::Secondary,
            message: message::edge_message(side),
            haptics: message::edge_haptics(side),
        })
    }
}
