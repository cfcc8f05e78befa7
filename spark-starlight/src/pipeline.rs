use crate::alert::{Alert, AlertArbiter, AlertChannel};
use crate::config::{DetectionConfig, StarlightConfig};
use crate::detect::edge::{EdgeEstimate, EdgeProximityMonitor, EdgeState};
use crate::detect::frame::RgbFrame;
use crate::detect::fusion::FuseDetections;
use crate::detect::property::detection::{AnalyzedDetection, Detection, RawDetection};
use crate::detect::property::hazard::PriorityTable;
use crate::detect::proximity::{select_most_critical, PathClearance, ProximityEstimator};
use crate::record::DetectionLog;
use anyhow::Result;
use log::{debug, warn};
use spark_feedback::{Admission, FeedbackHub};
use std::time::Instant;

/// Where the ground-edge information for a frame comes from.
#[derive(Debug, Copy, Clone)]
pub enum EdgeInput<'a> {
    /// Run the edge monitor over the image.
    Frame(&'a RgbFrame),
    /// Edge columns located by someone else.
    Estimated(EdgeEstimate),
    Unavailable,
}

/// Everything decided about one analyzed frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_index: u64,
    pub detections: Vec<AnalyzedDetection>,
    pub critical: Option<AnalyzedDetection>,
    pub clearance: PathClearance,
    pub edge: EdgeState,
    pub alerts: Vec<Alert>,
}

/// One frame in, at most one hazard alert and one edge alert out.
///
/// Frames are handled strictly one after another on the caller's thread;
/// only the speech and haptic output runs in the background.
pub struct FramePipeline {
    detection: DetectionConfig,
    priorities: PriorityTable,
    estimator: ProximityEstimator,
    edges: Option<EdgeProximityMonitor>,
    arbiter: AlertArbiter,
    frame_skip: u64,
    frames_seen: u64,
    feedback: Option<FeedbackHub>,
    record: Option<DetectionLog>,
}

impl FramePipeline {
    pub fn new(config: &StarlightConfig) -> Result<Self> {
        config.validate()?;
        let (width, height) = (config.frame.width, config.frame.height);

        Ok(Self {
            detection: config.detection.clone(),
            priorities: config.priorities.clone(),
            estimator: ProximityEstimator::new(
                width,
                height,
                &config.distance,
                config.path.corridor_width_ratio,
            ),
            edges: config
                .edge
                .enabled
                .then(|| EdgeProximityMonitor::new(width, height, config.edge.clone())),
            arbiter: AlertArbiter::new(&config.alert),
            frame_skip: config.frame.frame_skip as u64,
            frames_seen: 0,
            feedback: None,
            record: if config.record.enabled {
                Some(DetectionLog::create(&config.record)?)
            } else {
                None
            },
        })
    }

    /// Sends every alert to `hub`. Without a hub alerts are only reported.
    pub fn with_feedback(mut self, hub: FeedbackHub) -> Self {
        self.feedback = Some(hub);
        self
    }

    pub fn arbiter(&self) -> &AlertArbiter {
        &self.arbiter
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Flips audio output; `None` without a hub.
    pub fn toggle_audio(&mut self) -> Option<bool> {
        self.feedback.as_mut().map(|hub| hub.toggle_audio())
    }

    pub fn feedback_dropped(&self) -> u64 {
        self.feedback.as_ref().map_or(0, |hub| hub.dropped())
    }

    /// Returns `None` for frames dropped by frame skipping.
    pub fn process_frame(
        &mut self,
        primary: &[RawDetection],
        secondary: &[RawDetection],
        edges: EdgeInput<'_>,
        now: Instant,
    ) -> Option<FrameReport> {
        let frame_index = self.frames_seen;
        self.frames_seen += 1;
        if frame_index % self.frame_skip != 0 {
            return None;
        }

        let primary = self
            .detection
            .admit(primary)
            .iter()
            .map(|raw| Detection::from_raw(raw, &self.priorities))
            .collect::<Vec<_>>();
        let secondary = if self.detection.secondary_enabled {
            secondary
                .iter()
                .map(|raw| Detection::from_raw(raw, &self.priorities))
                .collect()
        } else {
            Vec::new()
        };

        let primary = self.estimator.retain_valid(primary);
        let secondary = self.estimator.retain_valid(secondary);
        let fused = primary.fuse_with(secondary, self.detection.fusion_iou_threshold);
        let detections = self.estimator.analyze_all(fused);
        let clearance = self.estimator.compute_path_clearance(&detections);
        let critical = select_most_critical(&detections).cloned();
        if let (Some(log), Some(critical)) = (self.record.as_mut(), critical.as_ref()) {
            log.record(frame_index, critical);
        }
        let edge = self.edge_state(edges);

        let alerts = self
            .arbiter
            .arbitrate_hazards(&detections, clearance, now)
            .into_iter()
            .chain(self.arbiter.arbitrate_edge(&edge, now))
            .collect::<Vec<_>>();
        for alert in alerts.iter() {
            self.dispatch(alert);
        }

        debug!(
            "frame {}: {} detections, clear {} ({:.1}m), {} alerts",
            frame_index,
            detections.len(),
            clearance.is_clear,
            clearance.clearance_m,
            alerts.len()
        );

        Some(FrameReport {
            frame_index,
            detections,
            critical,
            clearance,
            edge,
            alerts,
        })
    }

    fn edge_state(&self, input: EdgeInput<'_>) -> EdgeState {
        let Some(monitor) = &self.edges else {
            return EdgeState::default();
        };
        match input {
            EdgeInput::Frame(frame) => monitor.process_frame(frame).unwrap_or_else(|e| {
                warn!("Skipping edge check: {}", e);
                EdgeState::default()
            }),
            EdgeInput::Estimated(estimate) => monitor.evaluate(estimate),
            EdgeInput::Unavailable => EdgeState::default(),
        }
    }

    fn dispatch(&self, alert: &Alert) {
        let Some(hub) = &self.feedback else {
            return;
        };
        let (speech, haptic) = match alert.channel {
            AlertChannel::Primary => (
                hub.speak_primary(alert.message.clone()),
                hub.vibrate(alert.haptics.clone()),
            ),
            AlertChannel::Secondary => (
                hub.speak_secondary(alert.message.clone()),
                hub.vibrate_edge(alert.haptics.clone()),
            ),
        };
        if speech == Admission::Dropped || haptic == Admission::Dropped {
            debug!("{} output busy (speech {:?}, haptic {:?})", alert.key, speech, haptic);
        }
    }

    /// Flushes the detection log, lets in-flight output finish and stops the
    /// output workers.
    pub async fn shutdown(mut self) -> Result<()> {
        let flushed = match self.record.as_mut() {
            Some(log) => log.flush(),
            None => Ok(()),
        };
        if let Some(hub) = self.feedback {
            hub.shutdown().await?;
        }
        flushed
    }
}
