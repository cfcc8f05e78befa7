use crate::config::RecordConfig;
use crate::detect::property::detection::AnalyzedDetection;
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of the detection log.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DetectionRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub frame: u64,
    pub class: String,
    pub confidence: f32,
    pub distance: String,
    pub distance_m: f32,
    pub direction: String,
    pub threat_score: u8,
    pub bbox: [i32; 4],
}

impl DetectionRecord {
    pub fn new(frame: u64, detection: &AnalyzedDetection, at: SystemTime) -> Self {
        let bbox = detection.bbox;
        Self {
            timestamp_ms: at
                .duration_since(UNIX_EPOCH)
                .map_or(0, |elapsed| elapsed.as_millis() as u64),
            frame,
            class: detection.kind.to_string(),
            confidence: detection.confidence,
            distance: detection.proximity.distance_category.to_string(),
            distance_m: detection.proximity.distance_m,
            direction: detection.proximity.direction.to_string(),
            threat_score: detection.proximity.threat_score,
            bbox: [bbox.x1, bbox.y1, bbox.x2, bbox.y2],
        }
    }
}

/// Appends [`DetectionRecord`]s to a JSON-lines file in batches.
///
/// A batch that fails to write is logged and discarded, so a full disk never
/// stalls the frame loop or grows the buffer without bound.
#[derive(Debug)]
pub struct DetectionLog {
    path: PathBuf,
    flush_every: usize,
    pending: Vec<DetectionRecord>,
}

impl DetectionLog {
    /// Creates the parent directory; the file itself appears on first flush.
    pub fn create(config: &RecordConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {:?}", parent))?;
        }
        debug!("Recording detections to {:?}", config.path);
        Ok(Self {
            path: config.path.clone(),
            flush_every: config.flush_every.max(1),
            pending: Vec::with_capacity(config.flush_every),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn record(&mut self, frame: u64, detection: &AnalyzedDetection) {
        self.pending
            .push(DetectionRecord::new(frame, detection, SystemTime::now()));
        if self.pending.len() >= self.flush_every {
            if let Err(e) = self.flush() {
                warn!("Detection log write failed: {:#}", e);
            }
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {:?}", self.path))?;
        let mut writer = BufWriter::new(file);
        for record in batch.iter() {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        debug!("Wrote {} detection records to {:?}", batch.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::property::bbox::BBox;
    use crate::detect::property::detection::{Detection, Proximity};
    use crate::detect::property::direction::DirectionCategory;
    use crate::detect::property::distance::DistanceCategory;
    use crate::detect::property::hazard::HazardKind;

    fn pothole() -> AnalyzedDetection {
        AnalyzedDetection {
            detection: Detection::new(HazardKind::Pothole, 0.9, BBox::new(500, 600, 700, 700), 5),
            proximity: Proximity {
                distance_category: DistanceCategory::Immediate,
                distance_m: 1.9,
                direction: DirectionCategory::Center,
                threat_score: 100,
            },
        }
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("spark-starlight-{}-{}", std::process::id(), name))
            .join("detections.jsonl")
    }

    #[test]
    fn record_fields_follow_the_detection() {
        let at = UNIX_EPOCH + std::time::Duration::from_millis(1_500);
        let record = DetectionRecord::new(7, &pothole(), at);
        assert_eq!(record.timestamp_ms, 1_500);
        assert_eq!(record.frame, 7);
        assert_eq!(record.class, "pothole");
        assert_eq!(record.distance, "immediate");
        assert_eq!(record.direction, "center");
        assert_eq!(record.threat_score, 100);
        assert_eq!(record.bbox, [500, 600, 700, 700]);
    }

    #[test]
    fn records_are_written_in_batches() -> Result<()> {
        let path = scratch_path("batches");
        let _ = std::fs::remove_file(&path);
        let mut log = DetectionLog::create(&RecordConfig {
            enabled: true,
            path: path.clone(),
            flush_every: 2,
        })?;

        log.record(0, &pothole());
        assert_eq!(log.pending(), 1);
        assert!(!path.exists());

        log.record(1, &pothole());
        assert_eq!(log.pending(), 0);
        log.record(2, &pothole());
        log.flush()?;

        let frames = std::fs::read_to_string(&path)?
            .lines()
            .map(serde_json::from_str::<DetectionRecord>)
            .map(|record| record.map(|r| r.frame))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(frames, vec![0, 1, 2]);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
        Ok(())
    }
}
