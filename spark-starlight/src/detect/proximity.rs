use crate::config::DistanceBands;
use crate::detect::property::bbox::BBox;
use crate::detect::property::detection::{AnalyzedDetection, Detection, Proximity};
use crate::detect::property::direction::DirectionCategory;
use crate::detect::property::distance::DistanceCategory;
use crate::detect::{
    AREA_WEIGHT, BOTTOM_WEIGHT, HEIGHT_WEIGHT, IMMEDIATE_SCORE_THRESHOLD, MAX_DISTANCE_M,
    MIN_DISTANCE_M, NEAR_SCORE_THRESHOLD,
};
use crate::error::DataError;
use log::{debug, warn};

const MAX_THREAT_SCORE: u8 = 100;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathClearance {
    pub is_clear: bool,
    pub clearance_m: f32,
}

impl PathClearance {
    pub const CLEAR: PathClearance = PathClearance {
        is_clear: true,
        clearance_m: MAX_DISTANCE_M,
    };
}

/// Pixel limits of one distance band for a given frame height.
#[derive(Debug, Copy, Clone)]
struct BandThreshold {
    height_px: i32,
    bottom_px: i32,
}

impl BandThreshold {
    fn new(frame_height: u32, height_ratio: f32, bottom_ratio: f32) -> Self {
        Self {
            height_px: (frame_height as f32 * height_ratio) as i32,
            bottom_px: (frame_height as f32 * bottom_ratio) as i32,
        }
    }

    fn contains(&self, bbox: &BBox) -> bool {
        bbox.height() > self.height_px || bbox.y2 > self.bottom_px
    }
}

/// Monocular range, bearing and threat estimation from box geometry alone.
///
/// Bigger boxes, and boxes whose bottom edge sits lower in the frame, are
/// assumed to be closer. Every method is a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct ProximityEstimator {
    frame_width: u32,
    frame_height: u32,
    immediate: BandThreshold,
    near: BandThreshold,
    corridor_width_ratio: f32,
}

impl ProximityEstimator {
    pub fn new(
        frame_width: u32,
        frame_height: u32,
        bands: &DistanceBands,
        corridor_width_ratio: f32,
    ) -> Self {
        Self {
            frame_width,
            frame_height,
            immediate: BandThreshold::new(
                frame_height,
                bands.immediate.height_ratio,
                bands.immediate.bottom_ratio,
            ),
            near: BandThreshold::new(frame_height, bands.near.height_ratio, bands.near.bottom_ratio),
            corridor_width_ratio,
        }
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    fn proximity_score(&self, bbox: &BBox) -> f32 {
        let frame_height = self.frame_height as f32;
        let height_ratio = bbox.height() as f32 / frame_height;
        let bottom_ratio = bbox.y2 as f32 / frame_height;
        let area_ratio = bbox.area() as f32 / (self.frame_width as f32 * frame_height);

        BOTTOM_WEIGHT * bottom_ratio + HEIGHT_WEIGHT * height_ratio + AREA_WEIGHT * area_ratio
    }

    /// Distance band and estimated range in meters, clamped to
    /// `[MIN_DISTANCE_M, MAX_DISTANCE_M]` and rounded to 0.1 m.
    pub fn classify_distance(&self, bbox: &BBox) -> (DistanceCategory, f32) {
        let score = self.proximity_score(bbox);

        let category = if self.immediate.contains(bbox) || score > IMMEDIATE_SCORE_THRESHOLD {
            DistanceCategory::Immediate
        } else if self.near.contains(bbox) || score > NEAR_SCORE_THRESHOLD {
            DistanceCategory::Near
        } else {
            DistanceCategory::Far
        };

        let distance = category
            .raw_distance_m(score)
            .clamp(MIN_DISTANCE_M, MAX_DISTANCE_M);
        (category, (distance * 10.0).round() / 10.0)
    }

    pub fn classify_direction(&self, bbox: &BBox) -> DirectionCategory {
        let half_width = self.frame_width as f32 / 2.0;
        DirectionCategory::from_offset_ratio((bbox.center_x() - half_width) / half_width)
    }

    pub fn score_threat(
        &self,
        priority: u8,
        distance: DistanceCategory,
        direction: DirectionCategory,
    ) -> u8 {
        let total = priority as u16 * 10
            + distance.threat_points() as u16
            + direction.threat_points() as u16;
        total.min(MAX_THREAT_SCORE as u16) as u8
    }

    /// Checks that a box is non-degenerate and lies inside the frame.
    pub fn check_bbox(&self, bbox: BBox) -> Result<(), DataError> {
        if !bbox.is_well_formed() {
            return Err(DataError::InvalidBox(bbox));
        }
        if !bbox.fits_within(self.frame_width, self.frame_height) {
            return Err(DataError::OutOfFrame {
                bbox,
                width: self.frame_width,
                height: self.frame_height,
            });
        }
        Ok(())
    }

    /// Drops detections whose box fails [`Self::check_bbox`].
    ///
    /// Runs ahead of fusion so a bad primary box cannot suppress a valid
    /// secondary one.
    pub fn retain_valid(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        detections.retain(|detection| match self.check_bbox(detection.bbox) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping {} detection: {}", detection.kind, e);
                false
            }
        });
        detections
    }

    pub fn analyze(&self, detection: Detection) -> Result<AnalyzedDetection, DataError> {
        let bbox = detection.bbox;
        self.check_bbox(bbox)?;

        let (distance_category, distance_m) = self.classify_distance(&bbox);
        let direction = self.classify_direction(&bbox);
        let threat_score = self.score_threat(detection.priority, distance_category, direction);

        Ok(AnalyzedDetection {
            detection,
            proximity: Proximity {
                distance_category,
                distance_m,
                direction,
                threat_score,
            },
        })
    }

    /// Analyzes every detection, dropping the malformed ones.
    pub fn analyze_all(&self, detections: Vec<Detection>) -> Vec<AnalyzedDetection> {
        detections
            .into_iter()
            .filter_map(|detection| {
                let kind = detection.kind.clone();
                match self.analyze(detection) {
                    Ok(analyzed) => {
                        debug!(
                            "{} {} {} {:.1}m threat {}",
                            analyzed.kind,
                            analyzed.proximity.distance_category,
                            analyzed.proximity.direction,
                            analyzed.proximity.distance_m,
                            analyzed.proximity.threat_score
                        );
                        Some(analyzed)
                    }
                    Err(e) => {
                        warn!("Dropping {} detection: {}", kind, e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn compute_path_clearance(&self, detections: &[AnalyzedDetection]) -> PathClearance {
        self.compute_path_clearance_with(detections, self.corridor_width_ratio)
    }

    /// Nearest hazard inside the central walking corridor, if any is closer
    /// than the estimation horizon.
    pub fn compute_path_clearance_with(
        &self,
        detections: &[AnalyzedDetection],
        corridor_width_ratio: f32,
    ) -> PathClearance {
        let width = self.frame_width as f32;
        let left_bound = width * (0.5 - corridor_width_ratio / 2.0);
        let right_bound = width * (0.5 + corridor_width_ratio / 2.0);

        let nearest = detections
            .iter()
            .filter(|d| d.bbox.overlaps_span(left_bound, right_bound))
            .map(|d| d.distance_m())
            .fold(MAX_DISTANCE_M, f32::min);

        if nearest < MAX_DISTANCE_M {
            PathClearance {
                is_clear: false,
                clearance_m: nearest,
            }
        } else {
            PathClearance::CLEAR
        }
    }
}

/// Highest threat score wins. Equal scores go to the closer detection, and
/// equal distances to the one that came first.
pub fn select_most_critical<'a>(
    detections: impl IntoIterator<Item = &'a AnalyzedDetection>,
) -> Option<&'a AnalyzedDetection> {
    detections.into_iter().reduce(|best, candidate| {
        let better = candidate.threat_score() > best.threat_score()
            || (candidate.threat_score() == best.threat_score()
                && candidate.distance_m() < best.distance_m());
        if better {
            candidate
        } else {
            best
        }
    })
}
