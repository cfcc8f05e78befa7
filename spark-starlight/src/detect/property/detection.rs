use crate::detect::property::bbox::BBox;
use crate::detect::property::direction::DirectionCategory;
use crate::detect::property::distance::DistanceCategory;
use crate::detect::property::hazard::{HazardKind, PriorityTable};
use serde::Deserialize;
use std::ops::Deref;

/// A detection exactly as a classifier reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDetection {
    pub kind: String,
    pub confidence: f32,
    pub bbox: BBox,
}

/// One hazard observed in one frame. Built fresh every frame; nothing about it
/// survives into the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub kind: HazardKind,
    pub confidence: f32,
    pub bbox: BBox,
    pub priority: u8,
}

impl Detection {
    pub fn new(kind: HazardKind, confidence: f32, bbox: BBox, priority: u8) -> Self {
        Self {
            kind,
            confidence,
            bbox,
            priority,
        }
    }

    pub fn from_raw(raw: &RawDetection, priorities: &PriorityTable) -> Self {
        let kind = HazardKind::from_label(&raw.kind);
        let priority = priorities.priority(&kind);
        Self::new(kind, raw.confidence, raw.bbox, priority)
    }
}

/// What the proximity estimator derived from a box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Proximity {
    pub distance_category: DistanceCategory,
    pub distance_m: f32,
    pub direction: DirectionCategory,
    pub threat_score: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedDetection {
    pub detection: Detection,
    pub proximity: Proximity,
}

impl Deref for AnalyzedDetection {
    type Target = Detection;

    fn deref(&self) -> &Self::Target {
        &self.detection
    }
}

impl AnalyzedDetection {
    pub fn threat_score(&self) -> u8 {
        self.proximity.threat_score
    }

    pub fn distance_m(&self) -> f32 {
        self.proximity.distance_m
    }

    pub fn direction(&self) -> DirectionCategory {
        self.proximity.direction
    }

    /// Same kind seen in the same direction. There is no identity tracking, so
    /// this is the closest thing to "the same object" across frames.
    pub fn same_hazard(&self, kind: &HazardKind, direction: DirectionCategory) -> bool {
        self.kind == *kind && self.proximity.direction == direction
    }
}
