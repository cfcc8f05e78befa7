use std::fmt::{Display, Formatter};

/// Coarse range band of a detection, judged from 2-D box geometry only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DistanceCategory {
    Immediate, // within a couple of steps
    Near,
    Far,
}

impl Display for DistanceCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceCategory::Immediate => write!(f, "immediate"),
            DistanceCategory::Near => write!(f, "near"),
            DistanceCategory::Far => write!(f, "far"),
        }
    }
}

impl DistanceCategory {
    /// Contribution of the range band to the threat score.
    pub fn threat_points(&self) -> u8 {
        match self {
            DistanceCategory::Immediate => 40,
            DistanceCategory::Near => 25,
            DistanceCategory::Far => 10,
        }
    }

    /// First word of a spoken warning.
    pub fn urgency_word(&self) -> &'static str {
        match self {
            DistanceCategory::Immediate => "DANGER",
            DistanceCategory::Near => "Caution",
            DistanceCategory::Far => "Notice",
        }
    }

    /// Maps a proximity score onto meters for this band. The result is not yet
    /// clamped or rounded.
    pub(crate) fn raw_distance_m(&self, proximity_score: f32) -> f32 {
        match self {
            DistanceCategory::Immediate => (proximity_score * 3.0).min(2.0),
            DistanceCategory::Near => 2.0 + (0.7 - proximity_score) * 10.0,
            DistanceCategory::Far => 5.0 + (0.4 - proximity_score) * 20.0,
        }
    }
}
