use crate::detect::edge::EdgeSide;
use crate::detect::property::detection::AnalyzedDetection;
use crate::detect::property::direction::DirectionCategory;
use crate::detect::property::distance::DistanceCategory;
use crate::detect::proximity::PathClearance;
use crate::detect::MAX_DISTANCE_M;
use spark_feedback::HapticPattern;

fn meters(distance_m: f32) -> String {
    let rounded = distance_m.round() as u32;
    if rounded == 1 {
        "1 meter".to_string()
    } else {
        format!("{} meters", rounded)
    }
}

/// "DANGER: pothole directly ahead, 2 meters!" and friends. Far hazards carry
/// no distance.
pub fn hazard_message(hazard: &AnalyzedDetection) -> String {
    let category = hazard.proximity.distance_category;
    let urgency = category.urgency_word();
    let label = hazard.kind.spoken_label();
    let phrase = hazard.direction().phrase();

    match category {
        DistanceCategory::Immediate => format!(
            "{}: {} {}, {}!",
            urgency,
            label,
            phrase,
            meters(hazard.distance_m())
        ),
        DistanceCategory::Near => format!(
            "{}: {} {}, {}.",
            urgency,
            label,
            phrase,
            meters(hazard.distance_m())
        ),
        DistanceCategory::Far => format!("{}: {} {}.", urgency, label, phrase),
    }
}

pub fn path_clear_message(clearance: PathClearance) -> String {
    if clearance.clearance_m < MAX_DISTANCE_M {
        format!("Path clear for {}.", meters(clearance.clearance_m))
    } else {
        "Path clear ahead.".to_string()
    }
}

pub fn edge_message(side: EdgeSide) -> String {
    format!("Caution: Approaching sidewalk edge on {}.", side)
}

fn direction_pattern(direction: DirectionCategory) -> HapticPattern {
    match direction {
        DirectionCategory::Center => HapticPattern::CenterDirection,
        DirectionCategory::Left | DirectionCategory::FarLeft => HapticPattern::LeftDirection,
        DirectionCategory::Right | DirectionCategory::FarRight => HapticPattern::RightDirection,
    }
}

/// Urgency pulse followed by the bearing.
pub fn hazard_haptics(
    distance: DistanceCategory,
    direction: DirectionCategory,
) -> Vec<HapticPattern> {
    let urgency = match distance {
        DistanceCategory::Immediate => HapticPattern::ImmediateDanger,
        DistanceCategory::Near => HapticPattern::NearHazard,
        DistanceCategory::Far => HapticPattern::FarWarning,
    };
    vec![urgency, direction_pattern(direction)]
}

pub fn edge_haptics(side: EdgeSide) -> Vec<HapticPattern> {
    match side {
        EdgeSide::Left => vec![HapticPattern::LeftDirection],
        EdgeSide::Right => vec![HapticPattern::RightDirection],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::property::detection::{Detection, Proximity};
    use crate::detect::property::bbox::BBox;
    use crate::detect::property::hazard::HazardKind;

    fn hazard(
        kind: HazardKind,
        distance_category: DistanceCategory,
        distance_m: f32,
        direction: DirectionCategory,
    ) -> AnalyzedDetection {
        AnalyzedDetection {
            detection: Detection::new(kind, 0.9, BBox::new(0, 0, 10, 10), 3),
            proximity: Proximity {
                distance_category,
                distance_m,
                direction,
                threat_score: 50,
            },
        }
    }

    #[test]
    fn hazard_messages_by_band() {
        assert_eq!(
            hazard_message(&hazard(
                HazardKind::Pothole,
                DistanceCategory::Immediate,
                1.9,
                DirectionCategory::Center
            )),
            "DANGER: pothole directly ahead, 2 meters!"
        );
        assert_eq!(
            hazard_message(&hazard(
                HazardKind::Manhole,
                DistanceCategory::Immediate,
                0.8,
                DirectionCategory::Left
            )),
            "DANGER: manhole cover on the left, 1 meter!"
        );
        assert_eq!(
            hazard_message(&hazard(
                HazardKind::Person,
                DistanceCategory::Near,
                3.4,
                DirectionCategory::Right
            )),
            "Caution: pedestrian on the right, 3 meters."
        );
        assert_eq!(
            hazard_message(&hazard(
                HazardKind::Unclassified("scooter".into()),
                DistanceCategory::Far,
                9.0,
                DirectionCategory::FarLeft
            )),
            "Notice: scooter far left."
        );
    }

    #[test]
    fn path_clear_messages() {
        assert_eq!(path_clear_message(PathClearance::CLEAR), "Path clear ahead.");
        assert_eq!(
            path_clear_message(PathClearance {
                is_clear: true,
                clearance_m: 8.4
            }),
            "Path clear for 8 meters."
        );
    }

    #[test]
    fn haptics_follow_band_and_bearing() {
        assert_eq!(
            hazard_haptics(DistanceCategory::Immediate, DirectionCategory::Center),
            vec![HapticPattern::ImmediateDanger, HapticPattern::CenterDirection]
        );
        assert_eq!(
            hazard_haptics(DistanceCategory::Near, DirectionCategory::FarRight),
            vec![HapticPattern::NearHazard, HapticPattern::RightDirection]
        );
        assert_eq!(
            hazard_haptics(DistanceCategory::Far, DirectionCategory::FarLeft),
            vec![HapticPattern::FarWarning, HapticPattern::LeftDirection]
        );
        assert_eq!(edge_haptics(EdgeSide::Right), vec![HapticPattern::RightDirection]);
        assert_eq!(
            edge_message(EdgeSide::Left),
            "Caution: Approaching sidewalk edge on left."
        );
    }
}
