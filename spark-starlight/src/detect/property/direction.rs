use std::fmt::{Display, Formatter};

pub const DIRECTION_SLOTS: usize = 5;

const CENTER_BAND: f32 = 0.2;
const FAR_BAND: f32 = 0.5;

/// Horizontal bearing of a detection relative to the camera axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DirectionCategory {
    Center,
    Left,
    Right,
    FarLeft,
    FarRight,
}

impl Display for DirectionCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectionCategory::Center => write!(f, "center"),
            DirectionCategory::Left => write!(f, "left"),
            DirectionCategory::Right => write!(f, "right"),
            DirectionCategory::FarLeft => write!(f, "far_left"),
            DirectionCategory::FarRight => write!(f, "far_right"),
        }
    }
}

impl DirectionCategory {
    /// Classifies a normalized horizontal offset: -1.0 is the left frame
    /// border, 0.0 the frame center, 1.0 the right border.
    pub fn from_offset_ratio(offset_ratio: f32) -> Self {
        if offset_ratio.abs() < CENTER_BAND {
            DirectionCategory::Center
        } else if offset_ratio < -FAR_BAND {
            DirectionCategory::FarLeft
        } else if offset_ratio < 0.0 {
            DirectionCategory::Left
        } else if offset_ratio > FAR_BAND {
            DirectionCategory::FarRight
        } else {
            DirectionCategory::Right
        }
    }

    /// Natural-language phrase used in spoken warnings.
    pub fn phrase(&self) -> &'static str {
        match self {
            DirectionCategory::Center => "directly ahead",
            DirectionCategory::Left => "on the left",
            DirectionCategory::Right => "on the right",
            DirectionCategory::FarLeft => "far left",
            DirectionCategory::FarRight => "far right",
        }
    }

    /// Contribution of the bearing to the threat score.
    pub fn threat_points(&self) -> u8 {
        match self {
            DirectionCategory::Center => 10,
            DirectionCategory::Left | DirectionCategory::Right => 7,
            DirectionCategory::FarLeft | DirectionCategory::FarRight => 3,
        }
    }

    pub fn slot(&self) -> usize {
        match self {
            DirectionCategory::Center => 0,
            DirectionCategory::Left => 1,
            DirectionCategory::Right => 2,
            DirectionCategory::FarLeft => 3,
            DirectionCategory::FarRight => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_bands() {
        assert_eq!(DirectionCategory::from_offset_ratio(0.0), DirectionCategory::Center);
        assert_eq!(DirectionCategory::from_offset_ratio(-0.19), DirectionCategory::Center);
        assert_eq!(DirectionCategory::from_offset_ratio(-0.2), DirectionCategory::Left);
        assert_eq!(DirectionCategory::from_offset_ratio(-0.5), DirectionCategory::Left);
        assert_eq!(DirectionCategory::from_offset_ratio(-0.51), DirectionCategory::FarLeft);
        assert_eq!(DirectionCategory::from_offset_ratio(0.3), DirectionCategory::Right);
        assert_eq!(DirectionCategory::from_offset_ratio(0.5), DirectionCategory::Right);
        assert_eq!(DirectionCategory::from_offset_ratio(0.9), DirectionCategory::FarRight);
    }
}
