pub mod edge;
pub mod frame;
pub mod fusion;
pub mod mask;
pub mod property;
pub mod proximity;

/// Distances are never reported closer than this.
pub const MIN_DISTANCE_M: f32 = 0.5;
/// Nothing is estimated beyond this; a corridor with nothing closer is clear.
pub const MAX_DISTANCE_M: f32 = 15.0;

// --- Proximity score weights ---
// The bottom edge of a box is the more perspective-reliable cue, raw size the
// least reliable.
pub(crate) const BOTTOM_WEIGHT: f32 = 0.6;
pub(crate) const HEIGHT_WEIGHT: f32 = 0.3;
pub(crate) const AREA_WEIGHT: f32 = 0.1;

pub(crate) const IMMEDIATE_SCORE_THRESHOLD: f32 = 0.7;
pub(crate) const NEAR_SCORE_THRESHOLD: f32 = 0.4;

/// Ground-edge search only looks at the lower part of the frame.
pub(crate) const EDGE_ROI_TOP_RATIO: f32 = 0.5;
