use crate::detect::property::detection::Detection;

/// Secondary detections overlapping a primary one by more than this are
/// treated as the same object.
pub const FUSION_IOU_THRESHOLD: f32 = 0.3;

pub trait FuseDetections {
    /// Keeps every detection of `self` and appends the `secondary` detections
    /// that do not duplicate any of them. Secondary detections are never
    /// compared against each other.
    fn fuse_with(self, secondary: Vec<Detection>, iou_threshold: f32) -> Vec<Detection>;
}

impl FuseDetections for Vec<Detection> {
    fn fuse_with(self, secondary: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
        let primary_count = self.len();
        let mut fused = self;

        for candidate in secondary {
            let duplicate = fused[..primary_count]
                .iter()
                .any(|primary| primary.bbox.iou(&candidate.bbox) > iou_threshold);
            if !duplicate {
                fused.push(candidate);
            }
        }

        fused
    }
}

pub fn fuse(primary: Vec<Detection>, secondary: Vec<Detection>) -> Vec<Detection> {
    primary.fuse_with(secondary, FUSION_IOU_THRESHOLD)
}
