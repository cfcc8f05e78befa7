use crate::detect::property::bbox::BBox;
use thiserror::Error;

/// Bad per-frame input. Always recoverable: the offending item is dropped and
/// the rest of the frame carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("degenerate bounding box {0}")]
    InvalidBox(BBox),
    #[error("bounding box {bbox} lies outside the {width}x{height} frame")]
    OutOfFrame { bbox: BBox, width: u32, height: u32 },
    #[error("frame is {actual_width}x{actual_height} ({actual_len} bytes), expected {width}x{height} RGB")]
    InvalidFrame {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
        actual_len: usize,
    },
}
