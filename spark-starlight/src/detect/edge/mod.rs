mod color;
mod gradient;

use crate::config::EdgeConfig;
use crate::detect::frame::RgbFrame;
use crate::detect::EDGE_ROI_TOP_RATIO;
use crate::error::DataError;
use log::debug;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EdgeSide {
    Left,
    Right,
}

impl Display for EdgeSide {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeSide::Left => write!(f, "left"),
            EdgeSide::Right => write!(f, "right"),
        }
    }
}

/// The first estimate that found something.
pub fn first_present<T>(primary: Option<T>, fallback: Option<T>) -> Option<T> {
    primary.or(fallback)
}

/// Column positions of the walkable surface borders. `None` means the side
/// could not be located, which is not the same as "at the frame border".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct EdgeEstimate {
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl EdgeEstimate {
    pub fn new(left: Option<u32>, right: Option<u32>) -> Self {
        Self { left, right }
    }

    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    /// Fills every unknown side from `fallback`.
    pub fn or_else(self, fallback: impl FnOnce() -> EdgeEstimate) -> EdgeEstimate {
        if self.is_complete() {
            return self;
        }
        let fallback = fallback();
        EdgeEstimate {
            left: first_present(self.left, fallback.left),
            right: first_present(self.right, fallback.right),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct EdgeState {
    pub left_edge_x: Option<u32>,
    pub right_edge_x: Option<u32>,
    pub near_edge: bool,
    pub edge_side: Option<EdgeSide>,
}

/// Locates the borders of the walkable surface in the lower half of the
/// frame and warns when the user, assumed at the horizontal center, drifts
/// within `warning_distance_ratio` of one of them.
///
/// Two estimators run over the same region. The gradient one looks for
/// columns dense with vertical edges; the color one takes the widest
/// low-saturation region. The color estimate only fills sides the gradient
/// estimate missed.
#[derive(Debug, Clone)]
pub struct EdgeProximityMonitor {
    frame_width: u32,
    frame_height: u32,
    roi_top: u32,
    warning_width: u32,
    config: EdgeConfig,
}

impl EdgeProximityMonitor {
    pub fn new(frame_width: u32, frame_height: u32, config: EdgeConfig) -> Self {
        Self {
            frame_width,
            frame_height,
            roi_top: (frame_height as f32 * EDGE_ROI_TOP_RATIO) as u32,
            warning_width: (frame_width as f32 * config.warning_distance_ratio) as u32,
            config,
        }
    }

    fn roi_height(&self) -> u32 {
        self.frame_height - self.roi_top
    }

    fn check_frame(&self, frame: &RgbFrame) -> Result<(), DataError> {
        if frame.width() != self.frame_width || frame.height() != self.frame_height {
            return Err(DataError::InvalidFrame {
                width: self.frame_width,
                height: self.frame_height,
                actual_width: frame.width(),
                actual_height: frame.height(),
                actual_len: frame.data().len(),
            });
        }
        Ok(())
    }

    pub fn detect_edges_gradient(&self, frame: &RgbFrame) -> Result<EdgeEstimate, DataError> {
        self.check_frame(frame)?;
        let mask = gradient::edge_mask(frame, self.roi_top as usize, self.config.gradient_threshold);
        let min_count = self.roi_height() as f32 * self.config.column_density_ratio;
        let (left, right) =
            gradient::vote_edges(&mask.column_counts(), min_count, self.config.min_votes);
        Ok(EdgeEstimate::new(left, right))
    }

    pub fn detect_edges_color(&self, frame: &RgbFrame) -> Result<EdgeEstimate, DataError> {
        self.check_frame(frame)?;
        let kernel = self.config.morphology_kernel;
        let mask = color::surface_mask(
            frame,
            self.roi_top as usize,
            self.config.max_saturation,
            self.config.min_value,
        )
        .close(kernel)
        .open(kernel);

        Ok(match mask.largest_component_span() {
            Some((min_x, max_x)) => EdgeEstimate::new(Some(min_x as u32), Some(max_x as u32 + 1)),
            None => EdgeEstimate::default(),
        })
    }

    /// Gradient estimate, with unknown sides filled by the color estimate.
    pub fn locate_edges(&self, frame: &RgbFrame) -> Result<EdgeEstimate, DataError> {
        let gradient = self.detect_edges_gradient(frame)?;
        let mut color_failure = None;
        let edges = gradient.or_else(|| {
            self.detect_edges_color(frame).unwrap_or_else(|e| {
                color_failure = Some(e);
                EdgeEstimate::default()
            })
        });
        match color_failure {
            Some(e) => Err(e),
            None => {
                debug!("edges: gradient {:?}, fused {:?}", gradient, edges);
                Ok(edges)
            }
        }
    }

    /// Whether the user is within the warning margin of an edge. Unknown edges
    /// never warn.
    pub fn check_user_position(
        &self,
        left_edge: Option<u32>,
        right_edge: Option<u32>,
    ) -> (bool, Option<EdgeSide>) {
        let (Some(left), Some(right)) = (left_edge, right_edge) else {
            return (false, None);
        };
        let user_x = (self.frame_width / 2) as i64;
        let margin = self.warning_width as i64;

        if user_x < left as i64 + margin {
            (true, Some(EdgeSide::Left))
        } else if user_x > right as i64 - margin {
            (true, Some(EdgeSide::Right))
        } else {
            (false, None)
        }
    }

    pub fn evaluate(&self, edges: EdgeEstimate) -> EdgeState {
        let (near_edge, edge_side) = self.check_user_position(edges.left, edges.right);
        EdgeState {
            left_edge_x: edges.left,
            right_edge_x: edges.right,
            near_edge,
            edge_side,
        }
    }

    pub fn process_frame(&self, frame: &RgbFrame) -> Result<EdgeState, DataError> {
        Ok(self.evaluate(self.locate_edges(frame)?))
    }
}
