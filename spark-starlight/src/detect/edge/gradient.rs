use crate::detect::frame::RgbFrame;
use crate::detect::mask::BinaryMask;
use rayon::prelude::*;

const BLUR_KERNEL: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
const BLUR_NORM: f32 = 16.0;

/// Single-channel float image. Reads outside the image repeat the border.
struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    fn from_fn<F>(width: usize, height: usize, value: F) -> Self
    where
        F: Fn(usize, usize) -> f32 + Sync,
    {
        let data = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| value(x, y))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// 8-bit luma of the rows from `top` down.
    fn luma(frame: &RgbFrame, top: usize) -> Self {
        let width = frame.width() as usize;
        let height = frame.height() as usize - top;
        Self::from_fn(width, height, |x, y| {
            let row = frame.row((top + y) as u32);
            let (r, g, b) = (row[x * 3] as f32, row[x * 3 + 1] as f32, row[x * 3 + 2] as f32);
            (0.299 * r + 0.587 * g + 0.114 * b).round()
        })
    }

    fn at(&self, x: isize, y: isize) -> f32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.data[y * self.width + x]
    }

    /// Separable 5x5 gaussian.
    fn blur(&self) -> Self {
        let weighted = |sample: &dyn Fn(isize) -> f32| {
            BLUR_KERNEL
                .iter()
                .enumerate()
                .map(|(i, w)| w * sample(i as isize - 2))
                .sum::<f32>()
                / BLUR_NORM
        };
        let horizontal = Self::from_fn(self.width, self.height, |x, y| {
            weighted(&|dx| self.at(x as isize + dx, y as isize))
        });
        Self::from_fn(self.width, self.height, |x, y| {
            weighted(&|dy| horizontal.at(x as isize, y as isize + dy))
        })
    }

    /// 3x3 Sobel response to horizontal intensity change.
    fn sobel_x(&self, x: usize, y: usize) -> f32 {
        let (x, y) = (x as isize, y as isize);
        let column = |dx: isize| self.at(x + dx, y - 1) + 2.0 * self.at(x + dx, y) + self.at(x + dx, y + 1);
        column(1) - column(-1)
    }
}

/// Pixels of the region below `top` that sit on a strong vertical edge.
pub(crate) fn edge_mask(frame: &RgbFrame, top: usize, threshold: u16) -> BinaryMask {
    let blurred = Plane::luma(frame, top).blur();
    BinaryMask::from_fn(blurred.width, blurred.height, |x, y| {
        blurred.sobel_x(x, y).abs() >= threshold as f32
    })
}

/// Scans columns from each border toward the center. A column votes when its
/// edge-pixel count exceeds `min_count`; a side's edge is the median of its
/// first `min_votes` votes.
pub(crate) fn vote_edges(
    counts: &[usize],
    min_count: f32,
    min_votes: usize,
) -> (Option<u32>, Option<u32>) {
    let width = counts.len();
    let half = width / 2;
    let left = vote(0..half, counts, min_count, min_votes);
    let right = vote((half + 1..width).rev(), counts, min_count, min_votes);
    (left, right)
}

fn vote(
    columns: impl Iterator<Item = usize>,
    counts: &[usize],
    min_count: f32,
    min_votes: usize,
) -> Option<u32> {
    let mut votes = Vec::with_capacity(min_votes);
    for x in columns {
        if counts[x] as f32 > min_count {
            votes.push(x);
            if votes.len() >= min_votes {
                votes.sort_unstable();
                return Some(votes[votes.len() / 2] as u32);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_need_not_be_adjacent() {
        let mut counts = vec![0; 100];
        counts[5] = 50;
        counts[9] = 50;
        counts[20] = 50;
        assert_eq!(vote_edges(&counts, 30.0, 3), (Some(9), None));
    }

    #[test]
    fn sparse_columns_do_not_vote() {
        let mut counts = vec![10; 100];
        counts[90] = 31;
        counts[91] = 31;
        counts[92] = 30;
        counts[93] = 31;
        assert_eq!(vote_edges(&counts, 30.0, 3), (None, Some(91)));
    }

    #[test]
    fn center_column_is_never_scanned() {
        let mut counts = vec![0; 11];
        counts[5] = 99;
        assert_eq!(vote_edges(&counts, 1.0, 1), (None, None));
    }
}
