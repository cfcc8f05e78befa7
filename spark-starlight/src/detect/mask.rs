use bitvec::prelude::BitVec;
use rayon::prelude::*;
use std::collections::VecDeque;

/// Row-major binary image.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    bits: BitVec,
}

impl BinaryMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: BitVec::repeat(false, width * height),
        }
    }

    /// Evaluates `predicate(x, y)` for every pixel, one row per rayon task.
    pub fn from_fn<F>(width: usize, height: usize, predicate: F) -> Self
    where
        F: Fn(usize, usize) -> bool + Sync,
    {
        let values = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| predicate(x, y))
            .collect::<Vec<bool>>();

        Self {
            width,
            height,
            bits: values.into_iter().collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        self.bits.set(y * self.width + x, value);
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Number of set pixels in every column.
    pub fn column_counts(&self) -> Vec<usize> {
        (0..self.width)
            .into_par_iter()
            .map(|x| (0..self.height).filter(|&y| self.get(x, y)).count())
            .collect()
    }

    /// Square-kernel morphology, done as a horizontal then a vertical pass.
    /// Pixels outside the image never influence the result.
    fn morph(&self, kernel: usize, erode: bool) -> Self {
        let radius = kernel / 2;
        let (width, height) = (self.width, self.height);

        let horizontal = BinaryMask::from_fn(width, height, |x, y| {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            reduce_window((lo..=hi).map(|xx| self.get(xx, y)), erode)
        });
        BinaryMask::from_fn(width, height, |x, y| {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(height - 1);
            reduce_window((lo..=hi).map(|yy| horizontal.get(x, yy)), erode)
        })
    }

    pub fn erode(&self, kernel: usize) -> Self {
        self.morph(kernel, true)
    }

    pub fn dilate(&self, kernel: usize) -> Self {
        self.morph(kernel, false)
    }

    /// Fills small holes.
    pub fn close(&self, kernel: usize) -> Self {
        self.dilate(kernel).erode(kernel)
    }

    /// Removes small specks.
    pub fn open(&self, kernel: usize) -> Self {
        self.erode(kernel).dilate(kernel)
    }

    /// Horizontal extent `(min_x, max_x)` of the largest 8-connected region.
    /// The earliest region in row-major order wins a tie.
    pub fn largest_component_span(&self) -> Option<(usize, usize)> {
        let mut visited: BitVec = BitVec::repeat(false, self.bits.len());
        let mut queue = VecDeque::new();
        let mut best: Option<(usize, (usize, usize))> = None;

        for start in self.bits.iter_ones() {
            if visited[start] {
                continue;
            }
            visited.set(start, true);
            queue.push_back(start);

            let mut size = 0usize;
            let mut span = (usize::MAX, 0usize);
            while let Some(index) = queue.pop_front() {
                let (x, y) = (index % self.width, index / self.width);
                size += 1;
                span = (span.0.min(x), span.1.max(x));

                for ny in y.saturating_sub(1)..=(y + 1).min(self.height - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(self.width - 1) {
                        let neighbour = ny * self.width + nx;
                        if self.bits[neighbour] && !visited[neighbour] {
                            visited.set(neighbour, true);
                            queue.push_back(neighbour);
                        }
                    }
                }
            }

            if best.map_or(true, |(best_size, _)| size > best_size) {
                best = Some((size, span));
            }
        }

        best.map(|(_, span)| span)
    }
}

fn reduce_window(mut window: impl Iterator<Item = bool>, erode: bool) -> bool {
    if erode {
        window.all(|v| v)
    } else {
        window.any(|v| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(width: usize, height: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> BinaryMask {
        BinaryMask::from_fn(width, height, |x, y| x >= x0 && x < x1 && y >= y0 && y < y1)
    }

    #[test]
    fn open_removes_specks() {
        let mut mask = block(40, 40, 10, 10, 30, 30);
        mask.set(2, 2, true);
        let opened = mask.open(5);
        assert!(!opened.get(2, 2));
        assert!(opened.get(20, 20));
        assert_eq!(opened.count_ones(), 400);
    }

    #[test]
    fn close_fills_holes() {
        let mut mask = block(40, 40, 10, 10, 30, 30);
        mask.set(20, 20, false);
        assert!(mask.close(5).get(20, 20));
    }

    #[test]
    fn border_touching_regions_survive_erosion() {
        let mask = block(20, 20, 0, 0, 20, 20);
        assert_eq!(mask.erode(5).count_ones(), 400);
    }

    #[test]
    fn largest_component_wins() {
        let mut mask = block(50, 10, 5, 2, 10, 4);
        for x in 20..45 {
            for y in 5..9 {
                mask.set(x, y, true);
            }
        }
        assert_eq!(mask.largest_component_span(), Some((20, 44)));
        assert_eq!(BinaryMask::new(8, 8).largest_component_span(), None);
    }

    #[test]
    fn diagonal_neighbours_connect() {
        let mut mask = BinaryMask::new(6, 6);
        for i in 0..6 {
            mask.set(i, i, true);
        }
        assert_eq!(mask.largest_component_span(), Some((0, 5)));
    }

    #[test]
    fn column_counts() {
        let mask = block(4, 3, 1, 0, 2, 3);
        assert_eq!(mask.column_counts(), vec![0, 3, 0, 0]);
    }
}
