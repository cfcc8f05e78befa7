use crate::error::DataError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Packed RGB24 image, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DataError> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize * 3 {
            return Err(DataError::InvalidFrame {
                width,
                height,
                actual_width: width,
                actual_height: height,
                actual_len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&[color.0, color.1, color.2]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Paints the half-open rectangle `[x0, x1) x [y0, y1)`, clipped to the frame.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let index = self.index(x, y);
                self.data[index..index + 3].copy_from_slice(&[color.0, color.1, color.2]);
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let index = self.index(x, y);
        Rgb(self.data[index], self.data[index + 1], self.data[index + 2])
    }

    /// Row `y` as packed RGB bytes.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width as usize * 3;
        &self.data[start..start + self.width as usize * 3]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }
}
