use crate::detect::frame::RgbFrame;
use crate::detect::mask::BinaryMask;

/// HSV saturation and value on the 0..=255 scale.
fn saturation_value(r: u8, g: u8, b: u8) -> (u8, u8) {
    let value = r.max(g).max(b);
    let min = r.min(g).min(b);
    if value == 0 {
        return (0, 0);
    }
    let saturation = ((value - min) as f32 * 255.0 / value as f32).round() as u8;
    (saturation, value)
}

/// Low-saturation, bright pixels (concrete, asphalt, paving) of the rows from
/// `top` down.
pub(crate) fn surface_mask(
    frame: &RgbFrame,
    top: usize,
    max_saturation: u8,
    min_value: u8,
) -> BinaryMask {
    let width = frame.width() as usize;
    let height = frame.height() as usize - top;
    BinaryMask::from_fn(width, height, |x, y| {
        let row = frame.row((top + y) as u32);
        let (saturation, value) = saturation_value(row[x * 3], row[x * 3 + 1], row[x * 3 + 2]);
        saturation <= max_saturation && value >= min_value
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grays_are_unsaturated() {
        assert_eq!(saturation_value(170, 170, 170), (0, 170));
        assert_eq!(saturation_value(0, 160, 0), (255, 160));
        assert_eq!(saturation_value(0, 0, 0), (0, 0));
        assert_eq!(saturation_value(200, 100, 100), (128, 200));
    }
}
