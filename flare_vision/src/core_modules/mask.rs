// THEORY:
// A `Mask` is the binary answer to "is this pixel fire-colored?" for every
// pixel of a frame. It is stored as a single-channel 8-bit image holding only
// 0 (unset) or 255 (set), which is the layout contour tracing expects.
//
// The mask is the hinge of the pipeline: thresholding produces it, morphology
// rewrites it, the activation decision counts it, and region extraction
// traces it.

use crate::core_modules::frame::Frame;
use crate::core_modules::hsv::{HsvPixel, HsvRange};
use image::{GrayImage, Luma};

pub const SET: u8 = 255;
pub const UNSET: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// Marks every pixel whose HSV value falls inside `range`.
    pub fn threshold(frame: &Frame, range: &HsvRange) -> Self {
        let source = frame.as_image();
        let image = GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            let [red, green, blue] = source.get_pixel(x, y).0;
            let set = range.contains(HsvPixel::from_rgb(red, green, blue));
            Luma([if set { SET } else { UNSET }])
        });
        Self { image }
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Wraps an existing single-channel image; any non-zero sample counts as set.
    pub fn from_gray(mut image: GrayImage) -> Self {
        for sample in image.iter_mut() {
            if *sample != UNSET {
                *sample = SET;
            }
        }
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != UNSET
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        self.image
            .put_pixel(x, y, Luma([if value { SET } else { UNSET }]));
    }

    pub fn count_nonzero(&self) -> usize {
        self.image.iter().filter(|sample| **sample != UNSET).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_range() -> HsvRange {
        HsvRange::new(HsvPixel::new(0, 120, 150), HsvPixel::new(35, 255, 255)).unwrap()
    }

    #[test]
    fn black_frame_produces_an_empty_mask() {
        let frame = Frame::filled(32, 24, [0, 0, 0]).unwrap();
        let mask = Mask::threshold(&frame, &fire_range());
        assert_eq!(mask.count_nonzero(), 0);
    }

    #[test]
    fn only_fire_colored_pixels_are_set() {
        let mut frame = Frame::filled(20, 20, [0, 0, 0]).unwrap();
        frame.fill_rect(5, 5, 4, 3, [255, 128, 0]);
        // Blue is bright and saturated but outside the hue band.
        frame.fill_rect(12, 12, 2, 2, [0, 0, 255]);

        let mask = Mask::threshold(&frame, &fire_range());
        assert_eq!(mask.count_nonzero(), 12);
        assert!(mask.is_set(5, 5));
        assert!(!mask.is_set(12, 12));
    }

    #[test]
    fn from_gray_normalizes_samples() {
        let mut gray = GrayImage::new(3, 1);
        gray.put_pixel(1, 0, Luma([7]));
        let mask = Mask::from_gray(gray);
        assert_eq!(mask.as_image().get_pixel(1, 0)[0], SET);
        assert_eq!(mask.count_nonzero(), 1);
    }
}
