// THEORY:
// The `Frame` is the unit of data that flows through the whole engine: one
// 3-channel, 8-bit raster as delivered by a camera, a codec, or an image file.
//
// Key architectural principles:
// 1.  **One Internal Layout**: Capture pipelines disagree on channel order
//     (OpenCV and most codecs hand out blue-green-red, image files decode to
//     red-green-blue). A `Frame` always stores RGB internally; the order of the
//     incoming bytes is declared once, at construction, through `ChannelOrder`.
// 2.  **Never Empty**: Every constructor rejects zero-sized rasters and buffers
//     whose length does not match `width * height * 3`. Downstream stages can
//     therefore index pixels without re-checking.
// 3.  **Stretch Normalization**: `resized` maps any source size onto the
//     configured analysis size, ignoring aspect ratio. Every output pixel
//     samples the 2x2 source neighbourhood around its mapped center, with no
//     area averaging when shrinking. A frame that is already the right size is
//     passed through untouched, so resizing is idempotent.

use crate::error::AnalyzerError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops;
use image::{DynamicImage, ExtendedColorType, ImageError, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;

/// Number of samples per pixel.
pub const CHANNELS: usize = 3;

/// Byte order of a raw pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Blue, green, red. The native order of OpenCV captures.
    Bgr,
    /// Red, green, blue.
    Rgb,
}

/// A non-empty 3-channel 8-bit raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Builds a frame from a raw interleaved buffer in the given channel order.
    pub fn from_bytes(
        width: u32,
        height: u32,
        mut data: Vec<u8>,
        order: ChannelOrder,
    ) -> Result<Self, AnalyzerError> {
        if width == 0 || height == 0 {
            return Err(AnalyzerError::InvalidFrame(format!(
                "frame has no pixels ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(AnalyzerError::InvalidFrame(format!(
                "expected {expected} bytes for a {width}x{height} 3-channel frame, got {}",
                data.len()
            )));
        }

        if order == ChannelOrder::Bgr {
            for pixel in data.chunks_exact_mut(CHANNELS) {
                pixel.swap(0, 2);
            }
        }

        let image = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            AnalyzerError::InvalidFrame("buffer does not fit frame dimensions".to_string())
        })?;
        Ok(Self { image })
    }

    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> Result<Self, AnalyzerError> {
        Self::from_bytes(width, height, data, ChannelOrder::Bgr)
    }

    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, AnalyzerError> {
        Self::from_bytes(width, height, data, ChannelOrder::Rgb)
    }

    pub fn from_rgb_image(image: RgbImage) -> Result<Self, AnalyzerError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AnalyzerError::InvalidFrame(format!(
                "frame has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }
        Ok(Self { image })
    }

    /// Converts any decoded image (gray, RGBA, 16-bit...) to an 8-bit RGB frame.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, AnalyzerError> {
        Self::from_rgb_image(image.to_rgb8())
    }

    /// A frame of a single solid color.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Result<Self, AnalyzerError> {
        Self::from_rgb_image(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// RGB samples at `(x, y)`. Panics when out of bounds, like `image`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    /// Paints a solid RGB rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: [u8; 3]) {
        if width == 0 || height == 0 {
            return;
        }
        draw_filled_rect_mut(
            &mut self.image,
            Rect::at(x, y).of_size(width, height),
            Rgb(color),
        );
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Interleaved BGR bytes, for handing frames back to OpenCV-style consumers.
    pub fn to_bgr_bytes(&self) -> Vec<u8> {
        let mut data = self.image.as_raw().clone();
        for pixel in data.chunks_exact_mut(CHANNELS) {
            pixel.swap(0, 2);
        }
        data
    }

    /// Stretches the frame to `width x height` with bilinear filtering.
    /// Returns an identical copy when the frame already has that size.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        let scale_x = self.width() as f32 / width as f32;
        let scale_y = self.height() as f32 / height as f32;
        let max_x = (self.width() - 1) as f32;
        let max_y = (self.height() - 1) as f32;
        let image = RgbImage::from_fn(width, height, |x, y| {
            let source_x = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, max_x);
            let source_y = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, max_y);
            imageops::interpolate_bilinear(&self.image, source_x, source_y).unwrap_or(Rgb([0, 0, 0]))
        });
        Frame { image }
    }

    /// Writes the frame to disk; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        self.image.save(path)
    }

    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, ImageError> {
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        encoder.encode(
            self.image.as_raw(),
            self.width(),
            self.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_bytes_are_stored_as_rgb() {
        let frame = Frame::from_bgr(2, 1, vec![0, 0, 255, 255, 0, 0]).unwrap();
        assert_eq!(frame.pixel(0, 0), [255, 0, 0]);
        assert_eq!(frame.pixel(1, 0), [0, 0, 255]);
        assert_eq!(frame.to_bgr_bytes(), vec![0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn rejects_empty_and_mismatched_buffers() {
        assert!(matches!(
            Frame::from_rgb(0, 10, Vec::new()),
            Err(AnalyzerError::InvalidFrame(_))
        ));
        assert!(matches!(
            Frame::from_rgb(2, 2, vec![0; 11]),
            Err(AnalyzerError::InvalidFrame(_))
        ));
        // A 4-channel buffer of the right pixel count is still the wrong size.
        assert!(matches!(
            Frame::from_bgr(2, 2, vec![0; 16]),
            Err(AnalyzerError::InvalidFrame(_))
        ));
    }

    #[test]
    fn resize_stretches_and_is_idempotent_at_target_size() {
        let frame = Frame::filled(320, 100, [10, 20, 30]).unwrap();
        let stretched = frame.resized(640, 480);
        assert_eq!(stretched.dimensions(), (640, 480));
        assert_eq!(stretched.pixel(639, 479), [10, 20, 30]);

        let again = stretched.resized(640, 480);
        assert_eq!(again, stretched);
    }

    #[test]
    fn shrinking_samples_neighbours_instead_of_averaging_areas() {
        let gray = |v: u8| [v, v, v];
        let mut row = Vec::new();
        for v in [0u8, 100, 200, 40] {
            row.extend_from_slice(&gray(v));
        }
        let frame = Frame::from_rgb(4, 1, row).unwrap();
        let shrunk = frame.resized(2, 1);
        assert_eq!(shrunk.pixel(0, 0), gray(50));
        assert_eq!(shrunk.pixel(1, 0), gray(120));

        let pair = Frame::from_rgb(2, 1, [gray(0), gray(100)].concat()).unwrap();
        let grown = pair.resized(4, 1);
        let samples: Vec<u8> = (0..4).map(|x| grown.pixel(x, 0)[0]).collect();
        assert_eq!(samples, vec![0, 25, 75, 100]);
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut frame = Frame::filled(10, 10, [0, 0, 0]).unwrap();
        frame.fill_rect(8, 8, 5, 5, [255, 128, 0]);
        assert_eq!(frame.pixel(9, 9), [255, 128, 0]);
        assert_eq!(frame.pixel(7, 7), [0, 0, 0]);
    }

    #[test]
    fn jpeg_encoding_produces_a_jpeg_stream() {
        let frame = Frame::filled(16, 16, [200, 100, 0]).unwrap();
        let bytes = frame.encode_jpeg(80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
