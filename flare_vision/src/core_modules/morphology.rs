// THEORY:
// Raw color thresholding is noisy at pixel granularity: sensor noise, specular
// highlights and compression artifacts all produce isolated "fire" pixels.
// Binary morphology removes them without per-pixel tuning.
//
// - **Erosion** keeps a pixel only if every pixel under the structuring element
//   is set. Thin or tiny clusters vanish.
// - **Dilation** sets a pixel if any pixel under the element is set. Surviving
//   regions grow back and small gaps close.
// - **Opening** is erosion followed by dilation, each repeated `iterations`
//   times: isolated specks are removed, larger shapes come back at roughly
//   their original extent.
//
// Border policy: samples outside the image never influence the result. Erosion
// treats them as set and dilation treats them as unset, so shapes touching the
// border are neither eaten away nor grown from outside. `imageproc`'s grayscale
// operators reduce over in-bounds samples only, which on a 0/255 mask is
// exactly this policy.

use crate::core_modules::mask::{Mask, SET, UNSET};
use image::{GrayImage, Luma};
use imageproc::morphology::{self as ops, Mask as Kernel};

// `imageproc` kernels are limited to 511 pixels per side.
const MAX_SIDE: u32 = 511;

/// A binary kernel, stored as the offsets of its set cells relative to the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    width: u32,
    height: u32,
    offsets: Vec<(i32, i32)>,
    kernel: Kernel,
}

impl StructuringElement {
    /// An ellipse inscribed in a `width x height` box, anchored at its center.
    /// Sides are clamped to `1..=511`.
    ///
    /// For 5x5 this is the familiar shape:
    /// ```text
    /// . . # . .
    /// # # # # #
    /// # # # # #
    /// # # # # #
    /// . . # . .
    /// ```
    pub fn ellipse(width: u32, height: u32) -> Self {
        let width = width.clamp(1, MAX_SIDE);
        let height = height.clamp(1, MAX_SIDE);
        let radius_y = (height / 2) as i32;
        let radius_x = (width / 2) as i32;
        let inverse_r2 = if radius_y > 0 {
            1.0 / (radius_y * radius_y) as f64
        } else {
            0.0
        };

        let mut offsets = Vec::new();
        for row in 0..height as i32 {
            let dy = row - radius_y;
            if dy.abs() > radius_y {
                continue;
            }
            let dx = (radius_x as f64
                * (((radius_y * radius_y - dy * dy) as f64) * inverse_r2).sqrt())
            .round() as i32;
            let first = (radius_x - dx).max(0);
            let last = (radius_x + dx + 1).min(width as i32);
            for column in first..last {
                offsets.push((column - radius_x, dy));
            }
        }

        let cells = GrayImage::from_fn(width, height, |x, y| {
            let cell = (x as i32 - radius_x, y as i32 - radius_y);
            Luma([if offsets.contains(&cell) { SET } else { UNSET }])
        });
        let kernel = Kernel::from_image(&cells, radius_x as u8, radius_y as u8);

        Self {
            width,
            height,
            offsets,
            kernel,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }

    pub fn contains(&self, dx: i32, dy: i32) -> bool {
        self.offsets.contains(&(dx, dy))
    }
}

fn repeat(
    mask: &Mask,
    iterations: u32,
    operation: impl Fn(&GrayImage) -> GrayImage,
) -> Mask {
    let mut image = mask.as_image().clone();
    for _ in 0..iterations {
        image = operation(&image);
    }
    Mask::from_gray(image)
}

pub fn erode(mask: &Mask, element: &StructuringElement, iterations: u32) -> Mask {
    repeat(mask, iterations, |image| ops::grayscale_erode(image, &element.kernel))
}

pub fn dilate(mask: &Mask, element: &StructuringElement, iterations: u32) -> Mask {
    repeat(mask, iterations, |image| ops::grayscale_dilate(image, &element.kernel))
}

/// Erodes `iterations` times, then dilates `iterations` times.
pub fn open(mask: &Mask, element: &StructuringElement, iterations: u32) -> Mask {
    dilate(&erode(mask, element, iterations), element, iterations)
}
