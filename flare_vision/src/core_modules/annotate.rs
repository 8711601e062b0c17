use crate::core_modules::frame::Frame;
use crate::core_modules::region::Region;
use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Outline color for detected fire.
pub const FIRE_OUTLINE: [u8; 3] = [255, 0, 0];
pub const OUTLINE_THICKNESS: u32 = 2;

/// Draws `region` as a hollow rectangle with the stroke centred on its edges.
///
/// The center line passes through both corner pixels `(x1, y1)` and
/// `(x2, y2)`, so a half-open region is framed one pixel outside its right and
/// bottom edges. An even stroke puts its extra pixel on the outside. Parts
/// beyond the frame are clipped.
pub fn draw_region(frame: &mut Frame, region: &Region, color: [u8; 3], thickness: u32) {
    let canvas = frame.image_mut();
    let thickness = thickness as i64;
    let outermost = -(thickness / 2);
    for inset in outermost..outermost + thickness {
        let width = region.width() as i64 + 1 - 2 * inset;
        let height = region.height() as i64 + 1 - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at((region.x1 as i64 + inset) as i32, (region.y1 as i64 + inset) as i32)
            .of_size(width as u32, height as u32);
        draw_hollow_rect_mut(canvas, rect, Rgb(color));
    }
}
