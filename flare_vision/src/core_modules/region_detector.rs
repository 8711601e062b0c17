// THEORY:
// The region detector is the spatial stage of the fire pipeline. It turns the
// cleaned binary mask into a list of `Region`s, one per sizeable fire-colored
// shape.
//
// Algorithm steps:
// 1.  **Border Following**: Outer borders of the mask's connected shapes are
//     traced (Suzuki-Abe, via `imageproc`). Only top-level outer borders are
//     kept; holes and shapes nested inside holes are ignored, so a flame with a
//     dark core still yields one region. The mask is traced inside a one-pixel
//     empty frame so that shapes touching the image border are still seen as
//     outer borders, then the points are shifted back.
// 2.  **Area Filtering**: Each border is treated as a polygon through its pixel
//     centers and its enclosed area computed with the shoelace formula. Borders
//     whose area does not exceed the configured minimum are discarded. This
//     removes sparkles and reflections that survived morphological cleanup.
//     Note that the polygon area of a solid `w x h` block is `(w-1) * (h-1)`.
// 3.  **Bounding Boxes**: Every surviving border is summarized by its
//     axis-aligned bounding box.
//
// Like the rest of the pipeline the detector is stateless: one mask in, one
// list of regions out.

use crate::core_modules::mask::Mask;
use crate::core_modules::region::Region;
use image::{GrayImage, imageops};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::point::Point;

pub mod region_detector {
    use super::*;

    /// Bounding boxes of every external contour whose area exceeds `min_contour_area`.
    pub fn find_regions(mask: &Mask, min_contour_area: f64) -> Vec<Region> {
        external_contours(mask)
            .iter()
            .filter(|contour| contour_area(&contour.points) > min_contour_area)
            .filter_map(|contour| bounding_region(&contour.points))
            .collect()
    }

    /// Outer borders that are not nested inside any other shape.
    pub fn external_contours(mask: &Mask) -> Vec<Contour<i32>> {
        let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut padded, mask.as_image(), 1, 1);

        find_contours::<i32>(&padded)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .map(|mut contour| {
                for point in contour.points.iter_mut() {
                    *point = Point::new(point.x - 1, point.y - 1);
                }
                contour
            })
            .collect()
    }

    /// Area enclosed by the closed polygon through `points` (shoelace formula).
    pub fn contour_area(points: &[Point<i32>]) -> f64 {
        if points.len() < 3 {
            return 0.0;
        }
        let twice_area: i64 = points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(current, next)| {
                current.x as i64 * next.y as i64 - next.x as i64 * current.y as i64
            })
            .sum();
        twice_area.abs() as f64 / 2.0
    }

    /// Smallest half-open box containing every point.
    pub fn bounding_region(points: &[Point<i32>]) -> Option<Region> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in &points[1..] {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Some(Region::new(
            min_x.max(0) as u32,
            min_y.max(0) as u32,
            (max_x + 1).max(0) as u32,
            (max_y + 1).max(0) as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::region_detector::*;
    use super::*;

    fn paint(mask: &mut Mask, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.set(x, y, true);
            }
        }
    }

    #[test]
    fn shoelace_area_of_a_square() {
        let square = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
        ];
        assert_eq!(contour_area(&square), 16.0);
        assert_eq!(contour_area(&square[..2]), 0.0);
    }

    #[test]
    fn solid_block_yields_one_region_with_exact_bounds() {
        let mut mask = Mask::empty(100, 80);
        paint(&mut mask, 10, 20, 30, 15);
        let regions = find_regions(&mask, 0.0);
        assert_eq!(regions, vec![Region::from_rect(10, 20, 30, 15)]);

        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contour_area(&contours[0].points), (29 * 14) as f64);
    }

    #[test]
    fn small_shapes_are_filtered_by_area() {
        let mut mask = Mask::empty(100, 100);
        paint(&mut mask, 5, 5, 50, 50);
        paint(&mut mask, 70, 70, 6, 6);
        let regions = find_regions(&mask, 100.0);
        assert_eq!(regions, vec![Region::from_rect(5, 5, 50, 50)]);
    }

    #[test]
    fn area_equal_to_the_minimum_is_discarded() {
        let mut mask = Mask::empty(50, 50);
        paint(&mut mask, 10, 10, 11, 11);
        assert!(find_regions(&mask, 100.0).is_empty());
        assert_eq!(find_regions(&mask, 99.0).len(), 1);
    }

    #[test]
    fn holes_and_nested_islands_do_not_produce_regions() {
        let mut mask = Mask::empty(60, 60);
        paint(&mut mask, 10, 10, 40, 40);
        for y in 20..40 {
            for x in 20..40 {
                mask.set(x, y, false);
            }
        }
        paint(&mut mask, 27, 27, 6, 6);

        let regions = find_regions(&mask, 0.0);
        assert_eq!(regions, vec![Region::from_rect(10, 10, 40, 40)]);
    }

    #[test]
    fn shapes_touching_the_border_are_outer_contours() {
        let mut mask = Mask::empty(60, 60);
        paint(&mut mask, 0, 0, 20, 20);
        paint(&mut mask, 40, 40, 15, 15);

        let regions = find_regions(&mask, 0.0);
        assert_eq!(regions.len(), 2);
        assert!(regions.contains(&Region::from_rect(0, 0, 20, 20)));
        assert!(regions.contains(&Region::from_rect(40, 40, 15, 15)));
    }

    #[test]
    fn shape_filling_the_far_edges_keeps_its_extent() {
        let mut mask = Mask::empty(30, 20);
        paint(&mut mask, 10, 5, 20, 15);
        assert_eq!(find_regions(&mask, 0.0), vec![Region::new(10, 5, 30, 20)]);

        let whole = {
            let mut mask = Mask::empty(30, 20);
            paint(&mut mask, 0, 0, 30, 20);
            mask
        };
        let contours = external_contours(&whole);
        assert_eq!(contours.len(), 1);
        assert_eq!(contour_area(&contours[0].points), (29 * 19) as f64);
    }

    #[test]
    fn empty_mask_has_no_regions() {
        assert!(find_regions(&Mask::empty(10, 10), 0.0).is_empty());
        assert_eq!(bounding_region(&[]), None);
    }
}
