// THEORY:
// The `analyzer` module is the top-level API of the fire detection engine. It
// sequences the core modules into one call that turns a raw frame into an
// annotated frame plus a binary "fire active" flag.
//
// Stages:
// 1. Normalize size (stretch to the configured raster).
// 2. Convert to HSV and threshold against the fire band.
// 3. Clean the mask: opening with a 5x5 ellipse, 2 iterations, then one
//    extra dilation to win back area lost to the opening.
// 4. Decide: active iff the cleaned mask holds more than `pixel_threshold`
//    set pixels. The decision is global and ignores region geometry.
// 5. Only when active: trace external contours, keep those larger than
//    `min_contour_area`, and draw the union of their boxes.
//
// An active frame whose contours are all too small is reported active with no
// rectangle drawn. Region filtering affects the drawing only, never the flag.
//
// The analyzer holds nothing but its validated configuration, so it is
// re-entrant and can be shared freely between threads.

use crate::core_modules::annotate::{FIRE_OUTLINE, OUTLINE_THICKNESS, draw_region};
use crate::core_modules::frame::Frame;
use crate::core_modules::hsv::{HsvPixel, HsvRange};
use crate::core_modules::mask::Mask;
use crate::core_modules::morphology::{self, StructuringElement};
use crate::core_modules::region::Region;
use crate::core_modules::region_detector::region_detector;
use crate::error::AnalyzerError;
use tracing::debug;

pub const DEFAULT_TARGET_WIDTH: u32 = 640;
pub const DEFAULT_TARGET_HEIGHT: u32 = 480;
pub const DEFAULT_LOWER_BOUND: HsvPixel = HsvPixel::new(0, 120, 150);
pub const DEFAULT_UPPER_BOUND: HsvPixel = HsvPixel::new(35, 255, 255);
pub const DEFAULT_PIXEL_THRESHOLD: usize = 5000;
pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 2000.0;

const KERNEL_SIZE: u32 = 5;
const OPENING_ITERATIONS: u32 = 2;
const GROWTH_ITERATIONS: u32 = 1;

/// Tunables for the analyzer. Validated once by `FrameAnalyzer::new`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Width of the analysis (and output) raster.
    pub target_width: u32,
    /// Height of the analysis (and output) raster.
    pub target_height: u32,
    /// Inclusive lower HSV bound of the fire band.
    pub lower_bound: HsvPixel,
    /// Inclusive upper HSV bound of the fire band.
    pub upper_bound: HsvPixel,
    /// The frame is active when the cleaned mask has strictly more set pixels than this.
    pub pixel_threshold: usize,
    /// Contours enclosing this area or less are not drawn.
    pub min_contour_area: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            lower_bound: DEFAULT_LOWER_BOUND,
            upper_bound: DEFAULT_UPPER_BOUND,
            pixel_threshold: DEFAULT_PIXEL_THRESHOLD,
            min_contour_area: DEFAULT_MIN_CONTOUR_AREA,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<HsvRange, AnalyzerError> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(AnalyzerError::Configuration(format!(
                "target size must be non-zero, got {}x{}",
                self.target_width, self.target_height
            )));
        }
        if !self.min_contour_area.is_finite() || self.min_contour_area < 0.0 {
            return Err(AnalyzerError::Configuration(format!(
                "min_contour_area must be a finite number >= 0, got {}",
                self.min_contour_area
            )));
        }
        HsvRange::new(self.lower_bound, self.upper_bound)
    }
}

/// The result of analyzing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// The resized frame, with the union rectangle drawn when one exists.
    pub annotated: Frame,
    /// Whether the fire pixel count exceeded the threshold.
    pub is_active: bool,
    /// Set pixels in the cleaned mask.
    pub fire_pixels: usize,
    /// Boxes of the contours that passed the area filter. Empty when inactive.
    pub regions: Vec<Region>,
    /// The drawn rectangle, if any.
    pub union: Option<Region>,
}

/// Stateless per-frame fire detector.
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    config: AnalyzerConfig,
    range: HsvRange,
    element: StructuringElement,
}

impl FrameAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let range = config.validate()?;
        Ok(Self {
            config,
            range,
            element: StructuringElement::ellipse(KERNEL_SIZE, KERNEL_SIZE),
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, frame: &Frame) -> Result<Analysis, AnalyzerError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(AnalyzerError::InvalidFrame("frame has no pixels".to_string()));
        }

        let mut annotated = frame.resized(self.config.target_width, self.config.target_height);
        let mask = self.fire_mask_of_resized(&annotated);

        let fire_pixels = mask.count_nonzero();
        let is_active = fire_pixels > self.config.pixel_threshold;

        let mut regions = Vec::new();
        let mut union = None;
        if is_active {
            regions = region_detector::find_regions(&mask, self.config.min_contour_area);
            union = Region::union_all(&regions);
            if let Some(region) = &union {
                draw_region(&mut annotated, region, FIRE_OUTLINE, OUTLINE_THICKNESS);
            }
        }

        debug!(
            fire_pixels,
            is_active,
            regions = regions.len(),
            "analyzed frame"
        );

        Ok(Analysis {
            annotated,
            is_active,
            fire_pixels,
            regions,
            union,
        })
    }

    /// Analyzes the next item of a stream, where `None` marks the end of the stream.
    pub fn analyze_next(&self, frame: Option<&Frame>) -> Result<Analysis, AnalyzerError> {
        match frame {
            Some(frame) => self.analyze(frame),
            None => Err(AnalyzerError::InvalidFrame(
                "no frame available (end of stream)".to_string(),
            )),
        }
    }

    /// The cleaned fire mask of `frame` after resizing, without the activation decision.
    pub fn fire_mask(&self, frame: &Frame) -> Mask {
        let resized = frame.resized(self.config.target_width, self.config.target_height);
        self.fire_mask_of_resized(&resized)
    }

    fn fire_mask_of_resized(&self, frame: &Frame) -> Mask {
        let raw = Mask::threshold(frame, &self.range);
        let opened = morphology::open(&raw, &self.element, OPENING_ITERATIONS);
        morphology::dilate(&opened, &self.element, GROWTH_ITERATIONS)
    }
}

/// One-shot analysis: validates `config`, then analyzes `frame` with it.
///
/// Callers processing a stream should build a `FrameAnalyzer` once instead.
pub fn analyze(frame: &Frame, config: &AnalyzerConfig) -> Result<Analysis, AnalyzerError> {
    FrameAnalyzer::new(config.clone())?.analyze(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_the_tuned_constants() {
        let config = AnalyzerConfig::default();
        assert_eq!((config.target_width, config.target_height), (640, 480));
        assert_eq!(config.lower_bound.as_array(), [0, 120, 150]);
        assert_eq!(config.upper_bound.as_array(), [35, 255, 255]);
        assert_eq!(config.pixel_threshold, 5000);
        assert_eq!(config.min_contour_area, 2000.0);
        assert!(FrameAnalyzer::new(config).is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected_at_construction() {
        let zero_size = AnalyzerConfig {
            target_width: 0,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            FrameAnalyzer::new(zero_size),
            Err(AnalyzerError::Configuration(_))
        ));

        let inverted = AnalyzerConfig {
            lower_bound: HsvPixel::new(40, 120, 150),
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            FrameAnalyzer::new(inverted),
            Err(AnalyzerError::Configuration(_))
        ));

        let negative_area = AnalyzerConfig {
            min_contour_area: -1.0,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            FrameAnalyzer::new(negative_area),
            Err(AnalyzerError::Configuration(_))
        ));
    }

    #[test]
    fn end_of_stream_is_an_invalid_frame() {
        let analyzer = FrameAnalyzer::new(AnalyzerConfig::default()).unwrap();
        assert!(matches!(
            analyzer.analyze_next(None),
            Err(AnalyzerError::InvalidFrame(_))
        ));
    }

    #[test]
    fn small_frames_are_stretched_to_the_target_size() {
        let analyzer = FrameAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let frame = Frame::filled(160, 90, [0, 0, 0]).unwrap();
        let analysis = analyzer.analyze(&frame).unwrap();
        assert_eq!(analysis.annotated.dimensions(), (640, 480));
        assert!(!analysis.is_active);
        assert_eq!(analysis.fire_pixels, 0);
    }

    #[test]
    fn one_shot_analysis_matches_the_analyzer() {
        let config = AnalyzerConfig {
            target_width: 160,
            target_height: 120,
            pixel_threshold: 500,
            min_contour_area: 200.0,
            ..AnalyzerConfig::default()
        };
        let mut frame = Frame::filled(160, 120, [0, 0, 0]).unwrap();
        frame.fill_rect(40, 30, 60, 40, [255, 128, 0]);

        let one_shot = analyze(&frame, &config).unwrap();
        let reused = FrameAnalyzer::new(config).unwrap().analyze(&frame).unwrap();
        assert!(one_shot.is_active);
        assert_eq!(one_shot, reused);

        let invalid = AnalyzerConfig {
            target_height: 0,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            analyze(&frame, &invalid),
            Err(AnalyzerError::Configuration(_))
        ));
    }
}
