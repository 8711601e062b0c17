use flare_vision::{AnalyzerConfig, Frame, FrameAnalyzer, Region, analyze};

const BLACK: [u8; 3] = [0, 0, 0];
const FLAME: [u8; 3] = [255, 128, 0];
const OUTLINE: [u8; 3] = [255, 0, 0];

fn default_analyzer() -> FrameAnalyzer {
    FrameAnalyzer::new(AnalyzerConfig::default()).unwrap()
}

/// A 640x480 black frame with flame-colored blocks given as `(x1, y1, x2, y2)`, end exclusive.
fn scene(blocks: &[(u32, u32, u32, u32)]) -> Frame {
    let mut frame = Frame::filled(640, 480, BLACK).unwrap();
    for &(x1, y1, x2, y2) in blocks {
        frame.fill_rect(x1 as i32, y1 as i32, x2 - x1, y2 - y1, FLAME);
    }
    frame
}

#[test]
fn black_frame_is_inactive_and_left_untouched() {
    let frame = scene(&[]);
    let analysis = default_analyzer().analyze(&frame).unwrap();

    assert!(!analysis.is_active);
    assert_eq!(analysis.fire_pixels, 0);
    assert!(analysis.regions.is_empty());
    assert_eq!(analysis.union, None);
    assert_eq!(analysis.annotated, frame);
}

#[test]
fn output_always_has_the_target_size() {
    let analyzer = default_analyzer();
    let small = Frame::filled(320, 240, BLACK).unwrap();
    let first = analyzer.analyze(&small).unwrap();
    assert_eq!(first.annotated.dimensions(), (640, 480));

    let second = analyzer.analyze(&first.annotated).unwrap();
    assert_eq!(second.annotated.dimensions(), (640, 480));
    assert_eq!(second.annotated, first.annotated);
}

#[test]
fn single_block_is_outlined_just_outside_its_edges() {
    let analysis = default_analyzer().analyze(&scene(&[(100, 100, 200, 200)])).unwrap();

    assert!(analysis.is_active);
    assert_eq!(analysis.regions.len(), 1);
    assert_eq!(analysis.union, Some(Region::new(98, 98, 202, 202)));

    let out = &analysis.annotated;
    assert_eq!(out.pixel(98, 98), OUTLINE);
    assert_eq!(out.pixel(97, 97), OUTLINE);
    assert_eq!(out.pixel(202, 202), OUTLINE);
    assert_eq!(out.pixel(203, 203), OUTLINE);
    assert_eq!(out.pixel(150, 97), OUTLINE);
    assert_eq!(out.pixel(150, 98), OUTLINE);
    assert_eq!(out.pixel(99, 150), BLACK);
    assert_eq!(out.pixel(96, 150), BLACK);
    assert_eq!(out.pixel(150, 150), FLAME);
    assert_eq!(out.pixel(300, 300), BLACK);
}

#[test]
fn separate_blocks_share_one_enclosing_rectangle() {
    let analysis = default_analyzer()
        .analyze(&scene(&[(100, 100, 200, 200), (400, 300, 500, 400)]))
        .unwrap();

    assert!(analysis.is_active);
    assert_eq!(analysis.regions.len(), 2);
    assert_eq!(analysis.union, Some(Region::new(98, 98, 502, 402)));

    let out = &analysis.annotated;
    assert_eq!(out.pixel(300, 98), OUTLINE);
    assert_eq!(out.pixel(502, 250), OUTLINE);
    // The gap between the blocks is inside the rectangle but not drawn on.
    assert_eq!(out.pixel(300, 250), BLACK);
}

#[test]
fn fire_against_the_left_edge_is_outlined() {
    let analysis = default_analyzer().analyze(&scene(&[(0, 100, 150, 250)])).unwrap();

    assert!(analysis.is_active);
    assert_eq!(analysis.regions.len(), 1);
    assert_eq!(analysis.union, Some(Region::new(0, 98, 152, 252)));
    assert_eq!(analysis.annotated.pixel(0, 175), OUTLINE);
    assert_eq!(analysis.annotated.pixel(75, 98), OUTLINE);
}

#[test]
fn fire_in_the_corners_is_outlined() {
    let top_left = default_analyzer().analyze(&scene(&[(0, 0, 120, 120)])).unwrap();
    assert!(top_left.is_active);
    assert_eq!(top_left.union, Some(Region::new(0, 0, 122, 122)));
    assert_eq!(top_left.annotated.pixel(0, 0), OUTLINE);

    let bottom_right = default_analyzer().analyze(&scene(&[(540, 400, 640, 480)])).unwrap();
    assert!(bottom_right.is_active);
    assert_eq!(bottom_right.union, Some(Region::new(538, 398, 640, 480)));
    assert_eq!(bottom_right.annotated.pixel(538, 440), OUTLINE);

    let both = default_analyzer()
        .analyze(&scene(&[(0, 0, 120, 120), (540, 400, 640, 480)]))
        .unwrap();
    assert_eq!(both.regions.len(), 2);
    assert_eq!(both.union, Some(Region::new(0, 0, 640, 480)));
}

#[test]
fn one_shot_analysis_validates_and_analyzes() {
    let frame = scene(&[(100, 100, 200, 200)]);
    let analysis = analyze(&frame, &AnalyzerConfig::default()).unwrap();
    assert_eq!(analysis, default_analyzer().analyze(&frame).unwrap());

    let unusable = AnalyzerConfig {
        min_contour_area: f64::NAN,
        ..AnalyzerConfig::default()
    };
    assert!(analyze(&frame, &unusable).is_err());
}

#[test]
fn small_fire_is_active_without_a_rectangle() {
    let config = AnalyzerConfig {
        pixel_threshold: 800,
        min_contour_area: 2000.0,
        ..AnalyzerConfig::default()
    };
    let frame = scene(&[(300, 200, 330, 230)]);
    let analysis = FrameAnalyzer::new(config).unwrap().analyze(&frame).unwrap();

    assert!(analysis.is_active);
    assert!(analysis.regions.is_empty());
    assert_eq!(analysis.union, None);
    assert_eq!(analysis.annotated, frame);
}

#[test]
fn raising_the_pixel_threshold_never_activates_a_frame() {
    let frame = scene(&[(200, 150, 260, 210)]);
    let flags: Vec<bool> = [0, 1000, 3000, 4000, 5000, 20000]
        .into_iter()
        .map(|pixel_threshold| {
            let config = AnalyzerConfig {
                pixel_threshold,
                ..AnalyzerConfig::default()
            };
            FrameAnalyzer::new(config).unwrap().analyze(&frame).unwrap().is_active
        })
        .collect();

    assert!(flags[0]);
    assert!(!flags[flags.len() - 1]);
    assert!(flags.windows(2).all(|pair| pair[0] || !pair[1]));
}

#[test]
fn bgr_input_is_read_as_bgr() {
    let (width, height) = (640u32, 480u32);
    let mut bytes = vec![0u8; (width * height * 3) as usize];
    for y in 100..200 {
        for x in 100..200 {
            let at = ((y * width + x) * 3) as usize;
            bytes[at..at + 3].copy_from_slice(&[0, 128, 255]);
        }
    }
    let frame = Frame::from_bgr(width, height, bytes).unwrap();
    let analysis = default_analyzer().analyze(&frame).unwrap();
    assert!(analysis.is_active);
    assert_eq!(analysis.union, Some(Region::new(98, 98, 202, 202)));
}

#[test]
fn analysis_is_deterministic() {
    let analyzer = default_analyzer();
    let frame = scene(&[(50, 60, 170, 150), (420, 310, 530, 400)]);
    assert_eq!(analyzer.analyze(&frame).unwrap(), analyzer.analyze(&frame).unwrap());
}
