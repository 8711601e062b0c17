pub mod annotate;
pub mod frame;
pub mod hsv;
pub mod mask;
pub mod morphology;
pub mod region;
pub mod region_detector;
