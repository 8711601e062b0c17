//! Generated frames for demos and tests.
//!
//! `stub://fire` draws a flame-orange block drifting across a dark scene;
//! `stub://dark` is the dark scene alone. Query parameters `frames`, `width`
//! and `height` override the defaults, e.g. `stub://fire?frames=30&width=320`.

use super::FrameSource;
use crate::core_modules::frame::Frame;
use crate::error::SourceError;

pub const SCHEME: &str = "stub://";
pub const BACKGROUND: [u8; 3] = [20, 20, 30];
pub const FLAME: [u8; 3] = [255, 128, 0];

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FRAMES: u64 = 120;
const BLOCK_WIDTH: u32 = 120;
const BLOCK_HEIGHT: u32 = 90;
const DRIFT_PER_FRAME: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticPattern {
    Fire,
    Dark,
}

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pattern: SyntheticPattern,
    width: u32,
    height: u32,
    /// `None` produces an endless stream.
    frame_count: Option<u64>,
    emitted: u64,
}

impl SyntheticSource {
    pub fn new(pattern: SyntheticPattern, width: u32, height: u32, frame_count: Option<u64>) -> Self {
        Self {
            pattern,
            width,
            height,
            frame_count,
            emitted: 0,
        }
    }

    pub fn from_uri(uri: &str) -> Result<Self, SourceError> {
        let rest = uri
            .strip_prefix(SCHEME)
            .ok_or_else(|| SourceError::Unsupported(uri.to_string()))?;
        let (name, query) = rest.split_once('?').unwrap_or((rest, ""));
        let pattern = match name {
            "fire" => SyntheticPattern::Fire,
            "dark" => SyntheticPattern::Dark,
            other => {
                return Err(SourceError::Unsupported(format!(
                    "unknown synthetic pattern {other:?}"
                )));
            }
        };

        let mut source = Self::new(pattern, DEFAULT_WIDTH, DEFAULT_HEIGHT, Some(DEFAULT_FRAMES));
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let invalid = || SourceError::Unsupported(format!("invalid parameter {pair:?} in {uri}"));
            match key {
                "frames" if value == "inf" => source.frame_count = None,
                "frames" => source.frame_count = Some(value.parse().map_err(|_| invalid())?),
                "width" => source.width = value.parse().map_err(|_| invalid())?,
                "height" => source.height = value.parse().map_err(|_| invalid())?,
                _ => return Err(invalid()),
            }
        }
        Ok(source)
    }

    fn render(&self, index: u64) -> Result<Frame, SourceError> {
        let mut frame = Frame::filled(self.width, self.height, BACKGROUND)?;
        if self.pattern == SyntheticPattern::Fire {
            let travel = self.width.saturating_sub(BLOCK_WIDTH).max(1) as u64;
            let x = (index * DRIFT_PER_FRAME) % travel;
            let y = self.height.saturating_sub(BLOCK_HEIGHT) / 2;
            frame.fill_rect(x as i32, y as i32, BLOCK_WIDTH, BLOCK_HEIGHT, FLAME);
        }
        Ok(frame)
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.frame_count.is_some_and(|count| self.emitted >= count) {
            return Ok(None);
        }
        let frame = self.render(self.emitted)?;
        self.emitted += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<bool, SourceError> {
        self.emitted = 0;
        Ok(true)
    }

    fn describe(&self) -> String {
        let pattern = match self.pattern {
            SyntheticPattern::Fire => "fire",
            SyntheticPattern::Dark => "dark",
        };
        format!("{SCHEME}{pattern} ({}x{})", self.width, self.height)
    }
}
