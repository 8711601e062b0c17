//! OpenCV `VideoCapture` as a frame source: video files and local cameras.
//!
//! Any URI that is not a stub or a directory ends up here when the `opencv`
//! feature is enabled. A video file that does not exist falls back to the
//! default camera, so a missing clip still gives a live feed.

use crate::core_modules::frame::Frame;
use crate::error::SourceError;
use crate::source::FrameSource;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_POS_FRAMES},
};
use std::path::Path;
use tracing::{info, warn};

pub const CAMERA_SCHEME: &str = "camera://";
const DEFAULT_CAMERA: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    File(String),
    Camera(i32),
}

impl CaptureTarget {
    /// `camera://<index>` selects a camera; anything else is a file path.
    pub fn parse(uri: &str) -> Result<Self, SourceError> {
        match uri.strip_prefix(CAMERA_SCHEME) {
            Some("") => Ok(Self::Camera(DEFAULT_CAMERA)),
            Some(index) => index
                .parse()
                .map(Self::Camera)
                .map_err(|_| SourceError::Unsupported(format!("invalid camera index in {uri}"))),
            None => Ok(Self::File(uri.to_string())),
        }
    }
}

pub struct VideoCaptureSource {
    capture: VideoCapture,
    target: CaptureTarget,
    frame: Mat,
}

impl VideoCaptureSource {
    /// Opens `uri`. A file that does not exist falls back to the default camera.
    pub fn open(uri: &str) -> Result<Self, SourceError> {
        let target = match CaptureTarget::parse(uri)? {
            CaptureTarget::File(path) if !Path::new(&path).exists() => {
                warn!(path = %path, "video file not found; falling back to camera {DEFAULT_CAMERA}");
                CaptureTarget::Camera(DEFAULT_CAMERA)
            }
            target => target,
        };
        let capture = match &target {
            CaptureTarget::File(path) => VideoCapture::from_file(path, CAP_ANY),
            CaptureTarget::Camera(index) => VideoCapture::new(*index, CAP_ANY),
        }
        .map_err(backend)?;

        if !capture.is_opened().map_err(backend)? {
            return Err(SourceError::Backend(format!("could not open {target:?}")));
        }
        let backend_name = capture.get_backend_name().unwrap_or_default();
        info!(?target, backend = %backend_name, "capture opened");
        Ok(Self {
            capture,
            target,
            frame: Mat::default(),
        })
    }
}

fn backend(err: opencv::Error) -> SourceError {
    SourceError::Backend(err.to_string())
}

impl FrameSource for VideoCaptureSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if !self.capture.read(&mut self.frame).map_err(backend)? || self.frame.empty() {
            return Ok(None);
        }
        if self.frame.channels() != 3 {
            return Err(SourceError::Backend(format!(
                "expected a 3-channel capture, got {} channels",
                self.frame.channels()
            )));
        }
        let (width, height) = (self.frame.cols() as u32, self.frame.rows() as u32);
        let bytes = if self.frame.is_continuous() {
            self.frame.data_bytes().map_err(backend)?.to_vec()
        } else {
            self.frame.try_clone().map_err(backend)?.data_bytes().map_err(backend)?.to_vec()
        };
        Ok(Some(Frame::from_bgr(width, height, bytes)?))
    }

    fn rewind(&mut self) -> Result<bool, SourceError> {
        match self.target {
            CaptureTarget::File(_) => self.capture.set(CAP_PROP_POS_FRAMES, 0.0).map_err(backend),
            CaptureTarget::Camera(_) => Ok(false),
        }
    }

    fn describe(&self) -> String {
        match &self.target {
            CaptureTarget::File(path) => format!("video {path}"),
            CaptureTarget::Camera(index) => format!("{CAMERA_SCHEME}{index}"),
        }
    }
}
