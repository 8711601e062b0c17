//! Frame acquisition.
//!
//! A `FrameSource` hands out frames one at a time and signals the end of the
//! stream with `Ok(None)`. Sources know nothing about detection: looping at
//! end of stream is an adapter (`LoopingSource`) and analysis happens in the
//! caller, one frame at a time.
//!
//! Built-in sources:
//! - `stub://fire`, `stub://dark`: generated frames, no I/O
//! - a directory path: the image files it contains, in name order
//! - with the `opencv` feature: `camera://<index>` or a video file path

#[cfg(feature = "opencv")]
pub mod capture;
pub mod looping;
pub mod sequence;
pub mod synthetic;

#[cfg(feature = "opencv")]
pub use capture::VideoCaptureSource;
pub use looping::LoopingSource;
pub use sequence::ImageSequenceSource;
pub use synthetic::{SyntheticPattern, SyntheticSource};

use crate::core_modules::frame::Frame;
use crate::error::SourceError;
use std::path::Path;

pub trait FrameSource {
    /// The next frame, or `None` at the end of the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Restarts the stream from its first frame. Returns `false` when the
    /// source cannot be restarted (live cameras, for example).
    fn rewind(&mut self) -> Result<bool, SourceError> {
        Ok(false)
    }

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        (**self).next_frame()
    }

    fn rewind(&mut self) -> Result<bool, SourceError> {
        (**self).rewind()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Adapts any source into an iterator of frames.
pub struct FrameStream<S> {
    source: S,
    finished: bool,
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        (**self).next_frame()
    }

    fn rewind(&mut self) -> Result<bool, SourceError> {
        (**self).rewind()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: FrameSource> FrameStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            finished: false,
        }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: FrameSource> Iterator for FrameStream<S> {
    type Item = Result<Frame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.source.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Opens a source from a URI: `stub://<pattern>`, a directory, or (with the
/// `opencv` feature) a camera or video file.
pub fn open_source(uri: &str) -> Result<Box<dyn FrameSource + Send>, SourceError> {
    if uri.starts_with(synthetic::SCHEME) {
        return Ok(Box::new(SyntheticSource::from_uri(uri)?));
    }
    let path = Path::new(uri);
    if path.is_dir() {
        return Ok(Box::new(ImageSequenceSource::open(path)?));
    }
    open_capture(uri)
}

#[cfg(feature = "opencv")]
fn open_capture(uri: &str) -> Result<Box<dyn FrameSource + Send>, SourceError> {
    Ok(Box::new(VideoCaptureSource::open(uri)?))
}

#[cfg(not(feature = "opencv"))]
fn open_capture(uri: &str) -> Result<Box<dyn FrameSource + Send>, SourceError> {
    Err(SourceError::Unsupported(format!(
        "{uri} is neither a stub:// source nor a directory of images; \
         video files and cameras need the `opencv` feature"
    )))
}
