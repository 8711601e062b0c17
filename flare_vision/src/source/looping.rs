//! Restart-on-end-of-stream adapter, for playing a clip as if it were a live feed.

use super::FrameSource;
use crate::core_modules::frame::Frame;
use crate::error::SourceError;
use tracing::{debug, warn};

pub struct LoopingSource<S> {
    inner: S,
    loops: u64,
}

impl<S: FrameSource> LoopingSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, loops: 0 }
    }

    /// How many times the inner source has been restarted.
    pub fn loops(&self) -> u64 {
        self.loops
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSource> FrameSource for LoopingSource<S> {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if let Some(frame) = self.inner.next_frame()? {
            return Ok(Some(frame));
        }
        if !self.inner.rewind()? {
            warn!(source = %self.inner.describe(), "source cannot rewind; ending stream");
            return Ok(None);
        }
        self.loops += 1;
        debug!(loops = self.loops, "restarted source");
        // A source that is still empty after a restart ends the stream instead of spinning.
        self.inner.next_frame()
    }

    fn rewind(&mut self) -> Result<bool, SourceError> {
        self.inner.rewind()
    }

    fn describe(&self) -> String {
        format!("{} (looping)", self.inner.describe())
    }
}
