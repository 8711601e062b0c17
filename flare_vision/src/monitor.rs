// THEORY:
// The monitor is the capture -> analyze -> present loop. It owns a frame
// source and an analyzer and pushes every result into a `FrameSink`, which is
// where front-ends (a window, a directory of snapshots, a web dashboard) plug in.
//
// The loop is strictly sequential: one frame is read, analyzed and handed to
// the sink before the next one is read. Between frames it sleeps for the
// configured delay, which paces playback of recorded input.
//
// Failure policy:
// - Sources only hand out well-formed frames, so an analyzer failure means a
//   broken invariant and ends the loop with an error, like a source or sink
//   failure does.
// - End of stream, the frame limit, or the stop flag end the loop normally.

use crate::analyzer::{Analysis, FrameAnalyzer};
use crate::error::MonitorError;
use crate::source::FrameSource;
use crate::status::SurveillanceStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(30);

/// Receives every analyzed frame, in stream order.
pub trait FrameSink {
    fn consume(&mut self, analysis: &Analysis, status: &SurveillanceStatus)
    -> Result<(), MonitorError>;
}

impl<F> FrameSink for F
where
    F: FnMut(&Analysis, &SurveillanceStatus) -> Result<(), MonitorError>,
{
    fn consume(
        &mut self,
        analysis: &Analysis,
        status: &SurveillanceStatus,
    ) -> Result<(), MonitorError> {
        self(analysis, status)
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames_processed: u64,
    pub frames_active: u64,
}

/// What a single `step` did.
#[derive(Debug)]
pub enum Step {
    Analyzed(Box<Analysis>),
    EndOfStream,
}

pub struct Monitor<S> {
    source: S,
    analyzer: FrameAnalyzer,
    frame_delay: Duration,
    max_frames: Option<u64>,
    stop: Arc<AtomicBool>,
}

impl<S: FrameSource> Monitor<S> {
    pub fn new(source: S, analyzer: FrameAnalyzer) -> Self {
        Self {
            source,
            analyzer,
            frame_delay: DEFAULT_FRAME_DELAY,
            max_frames: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// Stops after this many frames have been analyzed.
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Setting the returned flag ends `run` after the frame in flight.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn analyzer(&self) -> &FrameAnalyzer {
        &self.analyzer
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Reads and analyzes one frame.
    pub fn step(&mut self) -> Result<Step, MonitorError> {
        let Some(frame) = self.source.next_frame()? else {
            return Ok(Step::EndOfStream);
        };
        let analysis = self.analyzer.analyze(&frame)?;
        Ok(Step::Analyzed(Box::new(analysis)))
    }

    pub fn run(&mut self, sink: &mut impl FrameSink) -> Result<MonitorStats, MonitorError> {
        let mut stats = MonitorStats::default();
        info!(source = %self.source.describe(), "monitor started");

        loop {
            if self.stop.load(Ordering::Relaxed) {
                info!("stop requested");
                break;
            }
            if self
                .max_frames
                .is_some_and(|max| stats.frames_processed >= max)
            {
                debug!("frame limit reached");
                break;
            }

            match self.step()? {
                Step::EndOfStream => {
                    info!("end of stream");
                    break;
                }
                Step::Analyzed(analysis) => {
                    let status = SurveillanceStatus::from_fire(analysis.is_active);
                    sink.consume(&analysis, &status)?;
                    stats.frames_processed += 1;
                    if analysis.is_active {
                        stats.frames_active += 1;
                    }
                }
            }

            if !self.frame_delay.is_zero() {
                std::thread::sleep(self.frame_delay);
            }
        }

        info!(
            processed = stats.frames_processed,
            active = stats.frames_active,
            "monitor finished"
        );
        Ok(stats)
    }
}
