use flare_vision::analyzer::Analysis;
use flare_vision::error::MonitorError;
use flare_vision::monitor::FrameSink;
use flare_vision::status::SurveillanceStatus;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Logs the status line whenever it changes, and per-frame figures at debug level.
#[derive(Debug, Default)]
pub struct StatusLogSink {
    last: Option<SurveillanceStatus>,
    frame_index: u64,
}

impl StatusLogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for StatusLogSink {
    fn consume(
        &mut self,
        analysis: &Analysis,
        status: &SurveillanceStatus,
    ) -> Result<(), MonitorError> {
        self.frame_index += 1;
        debug!(
            frame = self.frame_index,
            fire_pixels = analysis.fire_pixels,
            regions = analysis.regions.len(),
            "frame analyzed"
        );
        if self.last.as_ref() != Some(status) {
            info!(frame = self.frame_index, "{status}");
            self.last = Some(*status);
        }
        Ok(())
    }
}

/// Writes every annotated frame to `<dir>/frame_000001.png`, `frame_000002.png`, ...
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: u64,
}

impl DirectorySink {
    pub fn create(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, written: 0 })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for DirectorySink {
    fn consume(
        &mut self,
        analysis: &Analysis,
        _status: &SurveillanceStatus,
    ) -> Result<(), MonitorError> {
        let path = self.dir.join(format!("frame_{:06}.png", self.written + 1));
        analysis
            .annotated
            .save(&path)
            .map_err(|err| MonitorError::Sink(format!("writing {}: {err}", path.display())))?;
        self.written += 1;
        Ok(())
    }
}

/// Hands every frame to each inner sink in turn.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl FanOut {
    pub fn push(&mut self, sink: impl FrameSink + 'static) {
        self.sinks.push(Box::new(sink));
    }
}

impl FrameSink for FanOut {
    fn consume(
        &mut self,
        analysis: &Analysis,
        status: &SurveillanceStatus,
    ) -> Result<(), MonitorError> {
        for sink in &mut self.sinks {
            sink.consume(analysis, status)?;
        }
        Ok(())
    }
}
