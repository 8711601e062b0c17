// THEORY:
// The visualizer turns the monitor loop into a browser dashboard. The loop
// runs on a blocking thread and talks to the async web side through a
// `FrameBus`:
// - the latest annotated frame, JPEG-encoded, sits in a `watch` channel, so a
//   slow client only ever sees the newest picture and never backs up the loop;
// - the latest status sits in a second `watch` channel for polling clients;
// - every status is also sent on a `broadcast` channel for websocket clients.
//
// `DashboardSink` is the `FrameSink` that feeds the bus. It also enforces the
// play/pause control: while paused, `consume` blocks, which holds the whole
// monitor loop on the current frame.

#[cfg(feature = "web")]
mod server;

use flare_vision::analyzer::Analysis;
use flare_vision::error::MonitorError;
use flare_vision::monitor::FrameSink;
use flare_vision::{Region, SurveillanceStatus};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, watch};
use tracing::debug;

pub const BIND_ENV: &str = "FLARE_BIND";
pub const DEFAULT_BIND: &str = "127.0.0.1:3001";
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Clone)]
pub struct FramePacket {
    pub frame: u64,
    pub ts_millis: u64,
    pub width: u32,
    pub height: u32,
    /// JPEG bytes.
    pub data: Arc<[u8]>,
}

/// What the dashboard shows next to the picture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub frame: u64,
    pub ts_millis: u64,
    pub status: SurveillanceStatus,
    /// "Fire Detection: ACTIVE" and friends, in display order.
    pub lines: Vec<String>,
    pub fire_pixels: usize,
    pub union: Option<Region>,
}

impl StatusEvent {
    pub fn new(frame: u64, analysis: &Analysis, status: &SurveillanceStatus) -> Self {
        Self {
            frame,
            ts_millis: now_millis(),
            status: *status,
            lines: status.signals().iter().map(ToString::to_string).collect(),
            fire_pixels: analysis.fire_pixels,
            union: analysis.union,
        }
    }
}

#[derive(Clone)]
pub struct FrameBus {
    pub frames_tx: watch::Sender<Option<FramePacket>>,
    pub status_tx: watch::Sender<Option<StatusEvent>>,
    pub events_tx: broadcast::Sender<StatusEvent>,
}

impl FrameBus {
    pub fn new(capacity: usize) -> Self {
        let (frames_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            frames_tx,
            status_tx,
            events_tx,
        }
    }

    pub fn publish(&self, packet: FramePacket, event: StatusEvent) {
        // `send_replace` stores the value even when nobody is subscribed yet.
        self.frames_tx.send_replace(Some(packet));
        self.status_tx.send_replace(Some(event.clone()));
        // No websocket clients is not an error.
        let _ = self.events_tx.send(event);
    }

    pub fn latest_frame(&self) -> Option<FramePacket> {
        self.frames_tx.borrow().clone()
    }

    pub fn latest_status(&self) -> Option<StatusEvent> {
        self.status_tx.borrow().clone()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    /// `FLARE_BIND`, or `127.0.0.1:3001`.
    pub fn from_env() -> Self {
        let bind_addr = std::env::var(BIND_ENV)
            .ok()
            .filter(|addr| !addr.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        Self { bind_addr }
    }
}

#[derive(Clone)]
pub struct ControlHandle {
    pub play_tx: watch::Sender<bool>,
}

impl ControlHandle {
    pub fn new(playing: bool) -> (Self, watch::Receiver<bool>) {
        let (play_tx, play_rx) = watch::channel(playing);
        (Self { play_tx }, play_rx)
    }

    pub fn set_playing(&self, playing: bool) {
        self.play_tx.send_replace(playing);
    }

    pub fn is_playing(&self) -> bool {
        *self.play_tx.borrow()
    }
}

/// Publishes analyzed frames on a `FrameBus`. Must run outside the async
/// runtime (e.g. in `spawn_blocking`), since it blocks while paused.
pub struct DashboardSink {
    bus: FrameBus,
    play_rx: watch::Receiver<bool>,
    runtime: tokio::runtime::Handle,
    published: u64,
}

impl DashboardSink {
    pub fn new(bus: FrameBus, play_rx: watch::Receiver<bool>, runtime: tokio::runtime::Handle) -> Self {
        Self {
            bus,
            play_rx,
            runtime,
            published: 0,
        }
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    fn wait_for_play(&mut self) -> Result<(), MonitorError> {
        if *self.play_rx.borrow() {
            return Ok(());
        }
        debug!("paused");
        let play_rx = &mut self.play_rx;
        self.runtime
            .block_on(async { play_rx.wait_for(|playing| *playing).await.map(|_| ()) })
            .map_err(|_| MonitorError::Sink("play/pause control closed".to_string()))
    }
}

impl FrameSink for DashboardSink {
    fn consume(
        &mut self,
        analysis: &Analysis,
        status: &SurveillanceStatus,
    ) -> Result<(), MonitorError> {
        self.wait_for_play()?;

        let jpeg = analysis
            .annotated
            .encode_jpeg(JPEG_QUALITY)
            .map_err(|err| MonitorError::Sink(format!("jpeg encoding failed: {err}")))?;
        self.published += 1;
        let (width, height) = analysis.annotated.dimensions();
        let packet = FramePacket {
            frame: self.published,
            ts_millis: now_millis(),
            width,
            height,
            data: jpeg.into(),
        };
        self.bus
            .publish(packet, StatusEvent::new(self.published, analysis, status));
        Ok(())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(feature = "web")]
pub use server::start_server;

#[cfg(not(feature = "web"))]
pub async fn start_server(
    _bus: FrameBus,
    _cfg: ServerConfig,
    _control: ControlHandle,
) -> anyhow::Result<RunningServer> {
    Err(anyhow::anyhow!("web feature not enabled for flare_vision_visualizer"))
}

/// A server started by `start_server`.
pub struct RunningServer {
    pub local_addr: std::net::SocketAddr,
    pub task: tokio::task::JoinHandle<()>,
}
