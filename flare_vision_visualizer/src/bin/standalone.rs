use anyhow::Context;
use flare_vision::source::LoopingSource;
use flare_vision::{FlareConfig, FrameAnalyzer, FrameSource, Monitor, open_source};
use flare_vision_visualizer::{ControlHandle, DashboardSink, FrameBus, ServerConfig, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = FlareConfig::load(None).context("loading configuration")?;
    let analyzer = FrameAnalyzer::new(cfg.analyzer.clone()).context("building analyzer")?;
    let source = open_source(&cfg.source.uri).with_context(|| format!("opening {}", cfg.source.uri))?;
    let source: Box<dyn FrameSource + Send> = if cfg.source.loop_on_eof {
        Box::new(LoopingSource::new(source))
    } else {
        source
    };

    let bus = FrameBus::new(16);
    let (control, play_rx) = ControlHandle::new(true);
    let server = start_server(bus.clone(), ServerConfig::from_env(), control.clone()).await?;

    let mut monitor = Monitor::new(source, analyzer)
        .with_frame_delay(cfg.monitor.frame_delay)
        .with_max_frames(cfg.monitor.max_frames);
    let mut sink = DashboardSink::new(bus, play_rx, tokio::runtime::Handle::current());
    let stats = tokio::task::spawn_blocking(move || monitor.run(&mut sink))
        .await
        .context("monitor task panicked")??;
    info!(
        processed = stats.frames_processed,
        active = stats.frames_active,
        "stream finished; dashboard keeps serving the last frame"
    );

    // Keep the control handle alive so the page's buttons still answer.
    let _control = control;
    if let Err(err) = server.task.await {
        warn!(error = %err, "dashboard task ended");
    }
    Ok(())
}
