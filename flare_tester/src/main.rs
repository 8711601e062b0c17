// THEORY:
// `flare_tester` is the command-line front-end of the engine. It resolves the
// configuration (file, environment, then flags), opens a frame source, and
// either
// - runs the monitor loop, logging status changes and optionally writing every
//   annotated frame to a directory, or
// - in `--batch` mode, reads a finite source completely and analyzes all of it
//   on the worker pool, then reports per-frame results in order.

mod sinks;

use anyhow::{Context, Result, bail};
use clap::Parser;
use flare_vision::source::{FrameStream, LoopingSource};
use flare_vision::{
    FlareConfig, Frame, FrameAnalyzer, FrameSource, Monitor, ParallelAnalyzer, open_source,
};
use sinks::{DirectorySink, FanOut, StatusLogSink};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "flare_tester", version, about = "Run fire detection over a frame source")]
struct Args {
    /// Frame source: stub://fire, stub://dark, a directory of images, or (with
    /// the `opencv` feature) a video file or camera://<index>.
    #[arg(long)]
    source: Option<String>,

    /// TOML configuration file. Falls back to $FLARE_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory that receives every annotated frame as PNG.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Restart the source when it ends.
    #[arg(long = "loop", conflicts_with = "no_loop")]
    loop_source: bool,

    /// Stop at the end of the source even if the configuration loops.
    #[arg(long)]
    no_loop: bool,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Pause between frames, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Read the whole source first, then analyze all frames in parallel.
    #[arg(long)]
    batch: bool,

    /// Worker count for --batch. Defaults to the number of CPUs.
    #[arg(long, requires = "batch")]
    jobs: Option<usize>,
}

impl Args {
    fn apply_to(&self, cfg: &mut FlareConfig) {
        if let Some(source) = &self.source {
            cfg.source.uri = source.clone();
        }
        if self.loop_source {
            cfg.source.loop_on_eof = true;
        }
        if self.no_loop {
            cfg.source.loop_on_eof = false;
        }
        if let Some(max_frames) = self.max_frames {
            cfg.monitor.max_frames = Some(max_frames);
        }
        if let Some(delay) = self.delay_ms {
            cfg.monitor.frame_delay = Duration::from_millis(delay);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = FlareConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply_to(&mut cfg);
    cfg.validate().context("validating configuration")?;

    let analyzer = FrameAnalyzer::new(cfg.analyzer.clone()).context("building analyzer")?;
    let source =
        open_source(&cfg.source.uri).with_context(|| format!("opening source {}", cfg.source.uri))?;
    info!(source = %source.describe(), "source opened");

    if args.batch {
        if cfg.source.loop_on_eof {
            bail!("--batch needs a finite source; drop --loop or pass --no-loop");
        }
        return run_batch(source, analyzer, &cfg, args.jobs, args.output.as_deref());
    }
    run_monitor(source, analyzer, &cfg, args.output.as_deref())
}

fn run_monitor(
    source: Box<dyn FrameSource + Send>,
    analyzer: FrameAnalyzer,
    cfg: &FlareConfig,
    output: Option<&Path>,
) -> Result<()> {
    let mut sinks = FanOut::default();
    sinks.push(StatusLogSink::new());
    if let Some(dir) = output {
        let sink = DirectorySink::create(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        sinks.push(sink);
    }

    let source: Box<dyn FrameSource + Send> = if cfg.source.loop_on_eof {
        Box::new(LoopingSource::new(source))
    } else {
        source
    };

    let mut monitor = Monitor::new(source, analyzer)
        .with_frame_delay(cfg.monitor.frame_delay)
        .with_max_frames(cfg.monitor.max_frames);
    let stats = monitor.run(&mut sinks).context("monitor loop failed")?;

    info!(
        processed = stats.frames_processed,
        active = stats.frames_active,
        "done"
    );
    Ok(())
}

fn run_batch(
    mut source: Box<dyn FrameSource + Send>,
    analyzer: FrameAnalyzer,
    cfg: &FlareConfig,
    jobs: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let frames = collect_frames(source.as_mut(), cfg.monitor.max_frames)?;
    info!(frames = frames.len(), "source read; analyzing in parallel");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    let results = runtime.block_on(async move {
        let pool = match jobs {
            Some(jobs) => ParallelAnalyzer::with_workers(analyzer, jobs),
            None => ParallelAnalyzer::new(analyzer),
        };
        pool.analyze_batch(frames).await
    });

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    let mut active = 0;
    for (index, result) in results.into_iter().enumerate() {
        let analysis = match result {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(frame = index + 1, error = %err, "frame failed");
                continue;
            }
        };
        if analysis.is_active {
            active += 1;
        }
        info!(
            frame = index + 1,
            active = analysis.is_active,
            fire_pixels = analysis.fire_pixels,
            union = ?analysis.union,
            "analyzed"
        );
        if let Some(dir) = output {
            let path = dir.join(format!("frame_{:06}.png", index + 1));
            analysis
                .annotated
                .save(&path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }
    info!(active, "batch complete");
    Ok(())
}

/// Drains `source`, up to `limit` frames.
fn collect_frames(source: &mut dyn FrameSource, limit: Option<u64>) -> Result<Vec<Frame>> {
    let limit = limit.map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
    FrameStream::new(source)
        .take(limit)
        .collect::<Result<Vec<_>, _>>()
        .context("reading source")
}
