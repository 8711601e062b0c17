// THEORY:
// `ParallelAnalyzer` spreads independent frames over a pool of tokio workers.
// Analysis of one frame never depends on another, so frames can be processed
// in any order and on any worker; callers get their own result back through a
// oneshot channel.
//
// Architecture:
// - A single dispatcher task drains the shared task queue and hands tasks to
//   the workers round-robin, one unbounded channel per worker.
// - Each worker owns a clone of the analyzer and answers every task it gets.
// - `analyze_batch` submits all frames up front and awaits the replies with
//   `join_all`, so results come back in submission order.
//
// Dropping the `ParallelAnalyzer` closes the queue; the dispatcher and workers
// then drain and exit on their own.

use crate::analyzer::{Analysis, FrameAnalyzer};
use crate::core_modules::frame::Frame;
use crate::error::PoolError;
use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

struct FrameTask {
    frame: Frame,
    reply: oneshot::Sender<Result<Analysis, PoolError>>,
}

struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn new(analyzer: FrameAnalyzer, size: usize) -> Self {
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..size)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_idx].send(task) {
                    let _ = task.reply.send(Err(PoolError::Closed));
                }
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        });

        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(id, mut receiver)| {
                let analyzer = analyzer.clone();
                tokio::spawn(async move {
                    while let Some(task) = receiver.recv().await {
                        let result = analyzer.analyze(&task.frame).map_err(PoolError::from);
                        // The caller may have stopped waiting; nothing to do then.
                        let _ = task.reply.send(result);
                    }
                    debug!(worker = id, "analysis worker stopped");
                })
            })
            .collect();

        Self {
            task_sender,
            workers,
        }
    }
}

pub struct ParallelAnalyzer {
    pool: WorkerPool,
}

impl ParallelAnalyzer {
    /// One worker per logical CPU. Must be called inside a tokio runtime.
    pub fn new(analyzer: FrameAnalyzer) -> Self {
        Self::with_workers(analyzer, num_cpus::get())
    }

    /// A pool of `workers` tasks (at least one). Must be called inside a tokio runtime.
    pub fn with_workers(analyzer: FrameAnalyzer, workers: usize) -> Self {
        let workers = workers.max(1);
        debug!(workers, "starting analysis pool");
        Self {
            pool: WorkerPool::new(analyzer, workers),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.pool.workers.len()
    }

    pub async fn analyze(&self, frame: Frame) -> Result<Analysis, PoolError> {
        let (reply, result) = oneshot::channel();
        self.pool
            .task_sender
            .send(FrameTask { frame, reply })
            .map_err(|_| PoolError::Closed)?;
        result.await.map_err(|_| PoolError::Closed)?
    }

    /// Analyzes every frame concurrently. The i-th result belongs to the i-th frame.
    pub async fn analyze_batch(&self, frames: Vec<Frame>) -> Vec<Result<Analysis, PoolError>> {
        join_all(frames.into_iter().map(|frame| self.analyze(frame))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzerConfig;

    fn analyzer() -> FrameAnalyzer {
        let config = AnalyzerConfig {
            target_width: 160,
            target_height: 120,
            pixel_threshold: 500,
            min_contour_area: 200.0,
            ..AnalyzerConfig::default()
        };
        FrameAnalyzer::new(config).unwrap()
    }

    fn frame_with_fire(fire: bool) -> Frame {
        let mut frame = Frame::filled(160, 120, [10, 10, 10]).unwrap();
        if fire {
            frame.fill_rect(40, 30, 60, 40, [255, 128, 0]);
        }
        frame
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_results_keep_submission_order() {
        let pool = ParallelAnalyzer::with_workers(analyzer(), 3);
        assert_eq!(pool.worker_count(), 3);

        let pattern = [true, false, false, true, true, false, true];
        let frames = pattern.iter().map(|&fire| frame_with_fire(fire)).collect();
        let results = pool.analyze_batch(frames).await;

        let flags: Vec<bool> = results
            .into_iter()
            .map(|result| result.unwrap().is_active)
            .collect();
        assert_eq!(flags, pattern);
    }

    #[tokio::test]
    async fn pooled_analysis_matches_direct_analysis() {
        let direct = analyzer();
        let pool = ParallelAnalyzer::with_workers(direct.clone(), 2);
        let frame = frame_with_fire(true);

        let pooled = pool.analyze(frame.clone()).await.unwrap();
        assert_eq!(pooled, direct.analyze(&frame).unwrap());
    }

    #[tokio::test]
    async fn zero_workers_still_runs_one() {
        let pool = ParallelAnalyzer::with_workers(analyzer(), 0);
        assert_eq!(pool.worker_count(), 1);
        assert!(pool.analyze(frame_with_fire(false)).await.is_ok());
    }
}
