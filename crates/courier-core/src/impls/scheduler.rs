//! Scheduler 実装
//!
//! - **TokioScheduler**: tokio の blocking pool で resume を実行（本番用）
//! - **InlineScheduler**: enqueue した呼び出し元スレッドでそのまま実行（テスト用）
//!
//! どちらも `ResumeResult::ResumeLater` を受け取ったら同じ unit を再投入します。

use tokio::runtime::Handle;
use tracing::trace;

use crate::ports::{ExecutionUnit, ResumeResult, Resumable, Scheduler};

/// Default throughput bound handed to `resume`.
pub const DEFAULT_MAX_THROUGHPUT: usize = 300;

/// Runs units on the blocking thread pool of a tokio runtime.
///
/// Blocking threads are used (not async workers) because a unit runs to
/// completion and may take locks; producers blocked in `WorkerHub::acquire`
/// must never starve the threads that would release a worker.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
    max_throughput: usize,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            max_throughput: DEFAULT_MAX_THROUGHPUT,
        }
    }

    /// Scheduler bound to the runtime of the calling task.
    ///
    /// Panics outside of a tokio runtime, like `Handle::current`.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn with_max_throughput(mut self, max_throughput: usize) -> Self {
        self.max_throughput = max_throughput;
        self
    }
}

impl Scheduler for TokioScheduler {
    fn enqueue(&self, job: Box<dyn Resumable>) {
        let this = self.clone();
        // JoinHandle は捨てる: 完了の通知は unit 自身の責務
        let _ = self.handle.spawn_blocking(move || {
            let mut ctx = ExecutionUnit::new();
            match job.resume(&mut ctx, this.max_throughput) {
                ResumeResult::ResumeLater(job) => this.enqueue(job),
                other => trace!(result = ?other, "unit left the scheduler"),
            }
        });
    }
}

/// Runs units immediately on the enqueuing thread.
#[derive(Debug, Clone)]
pub struct InlineScheduler {
    max_throughput: usize,
}

impl InlineScheduler {
    pub fn new() -> Self {
        Self {
            max_throughput: DEFAULT_MAX_THROUGHPUT,
        }
    }
}

impl Default for InlineScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for InlineScheduler {
    fn enqueue(&self, job: Box<dyn Resumable>) {
        let mut ctx = ExecutionUnit::new();
        let mut job = job;
        loop {
            match job.resume(&mut ctx, self.max_throughput) {
                ResumeResult::ResumeLater(next) => job = next,
                _ => break,
            }
        }
    }
}
