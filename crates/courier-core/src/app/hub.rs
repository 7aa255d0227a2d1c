//! WorkerHub - idle worker のプール
//!
//! # 実装詳細
//! - idle set は `parking_lot::Mutex<Vec<Box<Worker>>>`、空きの通知は `Condvar`
//! - worker は capacity まで遅延生成、以降は `OverflowPolicy` に従う
//! - カウンタは atomics（status 用）
//!
//! A worker is either in the idle set or owned by exactly one party (a
//! `WorkerHandle`, the scheduler, or the worker's own run step). `Box`
//! ownership makes handing out the same worker twice unrepresentable.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::{debug, trace};

use super::config::{HubConfig, OverflowPolicy};
use super::status::HubStatus;
use super::worker::{Worker, WorkerHandle};
use crate::domain::{ContractViolation, Header, MessageId, NodeId};
use crate::ports::{ProxyRegistry, Sequencer};
use crate::system::ActorSystem;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("blocking acquire task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// How a worker's turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// Handle dropped without launch.
    Unused,
    Delivered,
    Failed,
}

struct IdleSet {
    workers: Vec<Box<Worker>>,
    allocated: usize,
}

#[derive(Default)]
struct Counters {
    launched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// State shared between the hub handles and the workers' back-references.
pub(crate) struct HubShared {
    idle: Mutex<IdleSet>,
    available: Condvar,
    capacity: usize,
    overflow: OverflowPolicy,
    system: Arc<ActorSystem>,
    proxies: Arc<dyn ProxyRegistry>,
    sequencer: Arc<dyn Sequencer>,
    counters: Counters,
}

impl HubShared {
    pub(crate) fn record_launch(&self) {
        self.counters.launched.fetch_add(1, Ordering::Relaxed);
    }

    /// Put a worker back into the idle set and wake waiters.
    pub(crate) fn push(&self, worker: Box<Worker>, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Unused => {}
            RunOutcome::Delivered => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            RunOutcome::Failed => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        let slot = worker.slot();
        let mut idle = self.idle.lock();
        debug_assert!(worker.state().is_idle());
        debug_assert!(idle.workers.len() < idle.allocated);
        idle.workers.push(worker);
        drop(idle);
        // acquire 待ちと await_workers 待ちの両方がいるので notify_all
        self.available.notify_all();
        trace!(slot, ?outcome, "worker returned to hub");
    }
}

/// Bounded pool of reusable workers. Cheap to clone.
#[derive(Clone)]
pub struct WorkerHub {
    shared: Arc<HubShared>,
}

impl WorkerHub {
    pub fn new(
        config: &HubConfig,
        system: Arc<ActorSystem>,
        proxies: Arc<dyn ProxyRegistry>,
        sequencer: Arc<dyn Sequencer>,
    ) -> Self {
        let shared = Arc::new(HubShared {
            idle: Mutex::new(IdleSet {
                workers: Vec::with_capacity(config.capacity),
                allocated: 0,
            }),
            available: Condvar::new(),
            capacity: config.capacity,
            overflow: config.overflow,
            system,
            proxies,
            sequencer,
            counters: Counters::default(),
        });
        Self { shared }
    }

    /// Pop an idle worker or allocate a new one if the policy allows.
    fn take(&self, idle: &mut IdleSet) -> Option<Box<Worker>> {
        if let Some(worker) = idle.workers.pop() {
            return Some(worker);
        }
        let may_grow = match self.shared.overflow {
            OverflowPolicy::Block => idle.allocated < self.shared.capacity,
            OverflowPolicy::Grow => true,
        };
        if !may_grow {
            return None;
        }
        let slot = idle.allocated;
        idle.allocated += 1;
        debug!(slot, allocated = idle.allocated, "allocating worker");
        Some(Box::new(Worker::new(
            slot,
            Arc::downgrade(&self.shared),
            Arc::clone(&self.shared.proxies),
            Arc::clone(&self.shared.sequencer),
            Arc::clone(&self.shared.system),
        )))
    }

    /// Get an idle worker, blocking while the hub is exhausted.
    pub fn acquire(&self) -> WorkerHandle {
        let mut idle = self.shared.idle.lock();
        loop {
            if let Some(worker) = self.take(&mut idle) {
                return WorkerHandle::new(worker);
            }
            trace!("hub exhausted, waiting for a worker");
            self.shared.available.wait(&mut idle);
        }
    }

    /// Get an idle worker without waiting.
    pub fn try_acquire(&self) -> Option<WorkerHandle> {
        let mut idle = self.shared.idle.lock();
        self.take(&mut idle).map(WorkerHandle::new)
    }

    /// Like `acquire`, giving up after `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<WorkerHandle> {
        let deadline = Instant::now() + timeout;
        let mut idle = self.shared.idle.lock();
        loop {
            if let Some(worker) = self.take(&mut idle) {
                return Some(WorkerHandle::new(worker));
            }
            if self
                .shared
                .available
                .wait_until(&mut idle, deadline)
                .timed_out()
            {
                return self.take(&mut idle).map(WorkerHandle::new);
            }
        }
    }

    /// `acquire` for async producers; waits on the blocking pool.
    pub async fn acquire_async(&self) -> Result<WorkerHandle, HubError> {
        let hub = self.clone();
        let handle = tokio::task::spawn_blocking(move || hub.acquire()).await?;
        Ok(handle)
    }

    /// Return an unlaunched handle. Same as dropping it.
    pub fn release(&self, handle: WorkerHandle) {
        drop(handle);
    }

    /// Entry point for inbound messages: validate, acquire, launch.
    ///
    /// Contract violations are rejected before a worker is touched.
    pub fn submit(
        &self,
        origin: NodeId,
        hdr: &Header,
        payload: &[u8],
    ) -> Result<MessageId, ContractViolation> {
        hdr.check_deliverable()?;
        self.acquire().launch(origin, hdr, payload)
    }

    pub async fn submit_async(
        &self,
        origin: NodeId,
        hdr: Header,
        payload: Vec<u8>,
    ) -> Result<Result<MessageId, ContractViolation>, HubError> {
        if let Err(violation) = hdr.check_deliverable() {
            return Ok(Err(violation));
        }
        let handle = self.acquire_async().await?;
        Ok(handle.launch(origin, &hdr, &payload))
    }

    /// Wait until every allocated worker is idle again.
    pub fn await_workers(&self) {
        let mut idle = self.shared.idle.lock();
        while idle.workers.len() < idle.allocated {
            self.shared.available.wait(&mut idle);
        }
    }

    /// Like `await_workers`; returns false on timeout.
    pub fn await_workers_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut idle = self.shared.idle.lock();
        while idle.workers.len() < idle.allocated {
            if self
                .shared
                .available
                .wait_until(&mut idle, deadline)
                .timed_out()
            {
                return idle.workers.len() == idle.allocated;
            }
        }
        true
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn system(&self) -> &Arc<ActorSystem> {
        &self.shared.system
    }

    pub fn proxies(&self) -> &Arc<dyn ProxyRegistry> {
        &self.shared.proxies
    }

    pub fn sequencer(&self) -> &Arc<dyn Sequencer> {
        &self.shared.sequencer
    }

    pub fn status(&self) -> HubStatus {
        let (allocated, idle) = {
            let idle = self.shared.idle.lock();
            (idle.allocated, idle.workers.len())
        };
        let counters = &self.shared.counters;
        HubStatus {
            capacity: self.shared.capacity,
            allocated,
            idle,
            launched: counters.launched.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }
}
