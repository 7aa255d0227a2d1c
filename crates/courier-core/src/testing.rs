//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::domain::{
    Actor, ActorHandle, ActorId, Header, MailboxElement, MessageId, NodeId, WirePayload,
};
use crate::impls::{DEFAULT_MAX_THROUGHPUT, MessageQueue};
use crate::ports::{
    ExecutionUnit, ProxyRegistry, ResumeResult, Resumable, Scheduler, Sequencer,
};

struct Recorder {
    id: ActorId,
    node: NodeId,
    received: Mutex<Vec<MailboxElement>>,
}

impl Actor for Recorder {
    fn id(&self) -> ActorId {
        self.id
    }

    fn node(&self) -> NodeId {
        self.node
    }

    fn enqueue(&self, element: MailboxElement) {
        self.received.lock().push(element);
    }
}

/// Actor that keeps everything it receives.
pub(crate) struct RecordingActor {
    inner: Arc<Recorder>,
}

impl RecordingActor {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            inner: Arc::new(Recorder {
                id: ActorId::new(id),
                node: NodeId::generate(),
                received: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn handle(&self) -> ActorHandle {
        self.inner.clone()
    }

    pub(crate) fn received(&self) -> Vec<MailboxElement> {
        self.inner.received.lock().clone()
    }
}

/// Anonymous element carrying its id as content.
pub(crate) fn element(id: MessageId) -> MailboxElement {
    MailboxElement {
        id,
        request_id: 0,
        sender: None,
        stages: Vec::new(),
        content: serde_json::json!(id.get()),
    }
}

/// Header and payload of a direct message with a matching `payload_len`.
pub(crate) fn direct_message(
    source: ActorId,
    dest: ActorId,
    content: serde_json::Value,
) -> (Header, Vec<u8>) {
    let payload = WirePayload::new(content)
        .to_bytes()
        .expect("json value always serializes");
    let hdr = Header::direct(source, dest, payload.len() as u32);
    (hdr, payload)
}

/// `MessageQueue` that counts `next_id` calls.
pub(crate) struct CountingSequencer {
    queue: MessageQueue,
    drawn: AtomicUsize,
}

impl CountingSequencer {
    pub(crate) fn new() -> Self {
        Self {
            queue: MessageQueue::new(),
            drawn: AtomicUsize::new(0),
        }
    }

    pub(crate) fn drawn(&self) -> usize {
        self.drawn.load(Ordering::SeqCst)
    }
}

impl Sequencer for CountingSequencer {
    fn next_id(&self) -> MessageId {
        self.drawn.fetch_add(1, Ordering::SeqCst);
        self.queue.next_id()
    }

    fn push(&self, id: MessageId, origin: NodeId, receiver: ActorHandle, element: MailboxElement) {
        self.queue.push(id, origin, receiver, element);
    }

    fn skip(&self, id: MessageId) {
        self.queue.skip(id);
    }
}

/// Scheduler that only queues units; tests run them explicitly.
pub(crate) struct DeferredScheduler {
    queue: Mutex<VecDeque<Box<dyn Resumable>>>,
}

impl DeferredScheduler {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run the oldest queued unit. The lock is released while it runs.
    pub(crate) fn run_one(&self) -> bool {
        self.run_nth(0)
    }

    /// Run the `n`-th queued unit, oldest first.
    pub(crate) fn run_nth(&self, n: usize) -> bool {
        let Some(job) = self.queue.lock().remove(n) else {
            return false;
        };
        let mut ctx = ExecutionUnit::new();
        if let ResumeResult::ResumeLater(job) = job.resume(&mut ctx, DEFAULT_MAX_THROUGHPUT) {
            self.queue.lock().push_back(job);
        }
        true
    }

    /// Run until the queue is empty; returns the number of resumes.
    pub(crate) fn run_all(&self) -> usize {
        let mut runs = 0;
        while self.run_one() {
            runs += 1;
        }
        runs
    }
}

impl Scheduler for DeferredScheduler {
    fn enqueue(&self, job: Box<dyn Resumable>) {
        self.queue.lock().push_back(job);
    }
}

/// Registry whose every lookup panics.
pub(crate) struct PanickingRegistry;

impl ProxyRegistry for PanickingRegistry {
    fn resolve(&self, node: NodeId, actor: ActorId) -> Option<ActorHandle> {
        panic!("registry lookup failed for {actor} on {node}");
    }
}

/// Scheduler that drops every unit without running it.
pub(crate) struct DroppingScheduler {
    dropped: AtomicUsize,
}

impl DroppingScheduler {
    pub(crate) fn new() -> Self {
        Self {
            dropped: AtomicUsize::new(0),
        }
    }

    pub(crate) fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

impl Scheduler for DroppingScheduler {
    fn enqueue(&self, job: Box<dyn Resumable>) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
        drop(job);
    }
}

/// Actor whose mailbox panics on every element.
pub(crate) struct PanickingActor {
    id: ActorId,
    node: NodeId,
}

impl PanickingActor {
    pub(crate) fn new(node: NodeId, id: u64) -> ActorHandle {
        Arc::new(Self {
            id: ActorId::new(id),
            node,
        })
    }
}

impl Actor for PanickingActor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn node(&self) -> NodeId {
        self.node
    }

    fn enqueue(&self, element: MailboxElement) {
        panic!("mailbox of {} rejected {}", self.id, element.id);
    }
}
