//! Scheduler port - run-to-completion で Resumable を実行するエンジン
//!
//! Ownership of a unit moves into the scheduler with `enqueue` and into the
//! unit itself with `resume(self: Box<Self>, ..)`. A unit that wants to run
//! again right away gives itself back through `ResumeResult::ResumeLater`;
//! everything else (a worker returning to its hub, an actor parking until its
//! next message) is the unit's own business.

use std::fmt;
use std::sync::Arc;

use super::ProxyRegistry;

/// What kind of schedulable unit this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtype {
    /// An actor resuming to process its mailbox.
    ScheduledActor,
    /// A broker bound to a network multiplexer.
    IoActor,
    /// A plain function-like job.
    FunctionObject,
}

/// Result of one `resume` call.
pub enum ResumeResult {
    /// Not finished: enqueue the returned unit again.
    ResumeLater(Box<dyn Resumable>),
    /// Runs again only after an external event re-enqueues it.
    AwaitingMessage,
    /// Finished for good.
    Done,
}

impl ResumeResult {
    pub fn is_awaiting_message(&self) -> bool {
        matches!(self, ResumeResult::AwaitingMessage)
    }
}

impl fmt::Debug for ResumeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumeResult::ResumeLater(unit) => f
                .debug_tuple("ResumeLater")
                .field(&unit.subtype())
                .finish(),
            ResumeResult::AwaitingMessage => f.write_str("AwaitingMessage"),
            ResumeResult::Done => f.write_str("Done"),
        }
    }
}

/// A unit of work the scheduler can run.
pub trait Resumable: Send {
    fn subtype(&self) -> Subtype;

    /// Run to completion on the calling thread.
    ///
    /// `max_throughput` bounds how many messages a unit may process before it
    /// should yield; single-shot units ignore it.
    fn resume(self: Box<Self>, ctx: &mut ExecutionUnit, max_throughput: usize) -> ResumeResult;
}

/// Execution engine.
pub trait Scheduler: Send + Sync {
    fn enqueue(&self, job: Box<dyn Resumable>);
}

/// Per-run execution context handed to `resume`.
///
/// Carries the proxy registry explicitly instead of a thread-local lookup.
#[derive(Default)]
pub struct ExecutionUnit {
    proxies: Option<Arc<dyn ProxyRegistry>>,
}

impl ExecutionUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_proxy_registry(&mut self, proxies: Arc<dyn ProxyRegistry>) {
        self.proxies = Some(proxies);
    }

    pub fn unbind_proxy_registry(&mut self) -> Option<Arc<dyn ProxyRegistry>> {
        self.proxies.take()
    }

    pub fn proxy_registry(&self) -> Option<&Arc<dyn ProxyRegistry>> {
        self.proxies.as_ref()
    }
}

impl fmt::Debug for ExecutionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionUnit")
            .field("proxy_registry_bound", &self.proxies.is_some())
            .finish()
    }
}
