//! Worker - 1 件の inbound メッセージを decode して配送する再利用オブジェクト
//!
//! # ライフサイクル
//! 1. `WorkerHub::acquire` で `WorkerHandle` として貸し出される（排他所有）
//! 2. `WorkerHandle::launch` で連番取得 → header/payload をコピー → scheduler へ
//! 3. scheduler スレッドで `resume` が 1 回だけ呼ばれる
//! 4. 成否に関係なく、最後に自分自身を hub へ返す
//!
//! The hand-back moves `self: Box<Self>` into the hub, so touching the worker
//! after it is visible to other threads does not compile.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use tracing::{debug, error, trace, warn};

use super::hub::{HubShared, RunOutcome};
use crate::domain::{
    ActorAddr, ContractViolation, DeliveryError, DeliveryReport, Header, MailboxElement,
    MessageId, MessageType, NodeId, WirePayload, WorkerState,
};
use crate::ports::{ExecutionUnit, ProxyRegistry, ResumeResult, Resumable, Sequencer, Subtype};
use crate::system::ActorSystem;

pub struct Worker {
    slot: usize,
    msg_id: MessageId,
    last_hop: NodeId,
    hdr: Header,
    payload: Vec<u8>,
    state: WorkerState,
    hub: Weak<HubShared>,
    proxies: Arc<dyn ProxyRegistry>,
    sequencer: Arc<dyn Sequencer>,
    system: Arc<ActorSystem>,
}

impl Worker {
    pub(crate) fn new(
        slot: usize,
        hub: Weak<HubShared>,
        proxies: Arc<dyn ProxyRegistry>,
        sequencer: Arc<dyn Sequencer>,
        system: Arc<ActorSystem>,
    ) -> Self {
        Self {
            slot,
            msg_id: MessageId::new(0),
            last_hop: NodeId::from_ulid(ulid::Ulid::nil()),
            hdr: Header::empty(),
            payload: Vec::new(),
            state: WorkerState::Idle,
            hub,
            proxies,
            sequencer,
            system,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Load one message and hand the worker to the scheduler.
    ///
    /// The header was validated by `WorkerHandle::launch`.
    fn launch(mut self: Box<Self>, last_hop: NodeId, hdr: &Header, payload: &[u8]) -> MessageId {
        debug_assert!(self.state.is_idle());
        self.msg_id = self.sequencer.next_id();
        self.last_hop = last_hop;
        self.hdr = *hdr;
        // バッファは使い回す（capacity を保持）
        self.payload.clear();
        self.payload.extend_from_slice(payload);
        self.state = WorkerState::Loaded;
        if let Some(hub) = self.hub.upgrade() {
            hub.record_launch();
        }

        let id = self.msg_id;
        debug!(
            slot = self.slot,
            message_id = %id,
            origin = %last_hop,
            dest = %hdr.dest_actor,
            "launching worker"
        );
        let scheduler = Arc::clone(self.system.scheduler());
        scheduler.enqueue(self);
        id
    }

    /// Decode the payload and push the resulting element into the sequencer.
    fn handle_remote_message(&self, ctx: &ExecutionUnit) -> Result<(), DeliveryError> {
        let hdr = &self.hdr;
        if self.payload.len() != hdr.payload_len as usize {
            return Err(DeliveryError::PayloadLengthMismatch {
                declared: hdr.payload_len,
                actual: self.payload.len(),
            });
        }
        let payload: WirePayload = serde_json::from_slice(&self.payload)?;
        let proxies: &dyn ProxyRegistry = &**ctx
            .proxy_registry()
            .ok_or(DeliveryError::MissingProxyRegistry)?;

        if hdr.operation == MessageType::RoutedMessage {
            let local = self.system.node();
            let dest = hdr.dest_node.ok_or(DeliveryError::MissingDestinationNode)?;
            if dest != local {
                return Err(DeliveryError::WrongNode { dest, local });
            }
        }

        let dest = self
            .system
            .local(hdr.dest_actor)
            .ok_or(DeliveryError::UnknownDestination(hdr.dest_actor))?;

        let sender = if hdr.source_actor.is_valid() {
            let node = match hdr.operation {
                MessageType::RoutedMessage => hdr.source_node.unwrap_or(self.last_hop),
                _ => self.last_hop,
            };
            let addr = ActorAddr::new(node, hdr.source_actor);
            let sender = self
                .system
                .resolve(addr, proxies)
                .ok_or(DeliveryError::UnresolvedSender(addr))?;
            Some(sender)
        } else {
            None
        };

        let stages = payload
            .stages
            .iter()
            .map(|&addr| {
                self.system
                    .resolve(addr, proxies)
                    .ok_or(DeliveryError::UnresolvedStage(addr))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let element = MailboxElement {
            id: self.msg_id,
            request_id: hdr.operation_data,
            sender,
            stages,
            content: payload.content,
        };
        trace!(slot = self.slot, message_id = %self.msg_id, "pushing element to sequencer");
        self.sequencer.push(self.msg_id, self.last_hop, dest, element);
        Ok(())
    }

    /// Return to the hub. Must be the last thing a worker does.
    fn hand_back(mut self: Box<Self>, outcome: RunOutcome) {
        self.state = WorkerState::Idle;
        self.payload.clear();
        match self.hub.upgrade() {
            Some(hub) => hub.push(self, outcome),
            None => debug!(slot = self.slot, "hub is gone, dropping worker"),
        }
    }
}

impl Resumable for Worker {
    fn subtype(&self) -> Subtype {
        Subtype::FunctionObject
    }

    fn resume(mut self: Box<Self>, ctx: &mut ExecutionUnit, _max_throughput: usize) -> ResumeResult {
        self.state = WorkerState::Running;
        ctx.bind_proxy_registry(Arc::clone(&self.proxies));

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.handle_remote_message(ctx)))
            .unwrap_or_else(|panic| Err(DeliveryError::from_panic(&*panic)));
        ctx.unbind_proxy_registry();

        let outcome = match result {
            Ok(()) => RunOutcome::Delivered,
            Err(err) => {
                // 欠番を埋めないと後続の配送が止まる
                self.sequencer.skip(self.msg_id);
                self.system.report(DeliveryReport::new(
                    self.msg_id,
                    self.last_hop,
                    self.hdr.dest_actor,
                    err,
                ));
                RunOutcome::Failed
            }
        };
        self.hand_back(outcome);
        ResumeResult::AwaitingMessage
    }
}

/// A launched worker dropped without finishing its run (the scheduler
/// discarded it, e.g. its runtime shut down) gives up its message id and is
/// replaced by a fresh worker in the same slot.
impl Drop for Worker {
    fn drop(&mut self) {
        if self.state.is_idle() {
            return;
        }
        warn!(
            slot = self.slot,
            message_id = %self.msg_id,
            state = ?self.state,
            "worker dropped before finishing, replacing it"
        );
        self.sequencer.skip(self.msg_id);
        self.system.report(DeliveryReport::new(
            self.msg_id,
            self.last_hop,
            self.hdr.dest_actor,
            DeliveryError::Abandoned,
        ));
        if let Some(hub) = self.hub.upgrade() {
            let fresh = Worker::new(
                self.slot,
                self.hub.clone(),
                Arc::clone(&self.proxies),
                Arc::clone(&self.sequencer),
                Arc::clone(&self.system),
            );
            hub.push(Box::new(fresh), RunOutcome::Failed);
        }
    }
}

/// Exclusive ownership of an idle worker, obtained from `WorkerHub::acquire`.
///
/// Dropping an unlaunched handle returns the worker to its hub, so a worker
/// cannot leak and cannot be returned twice.
pub struct WorkerHandle {
    worker: Option<Box<Worker>>,
}

impl WorkerHandle {
    pub(crate) fn new(worker: Box<Worker>) -> Self {
        Self {
            worker: Some(worker),
        }
    }

    pub fn slot(&self) -> Option<usize> {
        self.worker.as_ref().map(|w| w.slot())
    }

    pub fn state(&self) -> Option<WorkerState> {
        self.worker.as_ref().map(|w| w.state())
    }

    /// Start processing one message; ownership moves to the scheduler.
    ///
    /// The header is checked before anything else happens: on a contract
    /// violation no sequence id is drawn, nothing is scheduled and the worker
    /// goes straight back to the hub.
    pub fn launch(
        mut self,
        last_hop: NodeId,
        hdr: &Header,
        payload: &[u8],
    ) -> Result<MessageId, ContractViolation> {
        if let Err(violation) = hdr.check_deliverable() {
            error!(
                slot = ?self.slot(),
                operation = %hdr.operation,
                dest = %hdr.dest_actor,
                %violation,
                "refusing to launch worker"
            );
            return Err(violation);
        }
        let Some(worker) = self.worker.take() else {
            unreachable!("a worker handle always holds its worker until launch or drop");
        };
        Ok(worker.launch(last_hop, hdr, payload))
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.hand_back(RunOutcome::Unused);
        }
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("slot", &self.slot())
            .field("state", &self.state())
            .finish()
    }
}
