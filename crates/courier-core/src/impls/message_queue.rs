//! MessageQueue - 連番付きメッセージを id 順に配送する Sequencer 実装
//!
//! # 実装詳細
//! - `next_id` は AtomicU64 の fetch_add（ロック不要）
//! - push/skip は `parking_lot::Mutex` の中で配送まで行う
//!   （配送順を守るため、receiver.enqueue もロック内で呼ぶ）
//! - 先に届いた後続 id は BTreeMap に退避し、欠番が埋まった時点でまとめて配送
//! - `next_undelivered` は enqueue の前に進める。receiver が panic しても
//!   その id だけが失敗として報告され、後続の配送は止まらない

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::{
    ActorHandle, DeliveryError, DeliveryReport, MailboxElement, MessageId, NodeId,
};
use crate::impls::TracingErrorSink;
use crate::ports::{ErrorSink, Sequencer};

struct Delivery {
    origin: NodeId,
    receiver: ActorHandle,
    element: MailboxElement,
}

struct OrderingState {
    next_undelivered: MessageId,
    /// `None` marks a skipped id.
    pending: BTreeMap<MessageId, Option<Delivery>>,
}

impl OrderingState {
    /// Advance past `id` and hand its element to the receiver.
    fn deliver(
        &mut self,
        id: MessageId,
        delivery: Option<Delivery>,
        failures: &mut Vec<DeliveryReport>,
    ) {
        self.next_undelivered = id.next();
        let Some(Delivery {
            origin,
            receiver,
            element,
        }) = delivery
        else {
            return;
        };
        let dest = receiver.id();
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| receiver.enqueue(element))) {
            failures.push(DeliveryReport::new(
                id,
                origin,
                dest,
                DeliveryError::from_panic(&*panic),
            ));
        }
    }

    /// Deliver everything that became contiguous.
    fn flush(&mut self, failures: &mut Vec<DeliveryReport>) {
        while let Some(entry) = self.pending.remove(&self.next_undelivered) {
            let id = self.next_undelivered;
            self.deliver(id, entry, failures);
        }
    }
}

/// In-order delivery queue shared by all workers of a hub.
///
/// A receiver whose `enqueue` panics is reported to the error sink under the
/// id of the element it was handed.
pub struct MessageQueue {
    next_id: AtomicU64,
    state: Mutex<OrderingState>,
    errors: Arc<dyn ErrorSink>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            state: Mutex::new(OrderingState {
                next_undelivered: MessageId::new(0),
                pending: BTreeMap::new(),
            }),
            errors: Arc::new(TracingErrorSink),
        }
    }

    pub fn with_error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.errors = errors;
        self
    }

    /// Number of ids waiting for a gap to be filled.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Lowest id not yet delivered or skipped.
    pub fn next_undelivered(&self) -> MessageId {
        self.state.lock().next_undelivered
    }

    // ロック外で報告する（sink が再入しても詰まらない）
    fn report(&self, failures: Vec<DeliveryReport>) {
        for report in failures {
            self.errors.report(report);
        }
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer for MessageQueue {
    fn next_id(&self) -> MessageId {
        MessageId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn push(&self, id: MessageId, origin: NodeId, receiver: ActorHandle, element: MailboxElement) {
        let mut failures = Vec::new();
        {
            let mut state = self.state.lock();
            if id < state.next_undelivered {
                debug!(message_id = %id, "dropping element for an id that was already delivered or skipped");
                return;
            }
            let delivery = Delivery {
                origin,
                receiver,
                element,
            };
            if id == state.next_undelivered {
                state.deliver(id, Some(delivery), &mut failures);
                state.flush(&mut failures);
            } else {
                trace!(message_id = %id, next = %state.next_undelivered, "buffering out-of-order element");
                state.pending.insert(id, Some(delivery));
            }
        }
        self.report(failures);
    }

    fn skip(&self, id: MessageId) {
        let mut failures = Vec::new();
        {
            let mut state = self.state.lock();
            if id < state.next_undelivered {
                return;
            }
            if id == state.next_undelivered {
                state.deliver(id, None, &mut failures);
                state.flush(&mut failures);
            } else {
                // 既に push 済みの id は上書きしない
                state.pending.entry(id).or_insert(None);
            }
        }
        self.report(failures);
    }
}
