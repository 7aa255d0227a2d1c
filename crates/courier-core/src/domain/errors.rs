//! Errors - エラー型と分類
//!
//! - `ContractViolation`: 呼び出し側のバグ（launch 前に拒否）
//! - `DeliveryError`: 1 メッセージに閉じた失敗（runtime の error channel へ報告）
//!
//! Backpressure (pool exhausted) is not an error and has no variant here.

use std::any::Any;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::header::MessageType;
use super::ids::{ActorAddr, ActorId, MessageId, NodeId};

/// Header rejected by `launch`. Always a programming error of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("destination actor id must not be zero")]
    InvalidDestination,

    #[error("operation {0} cannot be delivered to an actor")]
    UndeliverableOperation(MessageType),
}

/// Failure while decoding or dispatching one message inside a worker.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("payload length mismatch: header says {declared} bytes, got {actual}")]
    PayloadLengthMismatch { declared: u32, actual: usize },

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("routed message carries no destination node")]
    MissingDestinationNode,

    #[error("routed message for {dest} arrived at {local}")]
    WrongNode { dest: NodeId, local: NodeId },

    #[error("no local actor registered as {0}")]
    UnknownDestination(ActorId),

    #[error("cannot resolve sender {0}")]
    UnresolvedSender(ActorAddr),

    #[error("cannot resolve forwarding stage {0}")]
    UnresolvedStage(ActorAddr),

    #[error("no proxy registry bound to the execution unit")]
    MissingProxyRegistry,

    #[error("dispatch panicked: {0}")]
    Panicked(String),

    #[error("worker was dropped by the scheduler before it finished")]
    Abandoned,
}

impl DeliveryError {
    /// Wrap a payload caught by `catch_unwind`.
    pub fn from_panic(panic: &(dyn Any + Send)) -> Self {
        let msg = if let Some(msg) = panic.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = panic.downcast_ref::<String>() {
            msg.clone()
        } else {
            "non-string panic payload".to_string()
        };
        DeliveryError::Panicked(msg)
    }
}

/// What the runtime's error channel receives for a failed delivery.
#[derive(Debug)]
pub struct DeliveryReport {
    pub message_id: MessageId,
    pub origin: NodeId,
    pub dest_actor: ActorId,
    pub error: DeliveryError,
    pub reported_at: DateTime<Utc>,
}

impl DeliveryReport {
    pub fn new(message_id: MessageId, origin: NodeId, dest_actor: ActorId, error: DeliveryError) -> Self {
        Self {
            message_id,
            origin,
            dest_actor,
            error,
            reported_at: Utc::now(),
        }
    }
}
