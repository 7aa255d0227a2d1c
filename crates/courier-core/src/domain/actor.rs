//! Actor - 配送先の抽象化と mailbox element

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ids::{ActorAddr, ActorId, MessageId, NodeId};

/// Anything a worker can deliver a decoded message to: a local actor or a
/// proxy standing in for a remote one.
///
/// `enqueue` must not block for long; it runs on scheduler threads while the
/// sequencer's ordering lock is held.
pub trait Actor: Send + Sync {
    fn id(&self) -> ActorId;

    fn node(&self) -> NodeId;

    fn enqueue(&self, element: MailboxElement);

    fn addr(&self) -> ActorAddr {
        ActorAddr::new(self.node(), self.id())
    }
}

/// Shared handle to an actor or proxy.
pub type ActorHandle = Arc<dyn Actor>;

/// Decoded body of a deliverable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePayload {
    /// Forwarding stack; the last stage receives the message after the
    /// destination.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<ActorAddr>,
    pub content: serde_json::Value,
}

impl WirePayload {
    pub fn new(content: serde_json::Value) -> Self {
        Self {
            stages: Vec::new(),
            content,
        }
    }

    pub fn with_stages(mut self, stages: Vec<ActorAddr>) -> Self {
        self.stages = stages;
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// What ends up in the destination's mailbox.
#[derive(Clone)]
pub struct MailboxElement {
    pub id: MessageId,
    pub request_id: u64,
    pub sender: Option<ActorHandle>,
    pub stages: Vec<ActorHandle>,
    pub content: serde_json::Value,
}

impl fmt::Debug for MailboxElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxElement")
            .field("id", &self.id)
            .field("request_id", &self.request_id)
            .field("sender", &self.sender.as_ref().map(|s| s.addr()))
            .field(
                "stages",
                &self.stages.iter().map(|s| s.addr()).collect::<Vec<_>>(),
            )
            .field("content", &self.content)
            .finish()
    }
}
