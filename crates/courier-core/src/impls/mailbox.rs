//! ChannelActor - tokio mpsc を mailbox にした local actor

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{Actor, ActorHandle, ActorId, MailboxElement, NodeId};

/// Local actor whose mailbox is an unbounded channel.
///
/// `enqueue` never blocks, so it is safe to call from scheduler threads.
pub struct ChannelActor {
    id: ActorId,
    node: NodeId,
    tx: mpsc::UnboundedSender<MailboxElement>,
}

impl ChannelActor {
    /// Returns the actor handle and the receiving end of its mailbox.
    pub fn spawn(node: NodeId, id: ActorId) -> (ActorHandle, mpsc::UnboundedReceiver<MailboxElement>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor: ActorHandle = Arc::new(Self { id, node, tx });
        (actor, rx)
    }
}

impl Actor for ChannelActor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn node(&self) -> NodeId {
        self.node
    }

    fn enqueue(&self, element: MailboxElement) {
        if self.tx.send(element).is_err() {
            debug!(actor = %self.id, "mailbox closed, message dropped");
        }
    }
}
