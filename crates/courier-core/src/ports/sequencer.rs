//! Sequencer port - メッセージ連番の払い出しと順序復元
//!
//! Workers finish in any order. The sequencer hands out one id per launch and
//! later receives the decoded element (or a skip) under that id, so it can
//! deliver in id order downstream.

use crate::domain::{ActorHandle, MailboxElement, MessageId, NodeId};

/// Sequencer は launch ごとに単調増加の MessageId を払い出す
///
/// # Thread Safety
/// - `Send + Sync` を要求（I/O スレッドと scheduler スレッドから同時に呼ばれる）
/// - `next_id` は strictly monotonic。連続である必要はない
pub trait Sequencer: Send + Sync {
    /// Draw the id for a message about to be launched.
    fn next_id(&self) -> MessageId;

    /// Hand over the decoded element for `id`.
    ///
    /// `origin` is the peer the message came from; it only ends up in
    /// failure reports.
    fn push(&self, id: MessageId, origin: NodeId, receiver: ActorHandle, element: MailboxElement);

    /// Declare that no element will ever arrive for `id`.
    fn skip(&self, id: MessageId);
}
