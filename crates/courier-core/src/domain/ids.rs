//! Domain identifiers (strongly-typed IDs).
//!
//! - `NodeId`: ULID ベースのノード識別子（phantom type `Id<Node>`）
//! - `ActorId`: ノード内の actor 番号。`0` は無効値
//! - `MessageId`: Sequencer が払い出す連番。配送順序の復元に使う
//!
//! ## Phantom Type パターン
//! `Id<T>` の `T` は実行時には使わないマーカー型です。
//! 将来ノード以外の ULID ID が増えても、型で混同を防げます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"node-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// Fresh random id (timestamp + entropy).
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Node のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {}

impl IdMarker for Node {
    fn prefix() -> &'static str {
        "node-"
    }
}

/// Identifier of a node (one runtime process in the cluster).
pub type NodeId = Id<Node>;

/// Identifier of an actor, unique within its node.
///
/// `ActorId::INVALID` (0) never names an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(u64);

impl ActorId {
    pub const INVALID: ActorId = ActorId(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Sequence number assigned to an inbound message at launch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Address of an actor anywhere in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorAddr {
    pub node: NodeId,
    pub actor: ActorId,
}

impl ActorAddr {
    pub fn new(node: NodeId, actor: ActorId) -> Self {
        Self { node, actor }
    }
}

impl fmt::Display for ActorAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_display_with_prefix() {
        let ulid = Ulid::new();
        let node = NodeId::from_ulid(ulid);
        assert_eq!(node.as_ulid(), ulid);
        assert!(node.to_string().starts_with("node-"));
    }

    #[test]
    fn node_ids_can_be_serialized() {
        let node = NodeId::generate();
        let serialized = serde_json::to_string(&node).unwrap();
        let deserialized: NodeId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(node, deserialized);
    }

    #[test]
    fn actor_id_zero_is_invalid() {
        assert!(!ActorId::INVALID.is_valid());
        assert!(!ActorId::new(0).is_valid());
        assert!(ActorId::new(42).is_valid());
    }

    #[test]
    fn message_ids_are_ordered() {
        let first = MessageId::new(7);
        assert!(first < first.next());
        assert_eq!(first.next().get(), 8);
    }

    #[test]
    fn actor_addr_is_transparent_on_the_wire() {
        let node = NodeId::generate();
        let addr = ActorAddr::new(node, ActorId::new(5));
        let json = serde_json::to_value(addr).unwrap();
        assert_eq!(json["actor"], serde_json::json!(5));
    }
}
