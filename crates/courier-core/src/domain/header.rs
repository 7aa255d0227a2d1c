//! Fixed-size message header as handed over by the wire parser.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::ContractViolation;
use super::ids::{ActorId, NodeId};

/// Operation carried by a header.
///
/// `#[repr(u8)]` matches the byte used by the parser; use `TryFrom<u8>` to
/// convert raw bytes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    ServerHandshake = 0,
    ClientHandshake = 1,
    /// A message for an actor on this node, sent by the peer itself.
    DirectMessage = 2,
    /// A message that may have crossed several hops; source and destination
    /// nodes are carried in the header.
    RoutedMessage = 3,
    MonitorMessage = 4,
    DownMessage = 5,
    Heartbeat = 6,
}

impl MessageType {
    /// Only these operations are handed to workers.
    pub fn is_deliverable(self) -> bool {
        matches!(self, MessageType::DirectMessage | MessageType::RoutedMessage)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let op = match value {
            0 => MessageType::ServerHandshake,
            1 => MessageType::ClientHandshake,
            2 => MessageType::DirectMessage,
            3 => MessageType::RoutedMessage,
            4 => MessageType::MonitorMessage,
            5 => MessageType::DownMessage,
            6 => MessageType::Heartbeat,
            other => return Err(other),
        };
        Ok(op)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::ServerHandshake => "server_handshake",
            MessageType::ClientHandshake => "client_handshake",
            MessageType::DirectMessage => "direct_message",
            MessageType::RoutedMessage => "routed_message",
            MessageType::MonitorMessage => "monitor_message",
            MessageType::DownMessage => "down_message",
            MessageType::Heartbeat => "heartbeat",
        };
        f.write_str(name)
    }
}

/// Header of an inbound message.
///
/// `Copy` on purpose: a worker keeps its own byte-exact copy so the parser can
/// reuse its buffers while the message is still scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub operation: MessageType,
    pub flags: u8,
    pub payload_len: u32,
    /// Request id of the message (0 for asynchronous messages).
    pub operation_data: u64,
    pub source_node: Option<NodeId>,
    pub dest_node: Option<NodeId>,
    pub source_actor: ActorId,
    pub dest_actor: ActorId,
}

impl Header {
    /// All-zero header; what an idle worker holds.
    pub fn empty() -> Self {
        Self {
            operation: MessageType::ServerHandshake,
            flags: 0,
            payload_len: 0,
            operation_data: 0,
            source_node: None,
            dest_node: None,
            source_actor: ActorId::INVALID,
            dest_actor: ActorId::INVALID,
        }
    }

    /// Header for a direct message between two actors.
    pub fn direct(source_actor: ActorId, dest_actor: ActorId, payload_len: u32) -> Self {
        Self {
            operation: MessageType::DirectMessage,
            flags: 0,
            payload_len,
            operation_data: 0,
            source_node: None,
            dest_node: None,
            source_actor,
            dest_actor,
        }
    }

    /// Header for a message relayed through one or more hops.
    pub fn routed(
        source: (NodeId, ActorId),
        dest: (NodeId, ActorId),
        payload_len: u32,
    ) -> Self {
        Self {
            operation: MessageType::RoutedMessage,
            flags: 0,
            payload_len,
            operation_data: 0,
            source_node: Some(source.0),
            dest_node: Some(dest.0),
            source_actor: source.1,
            dest_actor: dest.1,
        }
    }

    pub fn with_request_id(mut self, request_id: u64) -> Self {
        self.operation_data = request_id;
        self
    }

    /// Precondition of `launch`: the header must address an actor and carry a
    /// deliverable operation.
    pub fn check_deliverable(&self) -> Result<(), ContractViolation> {
        if !self.dest_actor.is_valid() {
            return Err(ContractViolation::InvalidDestination);
        }
        if !self.operation.is_deliverable() {
            return Err(ContractViolation::UndeliverableOperation(self.operation));
        }
        Ok(())
    }
}
