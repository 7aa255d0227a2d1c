//! Domain model (ids, header, payload, worker state, errors).

pub mod actor;
pub mod errors;
pub mod header;
pub mod ids;
pub mod state;

pub use self::actor::{Actor, ActorHandle, MailboxElement, WirePayload};
pub use self::errors::{ContractViolation, DeliveryError, DeliveryReport};
pub use self::header::{Header, MessageType};
pub use self::ids::{ActorAddr, ActorId, MessageId, NodeId};
pub use self::state::WorkerState;
