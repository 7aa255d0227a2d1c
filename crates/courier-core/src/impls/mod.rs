//! Impls - ports の参照実装
//!
//! # 含まれる実装
//! - **MessageQueue**: id 順に配送する Sequencer
//! - **InMemoryProxyRegistry**: DashMap ベースの ProxyRegistry
//! - **TokioScheduler / InlineScheduler**: Scheduler
//! - **TracingErrorSink / CollectingErrorSink**: ErrorSink
//! - **ChannelActor**: mpsc を mailbox にした local actor

pub mod error_sink;
pub mod mailbox;
pub mod message_queue;
pub mod proxy_registry;
pub mod scheduler;

pub use self::error_sink::{CollectingErrorSink, TracingErrorSink};
pub use self::mailbox::ChannelActor;
pub use self::message_queue::MessageQueue;
pub use self::proxy_registry::{
    ForwardingProxyFactory, InMemoryProxyRegistry, OutboundMessage, ProxyFactory, RemoteProxy,
};
pub use self::scheduler::{DEFAULT_MAX_THROUGHPUT, InlineScheduler, TokioScheduler};
