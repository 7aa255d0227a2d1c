//! courier-core
//!
//! Pool of reusable workers that decode inbound remote messages and hand them
//! to local actors in sequence order.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, header, payload, worker state, errors）
//! - **ports**: 外部コラボレーターの抽象化（Sequencer, ProxyRegistry, Scheduler, ErrorSink）
//! - **impls**: ports の参照実装（MessageQueue, InMemoryProxyRegistry, TokioScheduler など）
//! - **app**: worker / hub / builder / config / status
//! - **system**: local actor table と scheduler をまとめた runtime handle
//! - **observability**: tracing の初期化

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{HubBuilder, WorkerHandle, WorkerHub};
pub use system::ActorSystem;
