//! Ports - 外部コラボレーターとの境界
//!
//! worker / hub が呼び出す外部システムのインターフェースです。
//! 参照実装は `impls` にあります。
//!
//! - **Sequencer**: MessageId の払い出しと順序復元
//! - **ProxyRegistry**: (node, actor) → proxy handle
//! - **Scheduler**: Resumable を実行するスレッドプール
//! - **ErrorSink**: 配送失敗の報告先

pub mod error_sink;
pub mod proxy_registry;
pub mod scheduler;
pub mod sequencer;

pub use self::error_sink::ErrorSink;
pub use self::proxy_registry::ProxyRegistry;
pub use self::scheduler::{ExecutionUnit, ResumeResult, Resumable, Scheduler, Subtype};
pub use self::sequencer::Sequencer;
