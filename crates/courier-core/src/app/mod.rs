//! App - ports を組み合わせた worker pool
//!
//! # 主要コンポーネント
//! - **Worker / WorkerHandle**: 1 件の inbound メッセージを処理する再利用オブジェクト
//! - **WorkerHub**: idle worker のプール（acquire / launch / hand-back）
//! - **HubBuilder**: hub の構築と検証
//! - **CourierConfig**: 設定の読み込み
//! - **HubStatus**: カウンタのスナップショット

pub mod builder;
pub mod config;
pub mod hub;
pub mod status;
pub mod worker;

pub use self::builder::{BuildError, HubBuilder};
pub use self::config::{
    ConfigError, CourierConfig, HubConfig, OverflowPolicy, SchedulerConfig, default_capacity,
};
pub use self::hub::{HubError, WorkerHub};
pub use self::status::HubStatus;
pub use self::worker::{Worker, WorkerHandle};
