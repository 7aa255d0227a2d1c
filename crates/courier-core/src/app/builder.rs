//! HubBuilder - WorkerHub の構築とワイヤリング
//!
//! - sequencer / proxy registry は省略可能（MessageQueue / detached registry）
//! - build() 時に設定を検証（Fail-fast）

use std::sync::Arc;

use tracing::info;

use super::config::{ConfigError, HubConfig, OverflowPolicy};
use super::hub::WorkerHub;
use crate::impls::{InMemoryProxyRegistry, MessageQueue};
use crate::ports::{ProxyRegistry, Sequencer};
use crate::system::ActorSystem;

/// Builds a `WorkerHub`.
///
/// # 使用例
/// ```ignore
/// let hub = HubBuilder::new(system)
///     .config(config.hub)
///     .proxy_registry(registry)
///     .build()?;
/// ```
pub struct HubBuilder {
    system: Arc<ActorSystem>,
    config: HubConfig,
    proxies: Option<Arc<dyn ProxyRegistry>>,
    sequencer: Option<Arc<dyn Sequencer>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl HubBuilder {
    pub fn new(system: Arc<ActorSystem>) -> Self {
        Self {
            system,
            config: HubConfig::default(),
            proxies: None,
            sequencer: None,
        }
    }

    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.config.overflow = overflow;
        self
    }

    pub fn proxy_registry(mut self, proxies: Arc<dyn ProxyRegistry>) -> Self {
        self.proxies = Some(proxies);
        self
    }

    pub fn sequencer(mut self, sequencer: Arc<dyn Sequencer>) -> Self {
        self.sequencer = Some(sequencer);
        self
    }

    /// Validate the configuration and create the hub.
    ///
    /// Workers are not allocated here; the first `acquire` does that.
    pub fn build(self) -> Result<WorkerHub, BuildError> {
        self.config.validate()?;
        let proxies = self
            .proxies
            .unwrap_or_else(|| Arc::new(InMemoryProxyRegistry::detached()));
        let sequencer = self.sequencer.unwrap_or_else(|| {
            Arc::new(MessageQueue::new().with_error_sink(Arc::clone(self.system.error_sink())))
        });
        info!(
            node = %self.system.node(),
            capacity = self.config.capacity,
            overflow = ?self.config.overflow,
            "worker hub ready"
        );
        Ok(WorkerHub::new(&self.config, self.system, proxies, sequencer))
    }
}
