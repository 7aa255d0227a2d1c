//! InMemoryProxyRegistry - DashMap ベースの ProxyRegistry
//!
//! # 学習ポイント
//! - `DashMap::entry` は shard をロックするので、同じキーへの同時 resolve
//!   でも factory は 1 回しか呼ばれない
//! - proxy の実体は `ProxyFactory` で差し替え可能

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::domain::{Actor, ActorAddr, ActorHandle, ActorId, MailboxElement, NodeId};
use crate::ports::ProxyRegistry;

/// Creates the local stand-in for a remote actor.
pub trait ProxyFactory: Send + Sync {
    fn make_proxy(&self, node: NodeId, actor: ActorId) -> ActorHandle;
}

impl<F> ProxyFactory for F
where
    F: Fn(NodeId, ActorId) -> ActorHandle + Send + Sync,
{
    fn make_proxy(&self, node: NodeId, actor: ActorId) -> ActorHandle {
        self(node, actor)
    }
}

/// A message a proxy wants to send back over the wire.
#[derive(Debug)]
pub struct OutboundMessage {
    pub to: ActorAddr,
    pub element: MailboxElement,
}

/// Proxy that forwards everything enqueued to an outbound channel.
///
/// Without a channel (no transport attached) messages are dropped.
pub struct RemoteProxy {
    addr: ActorAddr,
    outbound: Option<mpsc::UnboundedSender<OutboundMessage>>,
}

impl RemoteProxy {
    pub fn new(addr: ActorAddr, outbound: Option<mpsc::UnboundedSender<OutboundMessage>>) -> Self {
        Self { addr, outbound }
    }
}

impl Actor for RemoteProxy {
    fn id(&self) -> ActorId {
        self.addr.actor
    }

    fn node(&self) -> NodeId {
        self.addr.node
    }

    fn enqueue(&self, element: MailboxElement) {
        let Some(outbound) = &self.outbound else {
            trace!(proxy = %self.addr, message_id = %element.id, "no transport attached, dropping");
            return;
        };
        let msg = OutboundMessage {
            to: self.addr,
            element,
        };
        if outbound.send(msg).is_err() {
            debug!(proxy = %self.addr, "outbound channel closed");
        }
    }
}

/// Default factory: `RemoteProxy` bound to an optional outbound channel.
#[derive(Default, Clone)]
pub struct ForwardingProxyFactory {
    outbound: Option<mpsc::UnboundedSender<OutboundMessage>>,
}

impl ForwardingProxyFactory {
    pub fn new(outbound: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            outbound: Some(outbound),
        }
    }

    pub fn detached() -> Self {
        Self::default()
    }
}

impl ProxyFactory for ForwardingProxyFactory {
    fn make_proxy(&self, node: NodeId, actor: ActorId) -> ActorHandle {
        Arc::new(RemoteProxy::new(
            ActorAddr::new(node, actor),
            self.outbound.clone(),
        ))
    }
}

/// Proxy table keyed by (node, actor).
pub struct InMemoryProxyRegistry {
    proxies: DashMap<(NodeId, ActorId), ActorHandle>,
    factory: Box<dyn ProxyFactory>,
}

impl InMemoryProxyRegistry {
    pub fn new(factory: impl ProxyFactory + 'static) -> Self {
        Self {
            proxies: DashMap::new(),
            factory: Box::new(factory),
        }
    }

    /// Registry whose proxies drop everything (no transport).
    pub fn detached() -> Self {
        Self::new(ForwardingProxyFactory::detached())
    }

    /// Existing proxy, never creates one.
    pub fn get(&self, node: NodeId, actor: ActorId) -> Option<ActorHandle> {
        self.proxies.get(&(node, actor)).map(|p| Arc::clone(p.value()))
    }

    pub fn erase(&self, node: NodeId, actor: ActorId) -> Option<ActorHandle> {
        self.proxies.remove(&(node, actor)).map(|(_, proxy)| proxy)
    }

    /// Drop every proxy of a node, e.g. after the connection to it is lost.
    pub fn erase_node(&self, node: NodeId) -> usize {
        let before = self.proxies.len();
        self.proxies.retain(|(n, _), _| *n != node);
        let removed = before.saturating_sub(self.proxies.len());
        debug!(%node, removed, "erased proxies of node");
        removed
    }

    pub fn count_for(&self, node: NodeId) -> usize {
        self.proxies.iter().filter(|e| e.key().0 == node).count()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

impl ProxyRegistry for InMemoryProxyRegistry {
    fn resolve(&self, node: NodeId, actor: ActorId) -> Option<ActorHandle> {
        if !actor.is_valid() {
            return None;
        }
        let proxy = self
            .proxies
            .entry((node, actor))
            .or_insert_with(|| {
                debug!(%node, %actor, "creating proxy");
                self.factory.make_proxy(node, actor)
            })
            .value()
            .clone();
        Some(proxy)
    }
}
