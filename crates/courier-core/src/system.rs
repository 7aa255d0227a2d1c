//! ActorSystem - worker から見た runtime handle
//!
//! Holds the local node id, the table of local actors, the scheduler and the
//! runtime's error channel.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;
use tracing::debug;

use crate::domain::{ActorAddr, ActorHandle, ActorId, DeliveryReport, NodeId};
use crate::impls::TracingErrorSink;
use crate::ports::{ErrorSink, ProxyRegistry, Scheduler};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("actor {0} is already registered")]
    AlreadyRegistered(ActorId),

    #[error("actor id 0 cannot be registered")]
    InvalidId,

    #[error("actor {0} does not live on this node")]
    ForeignNode(ActorAddr),
}

pub struct ActorSystem {
    node: NodeId,
    actors: DashMap<ActorId, ActorHandle>,
    scheduler: Arc<dyn Scheduler>,
    errors: Arc<dyn ErrorSink>,
}

impl ActorSystem {
    /// System reporting delivery failures through `tracing`.
    pub fn new(node: NodeId, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            node,
            actors: DashMap::new(),
            scheduler,
            errors: Arc::new(TracingErrorSink),
        }
    }

    pub fn with_error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.errors = errors;
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn error_sink(&self) -> &Arc<dyn ErrorSink> {
        &self.errors
    }

    /// Register a local actor under its own id.
    pub fn register(&self, actor: ActorHandle) -> Result<(), RegistryError> {
        let id = actor.id();
        if !id.is_valid() {
            return Err(RegistryError::InvalidId);
        }
        if actor.node() != self.node {
            return Err(RegistryError::ForeignNode(actor.addr()));
        }
        match self.actors.entry(id) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered(id)),
            Entry::Vacant(slot) => {
                slot.insert(actor);
                debug!(actor = %id, "registered local actor");
                Ok(())
            }
        }
    }

    pub fn unregister(&self, id: ActorId) -> Option<ActorHandle> {
        self.actors.remove(&id).map(|(_, actor)| actor)
    }

    pub fn local(&self, id: ActorId) -> Option<ActorHandle> {
        self.actors.get(&id).map(|a| Arc::clone(a.value()))
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Resolve an address: local actors from this system, remote ones through
    /// `proxies`.
    pub fn resolve(&self, addr: ActorAddr, proxies: &dyn ProxyRegistry) -> Option<ActorHandle> {
        if addr.node == self.node {
            self.local(addr.actor)
        } else {
            proxies.resolve(addr.node, addr.actor)
        }
    }

    /// Hand a delivery failure to the runtime's error channel.
    pub fn report(&self, report: DeliveryReport) {
        self.errors.report(report);
    }
}
