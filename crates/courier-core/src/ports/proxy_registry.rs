//! ProxyRegistry port - remote actor を local proxy に解決する
//!
//! # 設計原則
//! - 多数の worker から同時に読まれる（`Send + Sync`）
//! - 初回解決時に proxy を作成してよいが、同じ (node, actor) には高々 1 つ

use crate::domain::{ActorHandle, ActorId, NodeId};

pub trait ProxyRegistry: Send + Sync {
    /// Proxy for `actor` living on `node`, created on first use.
    ///
    /// Returns `None` for `ActorId::INVALID` or when the registry refuses to
    /// create proxies for `node`.
    fn resolve(&self, node: NodeId, actor: ActorId) -> Option<ActorHandle>;
}
