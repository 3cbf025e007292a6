//! The spy: a scope's boundary agent.
//!
//! Every member of a scope is connected to its spy exactly as to any other
//! peer. Signals the spy accepts are handed to the owning scope; signals
//! the scope pushes inward leave through the spy.

use std::rc::Weak;

use tracing::trace;

use crate::agent::{Agent, AgentHandle, AgentId, Node};
use crate::capability::{Capabilities, KindSet};
use crate::signal::AnySignal;

/// Receiving side of a spy, implemented by [`Scope`](crate::scope::Scope).
pub(crate) trait Boundary {
    fn on_boundary_signal(&self, signal: &dyn AnySignal, from: AgentId);

    fn outer_handle(&self) -> Option<AgentHandle>;
}

/// Agent exclusively owned by a scope, representing the scope's boundary.
pub struct Spy {
    node: Node,
    /// Kinds confined to the owning scope.
    local: KindSet,
    owner: Weak<dyn Boundary>,
}

impl Spy {
    pub(crate) fn new(
        label: impl Into<String>,
        capabilities: Capabilities,
        local: KindSet,
        owner: Weak<dyn Boundary>,
    ) -> Self {
        Self {
            node: Node::new(label, capabilities),
            local,
            owner,
        }
    }

    pub fn id(&self) -> AgentId {
        self.node.id()
    }

    /// Wire an agent to the boundary without making it a member.
    pub fn connect(&self, agent: &AgentHandle) -> bool {
        self.node.connect_within(agent.node(), &self.local)
    }

    pub fn disconnect(&self, agent: &AgentHandle) -> bool {
        self.node.disconnect(agent.node())
    }

    pub fn is_connected(&self, agent: &AgentHandle) -> bool {
        self.node.is_connected(agent.id())
    }

    /// Send a signal inward, to every connected agent that accepts it.
    pub fn send(&self, signal: &dyn AnySignal) -> usize {
        self.node.send(signal)
    }

    /// Outer handle of the owning scope, i.e. the identity the scope shows
    /// its parent.
    pub fn owner(&self) -> Option<AgentHandle> {
        self.owner.upgrade()?.outer_handle()
    }
}

impl Agent for Spy {
    fn node(&self) -> &Node {
        &self.node
    }

    fn on_signal(&self, signal: &dyn AnySignal, from: AgentId) {
        match self.owner.upgrade() {
            Some(owner) => owner.on_boundary_signal(signal, from),
            None => trace!(event = "spy.orphaned", spy = %self.node.id(), kind = %signal.kind()),
        }
    }
}
