//! Agents and their connections.
//!
//! Every agent owns a [`Node`]: its identity, its declared [`Capabilities`]
//! and the edges to its peers. Edges are bidirectional and weak on both
//! ends; strong ownership lives in [`AgentHandle`]s held by scopes and by
//! application code.
//!
//! Dispatch is synchronous. [`Node::send`] snapshots the peer list, then
//! visits peers in ascending [`AgentId`] order, skipping any peer that was
//! disconnected while the dispatch was running. Peers connected during the
//! dispatch are not visited by it.
//!
//! Edges wired by a scope remember which kinds are confined to that scope.
//! Those kinds arrive through [`Agent::on_local_signal`], so relaying agents
//! can tell them apart from ordinary traffic.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

use crate::capability::{Capabilities, KindSet};
use crate::metrics::METRICS;
use crate::signal::AnySignal;

/// Process-unique agent identifier, allocated in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u64);

impl AgentId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

/// One end of a bidirectional edge.
struct Edge {
    peer: Weak<dyn Agent>,
    /// Kinds confined to the scopes this edge was wired for.
    local: KindSet,
}

/// Identity, ports and peer edges of a single agent.
pub struct Node {
    id: AgentId,
    label: String,
    capabilities: Capabilities,
    peers: RefCell<BTreeMap<AgentId, Edge>>,
    this: RefCell<Option<Weak<dyn Agent>>>,
}

impl Node {
    pub fn new(label: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            id: AgentId::next(),
            label: label.into(),
            capabilities,
            peers: RefCell::new(BTreeMap::new()),
            this: RefCell::new(None),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Record the agent this node belongs to. Edges can only be created once
    /// a node is bound.
    pub(crate) fn bind(&self, this: Weak<dyn Agent>) {
        *self.this.borrow_mut() = Some(this);
    }

    fn this(&self) -> Option<Weak<dyn Agent>> {
        self.this.borrow().clone()
    }

    /// Shared handle of the owning agent, while it is alive.
    pub fn handle(&self) -> Option<AgentHandle> {
        self.this()?.upgrade().map(AgentHandle)
    }

    /// Establish a bidirectional edge. Returns `false` if the edge already
    /// existed, if `other` is this node, or if either node is unbound.
    pub fn connect(&self, other: &Node) -> bool {
        self.connect_within(other, &KindSet::empty())
    }

    /// Like [`Node::connect`], marking `local` as confined to the scope that
    /// wires the edge. Reconnecting widens the local set of an existing edge.
    pub(crate) fn connect_within(&self, other: &Node, local: &KindSet) -> bool {
        if self.id == other.id {
            return false;
        }
        let (Some(mine), Some(theirs)) = (self.this(), other.this()) else {
            warn!(
                event = "edge.unbound",
                from = %self.id,
                to = %other.id,
                "cannot connect a node that is not owned by an agent handle"
            );
            return false;
        };

        let fresh = !self.peers.borrow().contains_key(&other.id);
        attach(&self.peers, other.id, theirs, local);
        attach(&other.peers, self.id, mine, local);
        if fresh {
            trace!(event = "edge.connected", from = %self.id, to = %other.id);
        }
        fresh
    }

    /// Tear down the edge with `other`. A no-op returning `false` when the
    /// two nodes are not connected.
    pub fn disconnect(&self, other: &Node) -> bool {
        if self.id == other.id {
            return false;
        }
        let forward = self.peers.borrow_mut().remove(&other.id).is_some();
        let backward = other.peers.borrow_mut().remove(&self.id).is_some();
        if forward || backward {
            trace!(event = "edge.disconnected", from = %self.id, to = %other.id);
        }
        forward || backward
    }

    /// Tear down every edge of this node. Returns the number of edges removed.
    pub fn disconnect_all(&self) -> usize {
        let peers = std::mem::take(&mut *self.peers.borrow_mut());
        for peer in peers.values().filter_map(|edge| edge.peer.upgrade()) {
            peer.node().peers.borrow_mut().remove(&self.id);
        }
        peers.len()
    }

    /// Whether a live edge to `id` exists.
    pub fn is_connected(&self, id: AgentId) -> bool {
        self.peers
            .borrow()
            .get(&id)
            .is_some_and(|edge| edge.peer.strong_count() > 0)
    }

    /// Identifiers of live peers, in dispatch order.
    pub fn peer_ids(&self) -> Vec<AgentId> {
        self.peers
            .borrow()
            .iter()
            .filter(|(_, edge)| edge.peer.strong_count() > 0)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn peer_count(&self) -> usize {
        self.peer_ids().len()
    }

    /// Deliver `signal` to every connected peer that accepts its kind.
    ///
    /// Returns the number of peers that received it. `Nothing` and kinds this
    /// node does not provide are silently dropped.
    pub fn send(&self, signal: &dyn AnySignal) -> usize {
        let kind = signal.kind();
        if kind.is_nothing() {
            trace!(event = "signal.nothing", from = %self.id);
            return 0;
        }
        if !self.capabilities.can_send(kind) {
            trace!(event = "signal.undeclared", from = %self.id, kind = %kind);
            return 0;
        }
        METRICS.inc_signals_sent();

        let recipients: Vec<(AgentId, Rc<dyn Agent>, bool)> = self
            .peers
            .borrow()
            .iter()
            .filter_map(|(id, edge)| {
                let local = edge.local.contains(kind);
                edge.peer.upgrade().map(|peer| (*id, peer, local))
            })
            .collect();

        let mut delivered = 0;
        for (id, peer, local) in recipients {
            // Disconnected by an earlier recipient of this same dispatch.
            if !self.peers.borrow().contains_key(&id) {
                continue;
            }
            if !peer.node().capabilities().can_receive(kind) {
                continue;
            }
            trace!(event = "signal.delivered", from = %self.id, to = %id, kind = %kind, local);
            if local {
                peer.on_local_signal(signal, self.id);
            } else {
                peer.on_signal(signal, self.id);
            }
            METRICS.inc_deliveries();
            delivered += 1;
        }
        delivered
    }
}

fn attach(
    peers: &RefCell<BTreeMap<AgentId, Edge>>,
    id: AgentId,
    peer: Weak<dyn Agent>,
    local: &KindSet,
) {
    peers
        .borrow_mut()
        .entry(id)
        .and_modify(|edge| edge.local = edge.local.union(local))
        .or_insert_with(|| Edge {
            peer,
            local: local.clone(),
        });
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("capabilities", &self.capabilities)
            .field("peers", &self.peer_ids())
            .finish()
    }
}

/// A participant in the communication graph.
///
/// Implementors only supply their [`Node`] and, optionally, a reaction to
/// the signals their capabilities accept.
pub trait Agent: 'static {
    fn node(&self) -> &Node;

    /// Called by a connected peer delivering a signal this agent accepts.
    fn on_signal(&self, _signal: &dyn AnySignal, _from: AgentId) {}

    /// Called instead of [`Agent::on_signal`] for a kind confined to a scope
    /// this agent shares with the sender. Agents that relay traffic onward
    /// must not relay these.
    fn on_local_signal(&self, signal: &dyn AnySignal, from: AgentId) {
        self.on_signal(signal, from);
    }

    /// Whether the agent `id` is nested anywhere inside this agent.
    fn encloses(&self, _id: AgentId) -> bool {
        false
    }

    /// Informs the agent of its own shared handle, so that it can reference
    /// itself in the signals it emits.
    fn introduce_as(&self, handle: &AgentHandle) {
        self.node().bind(Rc::downgrade(&handle.0));
    }
}

/// Shared-ownership handle to an agent. Identity is the agent's [`AgentId`].
#[derive(Clone)]
pub struct AgentHandle(Rc<dyn Agent>);

impl AgentHandle {
    pub fn new<A: Agent>(agent: A) -> Self {
        Self::from_rc(Rc::new(agent))
    }

    /// Wrap an agent the caller already shares, keeping the caller's typed
    /// `Rc` usable.
    pub fn from_rc<A: Agent>(agent: Rc<A>) -> Self {
        let agent: Rc<dyn Agent> = agent;
        agent.node().bind(Rc::downgrade(&agent));
        Self(agent)
    }

    pub fn id(&self) -> AgentId {
        self.0.node().id()
    }

    pub fn label(&self) -> &str {
        self.0.node().label()
    }

    pub fn node(&self) -> &Node {
        self.0.node()
    }

    pub fn connect(&self, other: &AgentHandle) -> bool {
        self.node().connect(other.node())
    }

    pub fn disconnect(&self, other: &AgentHandle) -> bool {
        self.node().disconnect(other.node())
    }

    pub fn is_connected(&self, other: &AgentHandle) -> bool {
        self.node().is_connected(other.id())
    }

    /// Send `signal` from this agent to its interested peers.
    pub fn send(&self, signal: &dyn AnySignal) -> usize {
        self.node().send(signal)
    }

    /// Hand the agent its own handle.
    pub fn introduce(&self) {
        self.0.introduce_as(self);
    }

    /// Whether the agent `id` is nested anywhere inside this agent.
    pub fn encloses(&self, id: AgentId) -> bool {
        self.0.encloses(id)
    }

    /// Number of strong holders of the agent.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl PartialEq for AgentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for AgentHandle {}

impl std::hash::Hash for AgentHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AgentHandle")
            .field(&self.id())
            .field(&self.label())
            .finish()
    }
}
