//! Scopes: composite agents owning a fully connected membership.
//!
//! A [`Scope`] is an [`Agent`] to its own parent while fanning signals out
//! to, and in from, its members. It keeps the following invariant across
//! every `add` / `remove`: each pair of members, and each member with the
//! scope's [`Spy`], shares a live bidirectional edge.
//!
//! # Module layout
//!
//! - [`behavior`]: `ScopeBehavior`, `Filtered`
//! - [`spy`]: `Spy`, the boundary agent
//!
//! # Routing
//!
//! - down: a kind the scope's outer peers send and `passes_down` declares
//!   goes through `filter_down` (if declared in `filters_down`) and then out
//!   of the spy to every member accepting it
//! - up: a kind a member sends and `passes_up` declares reaches the spy,
//!   goes through `filter_up` (if declared in `filters_up`) and is re-sent
//!   to the scope's outer peers
//! - inner: `AddAgent`, `RemoveAgent` and `accepts_inner` kinds reaching the
//!   spy are consumed by the scope itself and never cross the boundary
//!
//! Edges inside a scope are wired with the scope's local kinds, so a member
//! that is itself a scope receives its parent's inner traffic through
//! [`Agent::on_local_signal`] and keeps it away from its own members.

pub mod behavior;
pub mod spy;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::agent::{Agent, AgentHandle, AgentId, Node};
use crate::capability::{KindSet, ScopeChannels};
use crate::metrics::METRICS;
use crate::obs::{self, ScopeSpan};
use crate::signal::{AddAgent, AgentAdded, AnySignal, RemoveAgent};

pub use behavior::{Filtered, ScopeBehavior};
pub use spy::Spy;

use spy::Boundary;

#[derive(Debug, Clone, Copy)]
enum Direction {
    Down,
    Up,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
        }
    }
}

/// Container of agents that is itself an agent.
pub struct Scope<B: ScopeBehavior = ()> {
    node: Node,
    channels: ScopeChannels,
    local: KindSet,
    spy: Rc<Spy>,
    members: RefCell<BTreeMap<AgentId, AgentHandle>>,
    behavior: B,
}

impl Scope<()> {
    /// A plain routing scope with no filters or reactions of its own.
    pub fn new(label: impl Into<String>, channels: ScopeChannels) -> Rc<Self> {
        Self::with_behavior(label, channels, ())
    }
}

impl<B: ScopeBehavior> Scope<B> {
    /// Build an empty scope with a fresh spy.
    pub fn with_behavior(label: impl Into<String>, channels: ScopeChannels, behavior: B) -> Rc<Self> {
        let label = label.into();
        Rc::new_cyclic(|this: &Weak<Self>| {
            let outer: Weak<dyn Agent> = this.clone();
            let owner: Weak<dyn Boundary> = this.clone();

            let node = Node::new(label.clone(), channels.outer());
            node.bind(outer);

            let local = channels.local_kinds();
            let spy = Rc::new(Spy::new(
                format!("{label}/spy"),
                channels.boundary(),
                local.clone(),
                owner,
            ));
            let spy_agent: Weak<Spy> = Rc::downgrade(&spy);
            spy.node().bind(spy_agent);

            Self {
                node,
                channels,
                local,
                spy,
                members: RefCell::new(BTreeMap::new()),
                behavior,
            }
        })
    }

    pub fn id(&self) -> AgentId {
        self.node.id()
    }

    pub fn label(&self) -> &str {
        self.node.label()
    }

    pub fn channels(&self) -> &ScopeChannels {
        &self.channels
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// The scope's outer identity, usable anywhere an agent is expected.
    pub fn handle(self: &Rc<Self>) -> AgentHandle {
        AgentHandle::from_rc(Rc::clone(self))
    }

    /// The scope's boundary conduit.
    pub fn spy(&self) -> &Spy {
        &self.spy
    }

    /// Add an agent to this scope.
    ///
    /// Returns `false` without effect if the agent is already a member, is
    /// this scope or its spy, or already encloses this scope (which would
    /// make the nesting cyclic). Otherwise the agent is wired to every member
    /// and to the spy before it becomes a member, then introduced to its own
    /// handle, then announced inward with [`AgentAdded`].
    pub fn add(&self, agent: &AgentHandle) -> bool {
        if agent.id() == self.id() || agent.id() == self.spy.id() {
            obs::emit_add_rejected(self.label(), agent.id(), "scope cannot contain itself");
            return false;
        }
        if self.contains(agent) {
            obs::emit_add_rejected(self.label(), agent.id(), "already a member");
            return false;
        }
        if agent.encloses(self.id()) {
            obs::emit_add_rejected(self.label(), agent.id(), "agent encloses this scope");
            return false;
        }

        for member in self.members() {
            member.node().connect_within(agent.node(), &self.local);
        }
        self.spy.connect(agent);

        self.members.borrow_mut().insert(agent.id(), agent.clone());

        agent.introduce();

        METRICS.inc_agents_added();
        obs::emit_agent_added(self.label(), agent.id(), self.size());
        self.spy.send(&AgentAdded::new(agent.clone()));
        true
    }

    /// Remove an agent from this scope.
    ///
    /// Returns `false` without effect if the agent is not a member.
    /// Otherwise every edge between the agent and the remaining members and
    /// the spy is torn down before the agent leaves the membership.
    ///
    /// Edges are shared: if the agent is also a member of another scope
    /// together with one of this scope's members, that edge is torn down as
    /// well, and the other scope's mesh is no longer complete.
    pub fn remove(&self, agent: &AgentHandle) -> bool {
        if !self.contains(agent) {
            return false;
        }

        for member in self.members() {
            if member.id() != agent.id() {
                member.disconnect(agent);
            }
        }
        self.spy.disconnect(agent);

        let removed = self.members.borrow_mut().remove(&agent.id());
        drop(removed);

        METRICS.inc_agents_removed();
        obs::emit_agent_removed(self.label(), agent.id(), self.size());
        true
    }

    /// Number of members.
    pub fn size(&self) -> usize {
        self.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }

    pub fn contains(&self, agent: &AgentHandle) -> bool {
        self.members.borrow().contains_key(&agent.id())
    }

    /// Snapshot of the members, in dispatch order.
    pub fn members(&self) -> Vec<AgentHandle> {
        self.members.borrow().values().cloned().collect()
    }

    /// Built-in reaction to a scope-local [`AddAgent`].
    pub fn on_inner_signal(&self, signal: &AddAgent) -> bool {
        self.add(signal.agent())
    }

    /// Send a signal to this scope's outer peers.
    pub fn send(&self, signal: &dyn AnySignal) -> usize {
        self.node.send(signal)
    }

    /// Send a scope-local signal to the members.
    ///
    /// If the scope itself consumes the kind (`AddAgent`, `RemoveAgent`, or
    /// an `accepts_inner` kind) it handles the signal too, after the members.
    pub fn send_inner(&self, signal: &dyn AnySignal) -> usize {
        let delivered = self.spy.send(signal);
        self.handle_inner(signal, self.id());
        delivered
    }

    /// Whether the full-mesh invariant currently holds.
    pub fn is_fully_connected(&self) -> bool {
        let members = self.members();
        let spy = self.spy.node();
        members.iter().all(|member| {
            let node = member.node();
            spy.is_connected(member.id())
                && node.is_connected(spy.id())
                && members
                    .iter()
                    .filter(|other| other.id() != member.id())
                    .all(|other| node.is_connected(other.id()))
        })
    }

    /// Consume a scope-local signal. Returns whether the scope handled it.
    fn handle_inner(&self, signal: &dyn AnySignal, from: AgentId) -> bool {
        if let Some(request) = signal.downcast_ref::<AddAgent>() {
            self.on_inner_signal(request);
            return true;
        }
        if let Some(request) = signal.downcast_ref::<RemoveAgent>() {
            self.remove(request.agent());
            return true;
        }
        if self.channels.accepts_inner.contains(signal.kind()) {
            self.behavior.on_inner_signal(self, signal, from);
            return true;
        }
        false
    }

    /// Offer `signal` to the filter of `direction`, if the kind is declared
    /// there. `None` means the signal was suppressed.
    fn apply_filter<'a>(
        &self,
        direction: Direction,
        signal: &'a dyn AnySignal,
        replacement: &'a mut Option<Box<dyn AnySignal>>,
    ) -> Option<&'a dyn AnySignal> {
        let kind = signal.kind();
        let declared = match direction {
            Direction::Down => &self.channels.filters_down,
            Direction::Up => &self.channels.filters_up,
        };
        if !declared.contains(kind) {
            return Some(signal);
        }

        let outcome = match direction {
            Direction::Down => self.behavior.filter_down(self, signal),
            Direction::Up => self.behavior.filter_up(self, signal),
        };
        match outcome {
            Filtered::Pass => Some(signal),
            Filtered::Replace(next) if !next.is_nothing() => {
                obs::emit_signal_filtered(self.label(), direction.as_str(), kind, next.kind());
                Some(&**replacement.insert(next))
            }
            Filtered::Replace(_) | Filtered::Suppress => {
                METRICS.inc_suppressed();
                obs::emit_signal_suppressed(self.label(), direction.as_str(), kind);
                None
            }
        }
    }

    fn route_up(&self, signal: &dyn AnySignal) {
        let mut replacement = None;
        let Some(signal) = self.apply_filter(Direction::Up, signal, &mut replacement) else {
            return;
        };
        if self.channels.forwards_up(signal.kind()) {
            self.node.send(signal);
        }
    }

    fn route_down(&self, signal: &dyn AnySignal) {
        let mut replacement = None;
        let Some(signal) = self.apply_filter(Direction::Down, signal, &mut replacement) else {
            return;
        };
        if self.channels.forwards_down(signal.kind()) {
            self.spy.send(signal);
        }
    }
}

impl<B: ScopeBehavior> Agent for Scope<B> {
    fn node(&self) -> &Node {
        &self.node
    }

    fn on_signal(&self, signal: &dyn AnySignal, from: AgentId) {
        let _span = ScopeSpan::enter(self.id(), self.label());
        if self.channels.accepts.contains(signal.kind()) {
            self.behavior.on_signal(self, signal, from);
        }
        self.route_down(signal);
    }

    fn on_local_signal(&self, signal: &dyn AnySignal, from: AgentId) {
        let _span = ScopeSpan::enter(self.id(), self.label());
        // Confined to the enclosing scope: react, never pass down.
        if self.channels.accepts.contains(signal.kind()) {
            self.behavior.on_signal(self, signal, from);
        }
    }

    fn encloses(&self, id: AgentId) -> bool {
        self.members()
            .iter()
            .any(|member| member.id() == id || member.encloses(id))
    }
}

impl<B: ScopeBehavior> Boundary for Scope<B> {
    fn on_boundary_signal(&self, signal: &dyn AnySignal, from: AgentId) {
        let _span = ScopeSpan::enter(self.id(), self.label());
        if self.handle_inner(signal, from) {
            return;
        }
        self.route_up(signal);
    }

    fn outer_handle(&self) -> Option<AgentHandle> {
        self.node.handle()
    }
}

impl<B: ScopeBehavior> Drop for Scope<B> {
    fn drop(&mut self) {
        self.spy.node().disconnect_all();
        self.node.disconnect_all();
    }
}

impl<B: ScopeBehavior> fmt::Debug for Scope<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("members", &self.members.borrow().keys().collect::<Vec<_>>())
            .field("channels", &self.channels)
            .finish()
    }
}
