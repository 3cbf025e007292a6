//! Capability descriptors.
//!
//! An agent's capabilities are static configuration: they decide which
//! signal kinds may travel over an edge, never the shape of the graph.
//!
//! - [`KindSet`]: a set of signal kinds, or the `Signal` supertype
//! - [`Capabilities`]: the `provides` / `accepts` ports every agent has
//! - [`ScopeChannels`]: the eight channels a scope declares, from which the
//!   ports of the scope and of its spy are derived

use std::collections::BTreeSet;
use std::fmt;

use crate::signal::{AddAgent, AgentAdded, RemoveAgent, Signal, SignalKind};

/// A set of signal kinds.
///
/// `KindSet::any()` stands for the `Signal` supertype and matches every
/// kind except [`Nothing`](crate::signal::Nothing), which never matches.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KindSet {
    any: bool,
    kinds: BTreeSet<SignalKind>,
}

impl KindSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The `Signal` supertype: matches every concrete kind.
    pub fn any() -> Self {
        Self {
            any: true,
            kinds: BTreeSet::new(),
        }
    }

    /// A set holding exactly kind `S`.
    pub fn of<S: Signal>() -> Self {
        Self::empty().with::<S>()
    }

    /// Add kind `S` to the set.
    pub fn with<S: Signal>(mut self) -> Self {
        self.insert(SignalKind::of::<S>());
        self
    }

    pub fn insert(&mut self, kind: SignalKind) {
        if !kind.is_nothing() {
            self.kinds.insert(kind);
        }
    }

    /// Whether `kind` is matched by this set.
    pub fn contains(&self, kind: SignalKind) -> bool {
        !kind.is_nothing() && (self.any || self.kinds.contains(&kind))
    }

    /// Whether this set is the `Signal` supertype.
    pub fn is_any(&self) -> bool {
        self.any
    }

    pub fn is_empty(&self) -> bool {
        !self.any && self.kinds.is_empty()
    }

    /// Explicitly listed kinds, in a stable order.
    pub fn kinds(&self) -> impl Iterator<Item = SignalKind> + '_ {
        self.kinds.iter().copied()
    }

    pub fn union(&self, other: &KindSet) -> KindSet {
        KindSet {
            any: self.any || other.any,
            kinds: self.kinds.union(&other.kinds).copied().collect(),
        }
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any {
            return f.write_str("{Signal}");
        }
        f.debug_set().entries(self.kinds.iter().map(|k| k.name())).finish()
    }
}

/// Outer ports of an agent: what it emits and what it consumes as a peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub provides: KindSet,
    pub accepts: KindSet,
}

impl Capabilities {
    /// No ports at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that the agent emits kind `S`.
    pub fn provides<S: Signal>(mut self) -> Self {
        self.provides.insert(SignalKind::of::<S>());
        self
    }

    /// Declare that the agent consumes kind `S`.
    pub fn accepts<S: Signal>(mut self) -> Self {
        self.accepts.insert(SignalKind::of::<S>());
        self
    }

    pub fn can_send(&self, kind: SignalKind) -> bool {
        self.provides.contains(kind)
    }

    pub fn can_receive(&self, kind: SignalKind) -> bool {
        self.accepts.contains(kind)
    }
}

/// Channel declarations of a scope.
///
/// Defaults: `passes_down` is the `Signal` supertype, every other channel is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeChannels {
    /// Kinds broadcast from the scope's outer peers down to its members.
    pub passes_down: KindSet,
    /// Kinds emitted by members and re-emitted to the scope's outer peers.
    pub passes_up: KindSet,
    /// Kinds offered to the scope's filter on their way down.
    pub filters_down: KindSet,
    /// Kinds offered to the scope's filter on their way up.
    pub filters_up: KindSet,
    /// Scope-local kinds the scope itself emits to its members.
    pub provides_inner: KindSet,
    /// Scope-local kinds the scope itself consumes from its members.
    pub accepts_inner: KindSet,
    /// Kinds the scope emits as a peer of its parent-level graph.
    pub provides: KindSet,
    /// Kinds the scope consumes as a peer of its parent-level graph.
    pub accepts: KindSet,
}

impl Default for ScopeChannels {
    fn default() -> Self {
        Self {
            passes_down: KindSet::any(),
            passes_up: KindSet::empty(),
            filters_down: KindSet::empty(),
            filters_up: KindSet::empty(),
            provides_inner: KindSet::empty(),
            accepts_inner: KindSet::empty(),
            provides: KindSet::empty(),
            accepts: KindSet::empty(),
        }
    }
}

impl ScopeChannels {
    /// Ports of the scope as seen by its outer peers.
    pub fn outer(&self) -> Capabilities {
        Capabilities {
            provides: self.provides.union(&self.passes_up),
            accepts: self
                .accepts
                .union(&self.passes_down)
                .union(&self.filters_down),
        }
    }

    /// Ports of the scope's spy as seen by the scope's members.
    pub fn boundary(&self) -> Capabilities {
        Capabilities {
            provides: self
                .passes_down
                .union(&self.provides_inner)
                .union(&KindSet::of::<AgentAdded>()),
            accepts: self
                .accepts_inner
                .union(&self.passes_up)
                .union(&self.filters_up)
                .union(&KindSet::of::<AddAgent>().with::<RemoveAgent>()),
        }
    }

    /// Every kind confined to this scope's membership.
    pub fn local_kinds(&self) -> KindSet {
        KindSet::of::<AddAgent>()
            .with::<AgentAdded>()
            .with::<RemoveAgent>()
            .union(&self.provides_inner)
            .union(&self.accepts_inner)
    }

    /// Whether `kind` is confined to this scope's membership.
    pub fn is_scope_local(&self, kind: SignalKind) -> bool {
        kind.is_builtin_scope_local()
            || self.provides_inner.contains(kind)
            || self.accepts_inner.contains(kind)
    }

    /// Whether a signal of `kind` arriving from outside continues to members.
    pub fn forwards_down(&self, kind: SignalKind) -> bool {
        self.passes_down.contains(kind) && !self.is_scope_local(kind)
    }

    /// Whether a signal of `kind` emitted by a member continues outward.
    pub fn forwards_up(&self, kind: SignalKind) -> bool {
        self.passes_up.contains(kind) && !self.is_scope_local(kind)
    }
}
