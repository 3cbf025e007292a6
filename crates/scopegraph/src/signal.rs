//! Signal taxonomy.
//!
//! Every message exchanged between agents is a concrete type implementing
//! [`Signal`]. Dispatch is type-directed: a receiver reacts to the concrete
//! kind it declared interest in, identified by its [`SignalKind`].
//!
//! Built-in kinds:
//! - [`Nothing`]: explicit "no signal" placeholder, never delivered
//! - [`AddAgent`]: scope-local request to insert an agent
//! - [`AgentAdded`]: scope-local notice that an insertion completed
//! - [`RemoveAgent`]: scope-local request to remove a member

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::agent::AgentHandle;

/// Marker for every concrete signal kind.
///
/// Signals are immutable once constructed; receivers only ever see them by
/// shared reference.
pub trait Signal: fmt::Debug + 'static {}

/// Object-safe view of a [`Signal`], blanket-implemented for every kind.
pub trait AnySignal: fmt::Debug + 'static {
    fn as_any(&self) -> &dyn Any;

    /// The concrete kind of this signal.
    fn kind(&self) -> SignalKind;
}

impl<S: Signal> AnySignal for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn kind(&self) -> SignalKind {
        SignalKind::of::<S>()
    }
}

impl dyn AnySignal {
    /// Borrow the signal as its concrete kind, if it is one.
    pub fn downcast_ref<S: Signal>(&self) -> Option<&S> {
        self.as_any().downcast_ref::<S>()
    }

    /// Whether the signal is of kind `S`.
    pub fn is<S: Signal>(&self) -> bool {
        self.as_any().is::<S>()
    }

    /// Whether the signal is the [`Nothing`] placeholder.
    pub fn is_nothing(&self) -> bool {
        self.is::<Nothing>()
    }
}

/// Identity of a concrete signal type.
///
/// Equality, ordering and hashing use the `TypeId` only; the name is carried
/// for logs and configuration.
#[derive(Clone, Copy)]
pub struct SignalKind {
    id: TypeId,
    name: &'static str,
}

impl SignalKind {
    /// The kind of signal type `S`.
    pub fn of<S: Signal>() -> Self {
        let full = std::any::type_name::<S>();
        // Keep generic arguments intact; only strip the leading module path.
        let head = full.split('<').next().unwrap_or(full);
        let start = head.rfind("::").map(|i| i + 2).unwrap_or(0);
        Self {
            id: TypeId::of::<S>(),
            name: &full[start..],
        }
    }

    /// Short type name, e.g. `"AddAgent"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_nothing(&self) -> bool {
        self.id == TypeId::of::<Nothing>()
    }

    /// Built-in kinds that never cross a scope boundary.
    pub fn is_builtin_scope_local(&self) -> bool {
        self.id == TypeId::of::<AddAgent>()
            || self.id == TypeId::of::<AgentAdded>()
            || self.id == TypeId::of::<RemoveAgent>()
    }
}

impl PartialEq for SignalKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SignalKind {}

impl Hash for SignalKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for SignalKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SignalKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalKind({})", self.name)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A symbol representing no signal.
///
/// Usable wherever generic code needs a placeholder (e.g. a filter
/// suppressing a signal). Sending `Nothing` is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nothing;

impl Signal for Nothing {}

/// Request to add an agent to the current scope.
#[derive(Debug, Clone)]
pub struct AddAgent {
    agent: AgentHandle,
}

impl AddAgent {
    pub fn new(agent: AgentHandle) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }
}

impl Signal for AddAgent {}

/// Notification that an agent was added to the current scope.
#[derive(Debug, Clone)]
pub struct AgentAdded {
    agent: AgentHandle,
}

impl AgentAdded {
    pub fn new(agent: AgentHandle) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }
}

impl Signal for AgentAdded {}

/// Request to remove an agent from the current scope.
///
/// Typically sent by a member about itself, using the handle it received
/// through [`Agent::introduce_as`](crate::agent::Agent::introduce_as).
#[derive(Debug, Clone)]
pub struct RemoveAgent {
    agent: AgentHandle,
}

impl RemoveAgent {
    pub fn new(agent: AgentHandle) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }
}

impl Signal for RemoveAgent {}
