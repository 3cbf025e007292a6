//! Pluggable per-scope policy: filters and reactions.

use crate::agent::AgentId;
use crate::scope::Scope;
use crate::signal::{AnySignal, Signal};

/// Outcome of offering a signal to a scope's filter.
#[derive(Debug)]
pub enum Filtered {
    /// Continue with the original signal.
    Pass,
    /// Continue with a different signal instead. Replacing with
    /// [`Nothing`](crate::signal::Nothing) suppresses.
    Replace(Box<dyn AnySignal>),
    /// Stop the signal here.
    Suppress,
}

impl Filtered {
    pub fn replace<S: Signal>(signal: S) -> Self {
        Filtered::Replace(Box::new(signal))
    }
}

/// Behaviour a scope applies to the signals crossing it.
///
/// Every method has a pass-through default, so `()` is the behaviour of a
/// plain routing scope. Filters are only consulted for kinds declared in
/// the matching `filters_down` / `filters_up` channel, reactions only for
/// kinds declared in `accepts` / `accepts_inner`.
pub trait ScopeBehavior: Sized + 'static {
    /// Intercept a signal travelling from the scope's outer peers to its members.
    fn filter_down(&self, _scope: &Scope<Self>, _signal: &dyn AnySignal) -> Filtered {
        Filtered::Pass
    }

    /// Intercept a signal travelling from a member to the scope's outer peers.
    fn filter_up(&self, _scope: &Scope<Self>, _signal: &dyn AnySignal) -> Filtered {
        Filtered::Pass
    }

    /// React to a signal the scope accepts as a peer of its parent-level graph.
    fn on_signal(&self, _scope: &Scope<Self>, _signal: &dyn AnySignal, _from: AgentId) {}

    /// React to a scope-local signal declared in `accepts_inner`.
    fn on_inner_signal(&self, _scope: &Scope<Self>, _signal: &dyn AnySignal, _from: AgentId) {}
}

impl ScopeBehavior for () {}
