//! Recording agent for tests and diagnostics.
//!
//! A [`Probe`] remembers every signal delivered to it and can optionally
//! react to each one, which makes it a convenient stand-in for application
//! agents when exercising routing behaviour.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::agent::{Agent, AgentHandle, AgentId, Node};
use crate::capability::Capabilities;
use crate::signal::{AnySignal, Signal, SignalKind};

type Reaction = Box<dyn Fn(&Probe, &dyn AnySignal)>;

/// A single delivery observed by a [`Probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub kind: SignalKind,
    pub from: AgentId,
    /// `Debug` rendering of the payload.
    pub payload: String,
}

/// Agent that records what it receives.
pub struct Probe {
    node: Node,
    received: RefCell<Vec<Received>>,
    introductions: Cell<usize>,
    reaction: Option<Reaction>,
}

impl Probe {
    pub fn new(label: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            node: Node::new(label, capabilities),
            received: RefCell::new(Vec::new()),
            introductions: Cell::new(0),
            reaction: None,
        }
    }

    /// Run `reaction` after recording each delivery.
    pub fn with_reaction(mut self, reaction: impl Fn(&Probe, &dyn AnySignal) + 'static) -> Self {
        self.reaction = Some(Box::new(reaction));
        self
    }

    /// Build a probe and return it together with its agent handle.
    pub fn spawn(label: impl Into<String>, capabilities: Capabilities) -> (Rc<Probe>, AgentHandle) {
        let probe = Rc::new(Self::new(label, capabilities));
        let handle = AgentHandle::from_rc(Rc::clone(&probe));
        (probe, handle)
    }

    /// The probe's own handle, while it is alive.
    pub fn handle(&self) -> Option<AgentHandle> {
        self.node.handle()
    }

    /// Send a signal from this probe.
    pub fn send(&self, signal: &dyn AnySignal) -> usize {
        self.node.send(signal)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.borrow().clone()
    }

    /// Number of deliveries of kind `S`.
    pub fn count<S: Signal>(&self) -> usize {
        let kind = SignalKind::of::<S>();
        self.received.borrow().iter().filter(|r| r.kind == kind).count()
    }

    /// Payloads of every delivery of kind `S`, in arrival order.
    pub fn payloads<S: Signal>(&self) -> Vec<String> {
        let kind = SignalKind::of::<S>();
        self.received
            .borrow()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.payload.clone())
            .collect()
    }

    /// How many times the probe has been introduced to its own handle.
    pub fn introductions(&self) -> usize {
        self.introductions.get()
    }

    pub fn clear(&self) {
        self.received.borrow_mut().clear();
    }
}

impl Agent for Probe {
    fn node(&self) -> &Node {
        &self.node
    }

    fn on_signal(&self, signal: &dyn AnySignal, from: AgentId) {
        self.received.borrow_mut().push(Received {
            kind: signal.kind(),
            from,
            payload: format!("{signal:?}"),
        });
        if let Some(reaction) = &self.reaction {
            reaction(self, signal);
        }
    }

    fn introduce_as(&self, handle: &AgentHandle) {
        self.introductions.set(self.introductions.get() + 1);
        debug_assert_eq!(handle.id(), self.node.id());
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("node", &self.node)
            .field("received", &self.received.borrow().len())
            .finish()
    }
}
