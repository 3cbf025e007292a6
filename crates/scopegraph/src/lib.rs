//! scopegraph: nested scopes of agents exchanging typed signals.
//!
//! Agents are wired into a graph of peers and talk by broadcasting typed
//! signals to every connected peer that accepts them. A [`Scope`] is an
//! agent that owns a fully connected membership: signals from its outer
//! peers flow down to the members, member signals flow up to the outer
//! peers, and scope-local signals stay inside.
//!
//! ```
//! use scopegraph::{Capabilities, Probe, Scope, ScopeChannels, Signal};
//!
//! #[derive(Debug)]
//! struct Tick;
//! impl Signal for Tick {}
//!
//! let scope = Scope::new("root", ScopeChannels::default());
//! let (probe, member) = Probe::spawn("member", Capabilities::new().accepts::<Tick>());
//! scope.add(&member);
//!
//! scope.send_inner(&Tick);
//! assert_eq!(probe.count::<Tick>(), 1);
//! ```

pub mod agent;
pub mod capability;
pub mod config;
pub mod error;
pub mod metrics;
pub mod obs;
pub mod probe;
pub mod scope;
pub mod signal;
pub mod telemetry;

pub use agent::{Agent, AgentHandle, AgentId, Node};
pub use capability::{Capabilities, KindSet, ScopeChannels};
pub use config::{ChannelConfig, KindRegistry, PortConfig};
pub use error::{Result, ScopeGraphError};
pub use metrics::METRICS;
pub use probe::{Probe, Received};
pub use scope::{Filtered, Scope, ScopeBehavior, Spy};
pub use signal::{AddAgent, AgentAdded, AnySignal, Nothing, RemoveAgent, Signal, SignalKind};
pub use telemetry::{init_tracing, LogFormat};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
