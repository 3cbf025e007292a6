//! Structured observability hooks for scope membership and routing.
//!
//! - [`ScopeSpan`] keeps a scope-tagged span entered while a scope routes a
//!   signal, so nested scopes show up as nested spans
//! - `emit_*` functions record membership changes and filter decisions
//!
//! Events are emitted at `debug!` level; enable them with
//! `RUST_LOG=scopegraph=debug`.

use tracing::debug;

use crate::agent::AgentId;
use crate::signal::SignalKind;

/// RAII guard that enters a scope-tagged span.
pub struct ScopeSpan {
    _span: tracing::span::EnteredSpan,
}

impl ScopeSpan {
    pub fn enter(scope_id: AgentId, scope: &str) -> Self {
        let span = tracing::debug_span!("scopegraph.scope", scope_id = %scope_id, scope = %scope);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: an agent became a member of a scope.
pub fn emit_agent_added(scope: &str, agent_id: AgentId, size: usize) {
    debug!(event = "scope.agent_added", scope = %scope, agent_id = %agent_id, size = size);
}

/// Emit event: an agent stopped being a member of a scope.
pub fn emit_agent_removed(scope: &str, agent_id: AgentId, size: usize) {
    debug!(event = "scope.agent_removed", scope = %scope, agent_id = %agent_id, size = size);
}

/// Emit event: an `add` was refused.
pub fn emit_add_rejected(scope: &str, agent_id: AgentId, reason: &str) {
    debug!(event = "scope.add_rejected", scope = %scope, agent_id = %agent_id, reason = %reason);
}

/// Emit event: a filter replaced a signal in transit.
pub fn emit_signal_filtered(scope: &str, direction: &str, from: SignalKind, to: SignalKind) {
    debug!(
        event = "scope.signal_filtered",
        scope = %scope,
        direction = %direction,
        from = %from,
        to = %to,
    );
}

/// Emit event: a filter suppressed a signal in transit.
pub fn emit_signal_suppressed(scope: &str, direction: &str, kind: SignalKind) {
    debug!(
        event = "scope.signal_suppressed",
        scope = %scope,
        direction = %direction,
        kind = %kind,
    );
}
