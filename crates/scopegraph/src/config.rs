//! Declarative port and channel configuration.
//!
//! Channel declarations can be loaded from JSON (or any serde format) with
//! signal kinds named as strings. A [`KindRegistry`] maps those names onto
//! the concrete kinds the application registered, and `resolve` turns the
//! declaration into live [`Capabilities`] / [`ScopeChannels`].
//!
//! ```json
//! { "passes_up": ["Alert"], "accepts_inner": ["Heartbeat"] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{Capabilities, KindSet, ScopeChannels};
use crate::error::{Result, ScopeGraphError};
use crate::signal::{AddAgent, AgentAdded, Nothing, RemoveAgent, Signal, SignalKind};

/// Name of the supertype matching every kind.
pub const SUPERTYPE: &str = "Signal";

/// Name of the placeholder kind, which can never be declared.
pub const RESERVED: &str = "Nothing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Supertype,
    Kind(SignalKind),
}

/// Name to kind dispatch table.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    entries: BTreeMap<String, Entry>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl KindRegistry {
    /// A registry knowing `Signal`, `AddAgent`, `AgentAdded` and `RemoveAgent`.
    pub fn with_builtins() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(SUPERTYPE.to_string(), Entry::Supertype);
        for kind in [
            SignalKind::of::<AddAgent>(),
            SignalKind::of::<AgentAdded>(),
            SignalKind::of::<RemoveAgent>(),
        ] {
            entries.insert(kind.name().to_string(), Entry::Kind(kind));
        }
        Self { entries }
    }

    /// Register kind `S` under its short type name.
    pub fn register<S: Signal>(&mut self) -> Result<&mut Self> {
        let kind = SignalKind::of::<S>();
        self.insert(kind.name(), kind)
    }

    /// Register kind `S` under an explicit name.
    pub fn register_as<S: Signal>(&mut self, name: &str) -> Result<&mut Self> {
        self.insert(name, SignalKind::of::<S>())
    }

    fn insert(&mut self, name: &str, kind: SignalKind) -> Result<&mut Self> {
        if name == RESERVED || name == SUPERTYPE || kind == SignalKind::of::<Nothing>() {
            return Err(ScopeGraphError::ReservedSignalKind {
                name: name.to_string(),
            });
        }
        match self.entries.get(name) {
            Some(Entry::Kind(existing)) if *existing == kind => {}
            Some(_) => {
                return Err(ScopeGraphError::DuplicateSignalKind {
                    name: name.to_string(),
                })
            }
            None => {
                debug!(event = "registry.kind_registered", name = %name, kind = %kind);
                self.entries.insert(name.to_string(), Entry::Kind(kind));
            }
        }
        Ok(self)
    }

    /// The concrete kind registered under `name`. `None` for unknown names
    /// and for the `Signal` supertype.
    pub fn lookup(&self, name: &str) -> Option<SignalKind> {
        match self.entries.get(name)? {
            Entry::Kind(kind) => Some(*kind),
            Entry::Supertype => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Resolve a list of kind names into a [`KindSet`].
    pub fn resolve_set<S: AsRef<str>>(&self, names: &[S]) -> Result<KindSet> {
        let mut set = KindSet::empty();
        for name in names {
            let name = name.as_ref();
            if name == RESERVED {
                return Err(ScopeGraphError::ReservedSignalKind {
                    name: name.to_string(),
                });
            }
            match self.entries.get(name) {
                Some(Entry::Supertype) => set = set.union(&KindSet::any()),
                Some(Entry::Kind(kind)) => set.insert(*kind),
                None => {
                    return Err(ScopeGraphError::UnknownSignalKind {
                        name: name.to_string(),
                    })
                }
            }
        }
        Ok(set)
    }
}

/// Outer ports of a plain agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortConfig {
    pub provides: Vec<String>,
    pub accepts: Vec<String>,
}

impl PortConfig {
    pub fn resolve(&self, registry: &KindRegistry) -> Result<Capabilities> {
        Ok(Capabilities {
            provides: registry.resolve_set(&self.provides)?,
            accepts: registry.resolve_set(&self.accepts)?,
        })
    }
}

/// Channel declarations of a scope.
///
/// An absent `passes_down` keeps the default (`["Signal"]`); an explicit
/// empty list passes nothing down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passes_down: Option<Vec<String>>,
    pub passes_up: Vec<String>,
    pub filters_down: Vec<String>,
    pub filters_up: Vec<String>,
    pub provides_inner: Vec<String>,
    pub accepts_inner: Vec<String>,
    pub provides: Vec<String>,
    pub accepts: Vec<String>,
}

impl ChannelConfig {
    /// Parse a declaration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn resolve(&self, registry: &KindRegistry) -> Result<ScopeChannels> {
        let passes_down = match &self.passes_down {
            Some(names) => registry.resolve_set(names)?,
            None => KindSet::any(),
        };
        Ok(ScopeChannels {
            passes_down,
            passes_up: registry.resolve_set(&self.passes_up)?,
            filters_down: registry.resolve_set(&self.filters_down)?,
            filters_up: registry.resolve_set(&self.filters_up)?,
            provides_inner: registry.resolve_set(&self.provides_inner)?,
            accepts_inner: registry.resolve_set(&self.accepts_inner)?,
            provides: registry.resolve_set(&self.provides)?,
            accepts: registry.resolve_set(&self.accepts)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Alert;
    impl Signal for Alert {}

    #[derive(Debug)]
    struct Heartbeat;
    impl Signal for Heartbeat {}

    fn registry() -> KindRegistry {
        let mut registry = KindRegistry::with_builtins();
        registry.register::<Alert>().unwrap();
        registry.register::<Heartbeat>().unwrap();
        registry
    }

    #[test]
    fn test_builtins_are_known() {
        let registry = KindRegistry::default();
        assert_eq!(registry.lookup("AddAgent"), Some(SignalKind::of::<AddAgent>()));
        assert_eq!(registry.lookup("RemoveAgent"), Some(SignalKind::of::<RemoveAgent>()));
        assert!(registry.contains("Signal"));
        assert_eq!(registry.lookup("Signal"), None);
        assert!(!registry.contains("Nothing"));
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["AddAgent", "AgentAdded", "RemoveAgent", "Signal"]
        );
    }

    #[test]
    fn test_register_is_idempotent_for_same_kind() {
        let mut registry = registry();
        assert!(registry.register::<Alert>().is_ok());
        assert_eq!(registry.lookup("Alert"), Some(SignalKind::of::<Alert>()));
    }

    #[test]
    fn test_register_rejects_name_clash() {
        let mut registry = registry();
        let err = registry.register_as::<Heartbeat>("Alert").unwrap_err();
        assert!(matches!(err, ScopeGraphError::DuplicateSignalKind { .. }));
    }

    #[test]
    fn test_register_rejects_reserved() {
        let mut registry = registry();
        let err = registry.register::<Nothing>().unwrap_err();
        assert!(matches!(err, ScopeGraphError::ReservedSignalKind { .. }));

        let err = registry.register_as::<Alert>("Signal").unwrap_err();
        assert!(matches!(err, ScopeGraphError::ReservedSignalKind { .. }));
    }

    #[test]
    fn test_resolve_set() {
        let registry = registry();
        let set = registry.resolve_set(&["Alert", "Heartbeat"]).unwrap();
        assert!(set.contains(SignalKind::of::<Alert>()));
        assert!(set.contains(SignalKind::of::<Heartbeat>()));
        assert!(!set.contains(SignalKind::of::<AddAgent>()));

        let any = registry.resolve_set(&["Signal"]).unwrap();
        assert!(any.is_any());

        let err = registry.resolve_set(&["Telemetry"]).unwrap_err();
        assert!(matches!(err, ScopeGraphError::UnknownSignalKind { ref name } if name == "Telemetry"));

        let err = registry.resolve_set(&["Nothing"]).unwrap_err();
        assert!(matches!(err, ScopeGraphError::ReservedSignalKind { .. }));
    }

    #[test]
    fn test_port_config_resolve() {
        let ports = PortConfig {
            provides: vec!["Alert".to_string()],
            accepts: vec!["Heartbeat".to_string()],
        };
        let caps = ports.resolve(&registry()).unwrap();
        assert!(caps.can_send(SignalKind::of::<Alert>()));
        assert!(caps.can_receive(SignalKind::of::<Heartbeat>()));
        assert!(!caps.can_receive(SignalKind::of::<Alert>()));
    }

    #[test]
    fn test_channel_config_defaults() {
        let config = ChannelConfig::from_json_str("{}").unwrap();
        let channels = config.resolve(&registry()).unwrap();
        assert_eq!(channels, ScopeChannels::default());
    }

    #[test]
    fn test_channel_config_explicit_empty_passes_down() {
        let config = ChannelConfig::from_json_str(r#"{ "passes_down": [] }"#).unwrap();
        let channels = config.resolve(&registry()).unwrap();
        assert!(channels.passes_down.is_empty());
    }

    #[test]
    fn test_channel_config_from_json() {
        let json = r#"{
            "passes_down": ["Heartbeat"],
            "passes_up": ["Alert"],
            "filters_up": ["Alert"],
            "accepts_inner": ["Heartbeat"]
        }"#;
        let channels = ChannelConfig::from_json_str(json)
            .unwrap()
            .resolve(&registry())
            .unwrap();
        assert!(channels.forwards_up(SignalKind::of::<Alert>()));
        assert!(channels.filters_up.contains(SignalKind::of::<Alert>()));
        // Declared inner, so it never crosses the boundary.
        assert!(!channels.forwards_down(SignalKind::of::<Heartbeat>()));
    }

    #[test]
    fn test_channel_config_rejects_unknown_field() {
        let err = ChannelConfig::from_json_str(r#"{ "passes_sideways": [] }"#).unwrap_err();
        assert!(matches!(err, ScopeGraphError::InvalidConfig(_)));
    }

    #[test]
    fn test_channel_config_from_toml() {
        let text = r#"
            passes_up = ["Alert"]
            provides_inner = ["Heartbeat"]
        "#;
        let config: ChannelConfig = toml::from_str(text).unwrap();
        assert_eq!(config.passes_down, None);
        let channels = config.resolve(&registry()).unwrap();
        assert!(channels.passes_down.is_any());
        assert!(channels.provides_inner.contains(SignalKind::of::<Heartbeat>()));
    }
}
