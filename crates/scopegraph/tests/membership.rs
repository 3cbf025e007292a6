//! Membership bookkeeping: add / remove and the full-mesh invariant.

use std::rc::Rc;

use scopegraph::{Agent, AgentHandle, Capabilities, Probe, Scope, ScopeChannels, Signal};

#[derive(Debug)]
struct Chatter;
impl Signal for Chatter {}

fn agent(label: &str) -> (Rc<Probe>, AgentHandle) {
    Probe::spawn(
        label,
        Capabilities::new().provides::<Chatter>().accepts::<Chatter>(),
    )
}

#[test]
fn test_add_is_idempotent() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (_, a) = agent("a");

    assert!(scope.add(&a));
    assert_eq!(scope.size(), 1);

    assert!(!scope.add(&a));
    assert_eq!(scope.size(), 1);
    assert!(scope.is_fully_connected());
}

#[test]
fn test_add_introduces_agent_once() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (probe, a) = agent("a");

    scope.add(&a);
    scope.add(&a);
    assert_eq!(probe.introductions(), 1);
}

#[test]
fn test_remove_is_symmetric() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (_, a) = agent("a");
    let (_, b) = agent("b");
    let (_, c) = agent("c");
    for member in [&a, &b, &c] {
        scope.add(member);
    }

    assert!(scope.remove(&b));
    assert_eq!(scope.size(), 2);
    assert!(!scope.contains(&b));
    assert!(!b.is_connected(&a));
    assert!(!b.is_connected(&c));
    assert!(!a.is_connected(&b));
    assert!(!scope.spy().is_connected(&b));
    assert_eq!(b.node().peer_count(), 0);
    assert!(a.is_connected(&c));
    assert!(scope.is_fully_connected());
}

#[test]
fn test_remove_non_member_has_no_effect() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (_, a) = agent("a");
    let (_, stranger) = agent("stranger");
    scope.add(&a);

    assert!(!scope.remove(&stranger));
    assert_eq!(scope.size(), 1);
    assert!(scope.is_fully_connected());

    assert!(scope.remove(&a));
    assert!(!scope.remove(&a));
    assert!(scope.is_empty());
}

#[test]
fn test_full_mesh_survives_mixed_sequence() {
    let scope = Scope::new("team", ScopeChannels::default());
    let agents: Vec<AgentHandle> = (0..6).map(|i| agent(&format!("m{i}")).1).collect();

    for a in &agents {
        scope.add(a);
    }
    scope.remove(&agents[1]);
    scope.remove(&agents[4]);
    scope.add(&agents[1]);
    scope.remove(&agents[0]);
    scope.add(&agents[4]);
    scope.remove(&agents[5]);

    assert_eq!(scope.size(), 4);
    assert!(scope.is_fully_connected());

    let members = scope.members();
    for member in &members {
        // Every other member plus the spy.
        assert_eq!(member.node().peer_count(), members.len());
    }
    for gone in [&agents[0], &agents[5]] {
        assert_eq!(gone.node().peer_count(), 0);
    }
}

#[test]
fn test_members_in_creation_order() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (_, first) = agent("first");
    let (_, second) = agent("second");
    let (_, third) = agent("third");

    scope.add(&third);
    scope.add(&first);
    scope.add(&second);

    let labels: Vec<String> = scope.members().iter().map(|m| m.label().to_string()).collect();
    assert_eq!(labels, vec!["first", "second", "third"]);
}

#[test]
fn test_scope_cannot_contain_itself_or_its_spy() {
    let scope = Scope::new("team", ScopeChannels::default());
    assert!(!scope.add(&scope.handle()));

    let spy = scope.spy().node().handle().expect("spy is alive");
    assert!(!scope.add(&spy));
    assert!(scope.is_empty());
}

#[test]
fn test_scope_nests_as_member() {
    let outer = Scope::new("outer", ScopeChannels::default());
    let inner = Scope::new("inner", ScopeChannels::default());
    let (_, a) = agent("a");

    assert!(outer.add(&a));
    assert!(outer.add(&inner.handle()));
    assert!(outer.contains(&inner.handle()));
    assert!(inner.handle().is_connected(&a));
    assert!(outer.is_fully_connected());

    // The inner scope's own membership is untouched.
    assert!(inner.is_empty());
}

#[test]
fn test_removed_agent_is_released() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (probe, a) = agent("a");
    scope.add(&a);

    scope.remove(&a);
    drop(a);
    // Only the test's typed Rc remains: edges are weak.
    assert_eq!(Rc::strong_count(&probe), 1);
}

#[test]
fn test_scope_rejects_its_ancestors() {
    let outer = Scope::new("outer", ScopeChannels::default());
    let middle = Scope::new("middle", ScopeChannels::default());
    let inner = Scope::new("inner", ScopeChannels::default());
    let (leaf_log, leaf) = agent("leaf");

    assert!(outer.add(&middle.handle()));
    assert!(middle.add(&inner.handle()));
    assert!(inner.add(&leaf));

    assert!(!middle.add(&outer.handle()));
    assert!(!inner.add(&outer.handle()));
    assert!(!inner.add(&middle.handle()));
    assert_eq!(middle.size(), 1);
    assert_eq!(inner.size(), 1);

    // The tree is intact, so a broadcast terminates and reaches the leaf once.
    let (source, src) = Probe::spawn("source", Capabilities::new().provides::<Chatter>());
    src.connect(&outer.handle());
    source.send(&Chatter);
    assert_eq!(leaf_log.count::<Chatter>(), 1);
}
