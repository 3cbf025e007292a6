//! Membership changes requested from inside a scope, including requests made
//! while a broadcast is still being dispatched.

use std::cell::RefCell;
use std::rc::Rc;

use scopegraph::{
    AddAgent, AgentAdded, AgentHandle, AnySignal, Capabilities, Probe, RemoveAgent, Scope,
    ScopeChannels, Signal,
};

#[derive(Debug)]
struct Tick;
impl Signal for Tick {}

fn organiser(label: &str) -> (Rc<Probe>, AgentHandle) {
    Probe::spawn(
        label,
        Capabilities::new()
            .provides::<AddAgent>()
            .provides::<RemoveAgent>()
            .accepts::<AgentAdded>()
            .accepts::<Tick>(),
    )
}

fn newcomer(label: &str) -> (Rc<Probe>, AgentHandle) {
    Probe::spawn(
        label,
        Capabilities::new().accepts::<AgentAdded>().accepts::<Tick>(),
    )
}

fn spawn_reacting(
    label: &str,
    reaction: impl Fn(&Probe, &dyn AnySignal) + 'static,
) -> (Rc<Probe>, AgentHandle) {
    let capabilities = Capabilities::new()
        .provides::<AddAgent>()
        .provides::<RemoveAgent>()
        .accepts::<Tick>();
    let probe = Rc::new(Probe::new(label, capabilities).with_reaction(reaction));
    let handle = AgentHandle::from_rc(Rc::clone(&probe));
    (probe, handle)
}

#[test]
fn test_add_agent_through_the_boundary_grows_empty_scope() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (emitter, e) = organiser("emitter");
    // Wired to the boundary without being a member.
    scope.spy().connect(&e);

    let (_, x) = newcomer("x");
    emitter.send(&AddAgent::new(x.clone()));

    assert_eq!(scope.size(), 1);
    assert!(scope.contains(&x));
    assert!(scope.spy().is_connected(&x));
    assert!(!scope.contains(&e));
    assert!(scope.is_fully_connected());
}

#[test]
fn test_member_adds_agent() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (a_probe, a) = organiser("a");
    let (_, b) = newcomer("b");
    scope.add(&a);
    scope.add(&b);

    let (x_probe, x) = newcomer("x");
    a_probe.send(&AddAgent::new(x.clone()));

    assert_eq!(scope.size(), 3);
    assert!(x.is_connected(&a));
    assert!(x.is_connected(&b));
    assert!(scope.spy().is_connected(&x));
    assert!(scope.is_fully_connected());

    // Everyone, the newcomer included, hears about the addition.
    let announced = format!("{:?}", AgentAdded::new(x.clone()));
    assert_eq!(a_probe.payloads::<AgentAdded>().last(), Some(&announced));
    assert_eq!(x_probe.payloads::<AgentAdded>(), vec![announced]);
}

#[test]
fn test_add_agent_for_existing_member_is_ignored() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (a_probe, a) = organiser("a");
    scope.add(&a);
    a_probe.clear();

    a_probe.send(&AddAgent::new(a.clone()));
    assert_eq!(scope.size(), 1);
    assert_eq!(a_probe.count::<AgentAdded>(), 0);
}

#[test]
fn test_growth_during_broadcast_does_not_reach_newcomer() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (x_probe, x) = newcomer("x");

    let request = x.clone();
    let (_, recruiter) = spawn_reacting("recruiter", move |probe, signal| {
        if signal.is::<Tick>() {
            probe.send(&AddAgent::new(request.clone()));
        }
    });
    let (late_probe, late) = newcomer("late");

    scope.add(&recruiter);
    scope.add(&late);

    assert_eq!(scope.send_inner(&Tick), 2);

    assert!(scope.contains(&x));
    assert_eq!(scope.size(), 3);
    assert!(scope.is_fully_connected());
    // Snapshot taken before the recruiter reacted.
    assert_eq!(x_probe.count::<Tick>(), 0);
    assert_eq!(late_probe.count::<Tick>(), 1);

    // The next broadcast reaches everyone.
    scope.send_inner(&Tick);
    assert_eq!(x_probe.count::<Tick>(), 1);
}

#[test]
fn test_member_removes_agent() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (a_probe, a) = organiser("a");
    let (_, b) = newcomer("b");
    let (_, c) = newcomer("c");
    for member in [&a, &b, &c] {
        scope.add(member);
    }

    a_probe.send(&RemoveAgent::new(b.clone()));

    assert_eq!(scope.size(), 2);
    assert!(!scope.contains(&b));
    assert_eq!(b.node().peer_count(), 0);
    assert!(scope.is_fully_connected());
}

#[test]
fn test_member_removes_itself() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (quitter, q) = spawn_reacting("quitter", |probe, signal| {
        if signal.is::<Tick>() {
            if let Some(me) = probe.handle() {
                probe.send(&RemoveAgent::new(me));
            }
        }
    });
    let (_, stay) = newcomer("stay");
    scope.add(&q);
    scope.add(&stay);

    scope.send_inner(&Tick);

    assert!(!scope.contains(&q));
    assert_eq!(scope.size(), 1);
    assert_eq!(quitter.count::<Tick>(), 1);
    assert_eq!(q.node().peer_count(), 0);
}

#[test]
fn test_removal_during_broadcast_skips_removed_member() {
    let scope = Scope::new("team", ScopeChannels::default());
    let (_, target) = newcomer("placeholder");

    let victim = Rc::new(RefCell::new(None::<AgentHandle>));
    let slot = Rc::clone(&victim);
    let (_, remover) = spawn_reacting("remover", move |probe, signal| {
        if signal.is::<Tick>() {
            if let Some(agent) = slot.borrow().clone() {
                probe.send(&RemoveAgent::new(agent));
            }
        }
    });
    let (victim_probe, v) = newcomer("victim");
    *victim.borrow_mut() = Some(v.clone());

    scope.add(&remover);
    scope.add(&v);
    scope.add(&target);

    scope.send_inner(&Tick);

    assert!(!scope.contains(&v));
    assert_eq!(victim_probe.count::<Tick>(), 0);
    assert!(scope.is_fully_connected());
}
