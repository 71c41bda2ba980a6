use std::sync::{Arc, Mutex};

use rhoam_observer::{Agent, Observer, ObserverError, Registration};
use rhoam_rules::{Rule, RuleSet};
use rhoam_types::{ApprovedMessage, Message};

fn collect(observer: &Observer) -> Arc<Mutex<Vec<ApprovedMessage>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    observer.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

/// Builds root ← middle ← leaf with `USER_01` registered at the leaf.
fn three_level_chain(leaf_rules: RuleSet) -> (Observer, Observer, Observer, Agent) {
    let root = Observer::new("root", RuleSet::empty());
    let middle = Observer::new("middle", RuleSet::empty());
    let leaf = Observer::new("leaf", leaf_rules);

    assert!(root.register_sub_observer(&middle));
    assert!(middle.register_sub_observer(&leaf));
    leaf.start();

    let user = Agent::new("USER_01", "Human");
    assert!(user.connect(&leaf));
    (root, middle, leaf, user)
}

#[test]
fn leaf_approval_reaches_root_exactly_once() {
    let (root, middle, leaf, user) = three_level_chain(RuleSet::empty());
    let at_root = collect(&root);
    let at_middle = collect(&middle);
    let at_leaf = collect(&leaf);

    assert!(user.speak(&leaf, "hi"));

    let at_root = at_root.lock().unwrap();
    assert_eq!(at_root.len(), 1);
    assert_eq!(at_root[0].sender_id, "USER_01");
    assert_eq!(at_root[0].content, "hi");
    assert_eq!(at_root[0].origin_observer, "leaf");
    assert_eq!(at_middle.lock().unwrap().len(), 1);
    assert_eq!(at_leaf.lock().unwrap().len(), 1);
}

#[test]
fn bubbled_event_is_forwarded_unchanged() {
    let (root, _middle, leaf, user) = three_level_chain(RuleSet::empty());
    let at_root = collect(&root);
    let at_leaf = collect(&leaf);

    user.speak(&leaf, "hi");
    assert_eq!(*at_root.lock().unwrap(), *at_leaf.lock().unwrap());
}

#[test]
fn ancestors_do_not_revalidate_bubbled_messages() {
    // The root would block this content, is stopped, and does not know the
    // sender. None of that matters for forwarding.
    let root = Observer::new(
        "root",
        RuleSet::new(vec![
            Rule::restriction("tiny", 1),
            Rule::censorship("profanity", ["badword"]),
        ]),
    );
    let leaf = Observer::new("leaf", RuleSet::empty());
    assert!(root.register_sub_observer(&leaf));
    leaf.start();
    let user = Agent::new("USER_01", "Human");
    user.connect(&leaf);
    let at_root = collect(&root);

    assert!(user.speak(&leaf, "a badword slipped through"));
    assert_eq!(at_root.lock().unwrap().len(), 1);
    assert!(!root.is_running());
}

#[test]
fn rejected_leaf_message_never_bubbles() {
    let (root, _middle, leaf, user) =
        three_level_chain(RuleSet::new(vec![Rule::restriction("max-length", 10)]));
    let at_root = collect(&root);

    assert!(!user.speak(&leaf, "hello world!"));
    assert!(at_root.lock().unwrap().is_empty());
}

#[test]
fn sibling_sub_observers_both_bubble() {
    let root = Observer::new("root", RuleSet::empty());
    let left = Observer::new("left", RuleSet::empty());
    let right = Observer::new("right", RuleSet::empty());
    root.register_sub_observer(&left);
    root.register_sub_observer(&right);
    for (room, id) in [(&left, "A"), (&right, "B")] {
        room.start();
        Agent::new(id, id).connect(room);
    }
    let at_root = collect(&root);

    assert!(left.process_message(Message::new("A", "from left")));
    assert!(right.process_message(Message::new("B", "from right")));

    let origins: Vec<String> = at_root
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.origin_observer.clone())
        .collect();
    assert_eq!(origins, ["left", "right"]);
}

#[test]
fn sub_observer_is_a_registered_participant() {
    let root = Observer::new("root", RuleSet::empty());
    let room = Observer::new("room", RuleSet::empty());
    root.register_sub_observer(&room);
    root.start();

    assert!(root.has_agent("room"));
    assert!(matches!(
        root.agent("room"),
        Some(Registration::SubObserver { ref observer, .. }) if observer.ptr_eq(&room)
    ));
    assert_eq!(room.parent_id().as_deref(), Some("root"));
    // Registered sub-observers may also speak to their parent directly.
    assert!(root.process_message(Message::new("room", "status report")));
}

#[test]
fn duplicate_sub_observer_id_is_rejected() {
    let root = Observer::new("root", RuleSet::empty());
    root.register_agent(&Agent::new("room", "A human called room"));
    let room = Observer::new("room", RuleSet::empty());

    assert_eq!(
        root.try_register_sub_observer(&room),
        Err(ObserverError::DuplicateAgent("room".to_string()))
    );
    assert_eq!(room.parent_id(), None);
    assert_eq!(room.listener_count(), 0);
}

// ── Cycle and tree protection ────────────────────────────────────────

#[test]
fn observer_cannot_register_itself() {
    let root = Observer::new("root", RuleSet::empty());
    assert!(matches!(
        root.try_register_sub_observer(&root),
        Err(ObserverError::Cycle { .. })
    ));
    assert_eq!(root.agent_count(), 0);
}

#[test]
fn direct_cycle_is_rejected() {
    let a = Observer::new("a", RuleSet::empty());
    let b = Observer::new("b", RuleSet::empty());
    assert!(a.register_sub_observer(&b));
    assert_eq!(
        b.try_register_sub_observer(&a),
        Err(ObserverError::Cycle {
            parent: "b".to_string(),
            child: "a".to_string(),
        })
    );
}

#[test]
fn transitive_cycle_is_rejected() {
    let (root, _middle, leaf, _user) = three_level_chain(RuleSet::empty());
    assert!(!leaf.register_sub_observer(&root));
    assert!(!leaf.has_agent("root"));
    assert_eq!(root.listener_count(), 0);
}

#[test]
fn cycle_check_tells_apart_observers_sharing_an_id() {
    // root ─┬─ a ─ x
    //       └─ b ─ x' ─ d      (x and x' are distinct observers named "x")
    let root = Observer::new("root", RuleSet::empty());
    let a = Observer::new("a", RuleSet::empty());
    let b = Observer::new("b", RuleSet::empty());
    let x = Observer::new("x", RuleSet::empty());
    let x_prime = Observer::new("x", RuleSet::empty());
    let d = Observer::new("d", RuleSet::empty());

    assert!(root.register_sub_observer(&a));
    assert!(root.register_sub_observer(&b));
    assert!(a.register_sub_observer(&x));
    assert!(b.register_sub_observer(&x_prime));
    assert!(x_prime.register_sub_observer(&d));
    assert!(root.subtree_contains_observer(&d));
    assert!(!a.subtree_contains_observer(&d));

    // Repeat so any ordering of the sub-observer lookups is exercised.
    for _ in 0..32 {
        assert_eq!(
            d.try_register_sub_observer(&root),
            Err(ObserverError::Cycle {
                parent: "d".to_string(),
                child: "root".to_string(),
            })
        );
    }
    assert_eq!(root.parent_id(), None);
    assert_eq!(root.listener_count(), 0);

    d.start();
    let user = Agent::new("USER_01", "Human");
    user.connect(&d);
    let at_root = collect(&root);
    assert!(user.speak(&d, "hi"));
    assert_eq!(at_root.lock().unwrap().len(), 1);
}

#[test]
fn sub_observer_attaches_to_one_parent_at_a_time() {
    let first = Observer::new("first", RuleSet::empty());
    let second = Observer::new("second", RuleSet::empty());
    let room = Observer::new("room", RuleSet::empty());

    assert!(first.register_sub_observer(&room));
    assert_eq!(
        second.try_register_sub_observer(&room),
        Err(ObserverError::AlreadyAttached {
            child: "room".to_string(),
            parent: "first".to_string(),
        })
    );

    assert!(first.unregister_agent("room"));
    assert!(second.register_sub_observer(&room));
    assert_eq!(room.parent_id().as_deref(), Some("second"));
}

// ── Detaching ────────────────────────────────────────────────────────

#[test]
fn unregistering_sub_observer_stops_bubbling() {
    let (root, middle, leaf, user) = three_level_chain(RuleSet::empty());
    let at_root = collect(&root);
    let at_middle = collect(&middle);

    assert!(middle.unregister_agent("leaf"));
    assert!(user.speak(&leaf, "hi"));

    assert!(at_root.lock().unwrap().is_empty());
    assert!(at_middle.lock().unwrap().is_empty());
    assert_eq!(leaf.parent_id(), None);
    assert_eq!(leaf.listener_count(), 0);
}

#[test]
fn detached_subtree_keeps_its_own_wiring() {
    let (root, middle, leaf, user) = three_level_chain(RuleSet::empty());
    let at_middle = collect(&middle);

    assert!(root.unregister_agent("middle"));
    assert!(user.speak(&leaf, "hi"));
    assert_eq!(at_middle.lock().unwrap().len(), 1);
}

#[test]
fn dropped_parent_does_not_break_child() {
    let leaf = Observer::new("leaf", RuleSet::empty());
    {
        let parent = Observer::new("parent", RuleSet::empty());
        parent.register_sub_observer(&leaf);
    }
    assert_eq!(leaf.parent_id(), None);
    assert_eq!(leaf.listener_count(), 0);

    leaf.start();
    let user = Agent::new("USER_01", "Human");
    user.connect(&leaf);
    assert!(user.speak(&leaf, "still works"));
}

#[test]
fn subtree_contains_finds_deep_descendants() {
    let (root, middle, _leaf, _user) = three_level_chain(RuleSet::empty());
    assert!(root.subtree_contains("middle"));
    assert!(root.subtree_contains("leaf"));
    assert!(middle.subtree_contains("leaf"));
    assert!(!middle.subtree_contains("root"));
    assert!(!root.subtree_contains("root"));
}
