/// PROPERTY-BASED TESTS: ReplicatedList convergence
///
/// Key invariants:
/// 1. An observer's visible list is the authority's list with elements of
///    unspawned objects left out, in the authority's order
/// 2. Once every referenced object has spawned, the lists are equal,
///    whatever order the objects spawned in
use proptest::prelude::*;

use naia_reference::{NetworkComponent, ReplicatedList};
use naia_reference_test::{
    assert_fully_resolved, exchange_full_state, exchange_updates, TestComponent, TestObject,
    TestPeer,
};

const OBJECTS: std::ops::Range<u64> = 10..16;

#[derive(Clone, Debug)]
enum ListOp {
    Push(u64),
    Insert(usize, u64),
    Remove(u64),
    RemoveAt(usize),
    Set(usize, u64),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        4 => OBJECTS.prop_map(ListOp::Push),
        3 => (any::<usize>(), OBJECTS).prop_map(|(index, id)| ListOp::Insert(index, id)),
        1 => OBJECTS.prop_map(ListOp::Remove),
        1 => any::<usize>().prop_map(ListOp::RemoveAt),
        2 => (any::<usize>(), OBJECTS).prop_map(|(index, id)| ListOp::Set(index, id)),
        1 => Just(ListOp::Clear),
    ]
}

fn apply(list: &mut ReplicatedList<TestObject>, op: ListOp) {
    let len = list.len();
    match op {
        ListOp::Push(id) => list.push(TestComponent::new(id, 0)).unwrap(),
        ListOp::Insert(index, id) => list
            .insert(index % (len + 1), TestComponent::new(id, 0))
            .unwrap(),
        ListOp::Remove(id) => {
            list.remove(&TestComponent::new(id, 0)).unwrap();
        }
        ListOp::RemoveAt(index) if len > 0 => {
            list.remove_at(index % len).unwrap();
        }
        ListOp::Set(index, id) if len > 0 => {
            list.set(index % len, TestComponent::new(id, 0)).unwrap()
        }
        ListOp::Clear => list.clear().unwrap(),
        ListOp::RemoveAt(_) | ListOp::Set(_, _) => {}
    }
}

fn visible_on(peer: &TestPeer, items: Vec<TestComponent>) -> Vec<TestComponent> {
    items
        .into_iter()
        .filter(|component| peer.world.has_object(component.identity().object_id.value()))
        .collect()
}

fn pair() -> (TestPeer, TestPeer) {
    let mut server = TestPeer::server();
    for id in OBJECTS {
        server.spawn(id);
    }
    server.host_replica(1, TestComponent::new(OBJECTS.start, 0), Vec::new());
    (server, TestPeer::client())
}

proptest! {
    #[test]
    fn prop_observer_converges_in_authority_order(
        ops in prop::collection::vec((op_strategy(), any::<bool>()), 1..40),
        spawned_early in prop::collection::hash_set(OBJECTS, 0..6),
        spawn_order in Just(OBJECTS.collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let (mut server, mut client) = pair();
        for id in &spawned_early {
            client.spawn(*id);
        }
        exchange_full_state(&server, &mut client, 1).unwrap();

        for (op, exchange_after) in ops {
            apply(&mut server.replica_mut(1).members, op);
            if exchange_after {
                exchange_updates(&mut server, &mut client).unwrap();
                let expected = visible_on(&client, server.replica(1).members.items());
                prop_assert_eq!(client.replica(1).members.items(), expected);
            }
        }
        exchange_updates(&mut server, &mut client).unwrap();
        prop_assert_eq!(
            client.replica(1).members.identities(),
            server.replica(1).members.identities()
        );

        for id in spawn_order {
            client.spawn(id);
            let expected = visible_on(&client, server.replica(1).members.items());
            prop_assert_eq!(client.replica(1).members.items(), expected);
        }

        prop_assert_eq!(
            client.replica(1).members.items(),
            server.replica(1).members.items()
        );
        assert_fully_resolved!(client);
    }
}

/// Add(A), Add(B), Insert(1, C) with B and C unspawned on the observer
fn add_add_insert(resolve_first: u64, resolve_second: u64) {
    let (mut server, mut client) = pair();
    client.spawn(10);
    exchange_full_state(&server, &mut client, 1).unwrap();

    let members = &mut server.replica_mut(1).members;
    members.push(TestComponent::new(10, 0)).unwrap();
    members.push(TestComponent::new(11, 0)).unwrap();
    members.insert(1, TestComponent::new(12, 0)).unwrap();
    exchange_updates(&mut server, &mut client).unwrap();

    assert_eq!(client.replica(1).members.items(), vec![TestComponent::new(10, 0)]);
    assert_eq!(client.replica(1).members.pending_len(), 2);

    client.spawn(resolve_first);
    client.spawn(resolve_second);

    assert_eq!(
        client.replica(1).members.items(),
        vec![
            TestComponent::new(10, 0),
            TestComponent::new(12, 0),
            TestComponent::new(11, 0),
        ]
    );
}

#[test]
fn late_insert_resolving_first_keeps_authority_order() {
    add_add_insert(12, 11);
}

#[test]
fn late_add_resolving_first_keeps_authority_order() {
    add_add_insert(11, 12);
}

#[test]
fn non_authority_list_mutation_is_rejected() {
    let (server, mut client) = pair();
    exchange_full_state(&server, &mut client, 1).unwrap();

    let members = &mut client.replica_mut(1).members;
    assert!(members.push(TestComponent::new(10, 0)).is_err());
    assert!(members.insert(0, TestComponent::new(10, 0)).is_err());
    assert!(members.clear().is_err());
    assert!(client.sweep().unwrap().is_empty());
}
