/// END-TO-END TESTS: ReplicatedRef resolution
///
/// A reference can arrive before the object it names has spawned on the
/// receiving peer. These tests drive a server and a client through that
/// ordering and check the reference resolves exactly once, on spawn.
use std::{cell::RefCell, rc::Rc};

use naia_reference::ReplicaError;
use naia_reference_test::{
    assert_fully_resolved, exchange_full_state, exchange_updates, TestComponent, TestPeer,
    TestReplica,
};

fn server_with_follower(target: TestComponent) -> TestPeer {
    let mut server = TestPeer::server();
    server.spawn(7);
    server.spawn(8);
    server.host_replica(1, target, Vec::new());
    server
}

#[test]
fn reference_to_spawned_object_resolves_on_receipt() {
    let server = server_with_follower(TestComponent::new(7, 0));
    let mut client = TestPeer::client();
    client.spawn(7);

    exchange_full_state(&server, &mut client, 1).unwrap();

    let target = &client.replica(1).target;
    assert!(target.is_resolved());
    assert_eq!(target.value(), TestComponent::new(7, 0));
    assert_fully_resolved!(client);
}

#[test]
fn reference_to_unspawned_object_resolves_after_spawn_with_one_notification() {
    let mut server = server_with_follower(TestComponent::new(7, 0));
    let mut client = TestPeer::client();
    exchange_full_state(&server, &mut client, 1).unwrap();

    let notifications = Rc::new(RefCell::new(Vec::new()));
    let notifications_clone = notifications.clone();
    client
        .replica_mut(1)
        .target
        .on_changed(move |component| notifications_clone.borrow_mut().push(*component));

    server.replica_mut(1).target.set(TestComponent::new(8, 1));
    assert_eq!(exchange_updates(&mut server, &mut client).unwrap(), 1);

    let target = &client.replica(1).target;
    assert!(!target.is_resolved());
    assert!(matches!(
        target.try_value(),
        Err(ReplicaError::IllegalState { .. })
    ));
    assert!(notifications.borrow().is_empty());

    // the full state's reference to 7 was superseded by the delta
    assert_eq!(client.spawn(7), 0);
    assert_eq!(client.spawn(8), 1);

    assert_eq!(client.replica(1).target.value(), TestComponent::new(8, 1));
    assert_eq!(*notifications.borrow(), vec![TestComponent::new(8, 1)]);
    assert_fully_resolved!(client);
}

#[test]
fn non_authority_set_fails_and_sends_nothing() {
    let server = server_with_follower(TestComponent::new(7, 0));
    let mut client = TestPeer::client();
    client.spawn(7);
    client.spawn(8);
    exchange_full_state(&server, &mut client, 1).unwrap();

    let result = client
        .replica_mut(1)
        .target
        .try_set(TestComponent::new(8, 0));

    assert!(matches!(result, Err(ReplicaError::Permission { .. })));
    assert_eq!(client.replica(1).target.value(), TestComponent::new(7, 0));
    assert!(client.sweep().unwrap().is_empty());
}

#[test]
fn authority_writes_are_swept_once() {
    let mut server = server_with_follower(TestComponent::new(7, 0));
    let mut client = TestPeer::client();
    client.spawn(7);
    client.spawn(8);
    exchange_full_state(&server, &mut client, 1).unwrap();

    server.replica_mut(1).target.set(TestComponent::new(8, 2));
    assert!(server.session.dirty_tracker().contains(&naia_reference::ObjectId::new(1)));

    assert_eq!(exchange_updates(&mut server, &mut client).unwrap(), 1);
    assert_eq!(exchange_updates(&mut server, &mut client).unwrap(), 0);
    assert!(server.session.dirty_tracker().is_empty());
    assert_eq!(client.replica(1).target.value(), TestComponent::new(8, 2));
}

#[test]
fn despawning_a_mirror_releases_its_registrations() {
    let server = server_with_follower(TestComponent::new(7, 0));
    let mut client = TestPeer::client();
    exchange_full_state(&server, &mut client, 1).unwrap();
    assert_eq!(client.session.registry().pending_count(), 1);

    client.despawn(1);

    assert_fully_resolved!(client);
    assert_eq!(client.spawn(7), 0);
}

#[test]
fn update_naming_unknown_variable_is_a_protocol_violation() {
    let server = server_with_follower(TestComponent::new(7, 0));
    let mut client = TestPeer::client();
    exchange_full_state(&server, &mut client, 1).unwrap();

    let update = naia_reference::ObjectUpdate {
        object_id: naia_reference::ObjectId::new(1),
        payload: vec![1, TestReplica::MEMBERS + 1],
    };

    assert!(matches!(
        client.receive(&[update], false),
        Err(ReplicaError::ProtocolViolation { .. })
    ));
}
