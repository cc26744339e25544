/// END-TO-END TESTS: relaying received deltas
///
/// A relay decodes with `keep_dirty_delta` and forwards what it received,
/// including references it could not resolve itself.
use naia_reference_test::{
    assert_fully_resolved, exchange_full_state, relay_updates, TestComponent, TestPeer,
};

#[test]
fn relay_forwards_references_it_cannot_resolve() {
    let mut server = TestPeer::server();
    server.spawn(7);
    server.spawn(8);
    server.host_replica(1, TestComponent::new(7, 0), Vec::new());

    let mut relay = TestPeer::client();
    let mut client = TestPeer::client();
    client.spawn(7);
    client.spawn(8);
    exchange_full_state(&server, &mut relay, 1).unwrap();
    exchange_full_state(&relay, &mut client, 1).unwrap();

    {
        let replica = server.replica_mut(1);
        replica.target.set(TestComponent::new(8, 3));
        replica.members.push(TestComponent::new(8, 0)).unwrap();
        replica.members.insert(0, TestComponent::new(7, 1)).unwrap();
    }
    assert_eq!(relay_updates(&mut server, &mut relay, &mut client).unwrap(), 1);

    assert!(!relay.replica(1).target.is_resolved());
    assert!(relay.replica(1).members.is_empty());

    let replica = client.replica(1);
    assert_eq!(replica.target.value(), TestComponent::new(8, 3));
    assert_eq!(
        replica.members.items(),
        vec![TestComponent::new(7, 1), TestComponent::new(8, 0)]
    );
    assert_fully_resolved!(client);
}
