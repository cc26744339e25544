use std::time::{Duration, Instant};

use naia_reference::{ObjectId, ObjectUpdate, ReplicaError, ReplicationConfig, HostType};
use naia_reference_test::{exchange_full_state, TestComponent, TestPeer};

fn waiting_client(config: ReplicationConfig) -> TestPeer {
    let mut server = TestPeer::server();
    server.spawn(7);
    server.host_replica(1, TestComponent::new(7, 0), vec![TestComponent::new(7, 1)]);

    let mut client = TestPeer::with_config(HostType::Client, config);
    exchange_full_state(&server, &mut client, 1).unwrap();
    client
}

#[test]
fn pending_references_never_expire_without_a_ttl() {
    env_logger::builder().is_test(true).try_init().ok();

    let mut client = waiting_client(ReplicationConfig::default());
    assert_eq!(client.session.registry().pending_count(), 2);

    assert_eq!(client.session.evict_expired(Instant::now() + Duration::from_secs(3600)), 0);
    assert_eq!(client.session.registry().pending_count(), 2);
}

#[test]
fn pending_references_are_evicted_after_the_ttl() {
    let config = ReplicationConfig {
        pending_ttl: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let mut client = waiting_client(config);

    assert_eq!(client.session.evict_expired(Instant::now()), 0);
    assert_eq!(
        client.session.evict_expired(Instant::now() + Duration::from_secs(6)),
        2
    );

    // evicted registrations never fire
    assert_eq!(client.spawn(7), 0);
    assert!(!client.replica(1).target.is_resolved());
}

#[test]
fn update_for_unknown_replica_is_a_protocol_violation() {
    let mut client = TestPeer::client();
    let update = ObjectUpdate {
        object_id: ObjectId::new(99),
        payload: vec![0],
    };

    assert!(matches!(
        client.receive(&[update], false),
        Err(ReplicaError::ProtocolViolation { .. })
    ));
}

#[test]
fn sweep_orders_updates_by_object() {
    let mut server = TestPeer::server();
    server.spawn(7);
    for id in [3, 1, 2] {
        server.host_replica(id, TestComponent::new(7, 0), Vec::new());
        server.replica_mut(id).target.set(TestComponent::new(7, 1));
    }

    let updates = server.sweep().unwrap();

    let order: Vec<u64> = updates.iter().map(|update| update.object_id.value()).collect();
    assert_eq!(order, vec![1, 2, 3]);
    assert!(server.session.dirty_tracker().is_empty());
    assert!(!server.replica(2).target.is_dirty());
}

#[test]
fn closing_drops_pending_registrations() {
    let client = waiting_client(ReplicationConfig::default());
    assert_eq!(client.session.registry().pending_count(), 2);

    let TestPeer { session, .. } = client;
    assert_eq!(session.close(), 2);
}

#[test]
fn failed_sweep_keeps_every_object_dirty() {
    let mut server = TestPeer::server();
    server.spawn(7);
    server.host_replica(1, TestComponent::new(7, 0), Vec::new());
    server.replica_mut(1).target.set(TestComponent::new(7, 1));

    let oversized = (0..70_000u64).map(|id| TestComponent::new(id, 0)).collect();
    server.host_replica(2, TestComponent::new(7, 0), oversized);
    server.replica_mut(2).members.mark_full_dirty();

    assert!(matches!(
        server.sweep(),
        Err(ReplicaError::TooManyElements { .. })
    ));
    assert!(server.replica(1).target.is_dirty());
    assert!(server.session.dirty_tracker().contains(&ObjectId::new(1)));
    assert!(server.session.dirty_tracker().contains(&ObjectId::new(2)));

    server.replica_mut(2).members.clear().unwrap();
    let updates = server.sweep().unwrap();

    let order: Vec<u64> = updates.iter().map(|update| update.object_id.value()).collect();
    assert_eq!(order, vec![1, 2]);
    assert!(!server.replica(1).target.is_dirty());
    assert!(server.session.dirty_tracker().is_empty());
}
