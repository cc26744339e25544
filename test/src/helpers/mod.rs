pub mod test_peer;

pub use packet_exchange::{exchange_full_state, exchange_updates, relay_updates};
pub use test_peer::TestPeer;
pub use test_replica::{TestReplica, TestReplicas};

/// Assert that a peer has nothing left waiting on unspawned objects
#[macro_export]
macro_rules! assert_fully_resolved {
    ($peer:expr) => {
        assert_eq!(
            $peer.session.registry().pending_count(),
            0,
            "peer still has registrations waiting on objects {:?}",
            $peer.session.registry().awaited_objects()
        );
    };
}
