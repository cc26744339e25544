use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a ReplicationSession
#[derive(Clone, Debug)]
pub struct ReplicationConfig {
    /// A warning is logged each time the number of registrations waiting on
    /// unspawned objects grows to this value. Registrations never expire on
    /// their own, so a peer that keeps referencing objects it never spawns
    /// grows the registry without bound.
    pub pending_warn_threshold: usize,
    /// When set, `ReplicationSession::evict_expired` drops registrations
    /// that have waited at least this long, without firing them.
    /// `None` keeps every registration until it resolves or is cancelled.
    pub pending_ttl: Option<Duration>,
    /// Initial capacity of a replicated list's outgoing event log
    pub delta_event_capacity: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            pending_warn_threshold: 1024,
            pending_ttl: None,
            delta_event_capacity: 64,
        }
    }
}
