use std::time::Instant;

use log::{info, warn};
use naia_reference_serde::{ByteReader, StreamWriter};

use crate::{
    config::ReplicationConfig,
    types::HostType,
    world::{
        component::{error::ReplicaError, replicated_list::ReplicatedList},
        host::dirty_tracker::DirtyTracker,
        identity::ObjectId,
        object::{NetworkObject, SpawnedObjects},
        remote::{resolution_registry::ResolutionRegistry, resolver::Resolver},
        replica::{
            bind_replica, cancel_replica_pending, read_replica_full, read_replica_update,
            reset_replica_dirty, write_replica_update, Replica, ReplicaStore,
        },
    },
};

/// Encoded changes for one object, produced by a sweep
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectUpdate {
    pub object_id: ObjectId,
    pub payload: Vec<u8>,
}

/// Per-connection replication state: the dirty set the authority sweeps,
/// and the registry of references waiting on objects that have not spawned.
///
/// Everything here is driven from a single thread, once per tick.
pub struct ReplicationSession<O: NetworkObject> {
    host_type: HostType,
    config: ReplicationConfig,
    dirty_tracker: DirtyTracker,
    registry: ResolutionRegistry<O>,
}

impl<O: NetworkObject> ReplicationSession<O> {
    pub fn open(host_type: HostType, config: ReplicationConfig) -> Self {
        info!("ReplicationSession: opened as {:?}", host_type);
        let registry = ResolutionRegistry::new(config.pending_warn_threshold);
        Self {
            host_type,
            config,
            dirty_tracker: DirtyTracker::new(),
            registry,
        }
    }

    /// Ends the session, dropping every pending registration unfired.
    /// Returns how many were dropped.
    pub fn close(mut self) -> usize {
        let dropped = self.registry.clear();
        if dropped > 0 {
            warn!(
                "ReplicationSession: closing with {} registrations still waiting on unspawned objects",
                dropped
            );
        }
        self.dirty_tracker.clear();
        info!("ReplicationSession: closed");
        dropped
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    pub fn dirty_tracker(&self) -> &DirtyTracker {
        &self.dirty_tracker
    }

    pub fn registry(&self) -> &ResolutionRegistry<O> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResolutionRegistry<O> {
        &mut self.registry
    }

    pub fn resolver<'s>(&'s mut self, spawned: &'s dyn SpawnedObjects<O>) -> Resolver<'s, O> {
        Resolver::new(spawned, &mut self.registry)
    }

    /// An authority list with this session's event log capacity
    pub fn host_list(&self, items: Vec<O::Component>) -> ReplicatedList<O> {
        ReplicatedList::host_owned(items).with_event_capacity(self.config.delta_event_capacity)
    }

    /// Starts tracking local writes to `replica`
    pub fn bind(&self, replica: &mut dyn Replica<O>) {
        bind_replica(replica, &self.dirty_tracker);
    }

    /// Spawn hook. Fires every registration waiting on `object`.
    pub fn object_spawned(&mut self, object: &O) -> usize {
        self.registry.resolve(object)
    }

    /// Despawn hook. The object leaves the dirty set, and the registrations
    /// its replica's variables were waiting on are released.
    pub fn object_despawned(&mut self, replica: &mut dyn Replica<O>) {
        self.dirty_tracker.remove(&replica.object_id());
        cancel_replica_pending(replica, &mut self.registry);
    }

    /// Encodes every dirty replica as an update and clears its dirty state.
    /// Updates come out in object id order.
    ///
    /// Dirty state is only cleared once every replica has encoded. If any
    /// replica fails, the error is returned and everything stays dirty for
    /// the next sweep.
    pub fn sweep(
        &mut self,
        replicas: &mut dyn ReplicaStore<O>,
    ) -> Result<Vec<ObjectUpdate>, ReplicaError> {
        let mut dirty_objects = self.dirty_tracker.dirty_objects();
        dirty_objects.sort();

        let mut updates = Vec::new();
        let mut swept = Vec::new();
        for object_id in dirty_objects {
            let Some(replica) = replicas.replica(&object_id) else {
                warn!(
                    "ReplicationSession: object {} is marked dirty but has no replica",
                    object_id
                );
                self.dirty_tracker.remove(&object_id);
                continue;
            };

            let mut writer = StreamWriter::new();
            let written = match write_replica_update(replica, &mut writer) {
                Ok(written) => written,
                Err(error) => {
                    warn!(
                        "ReplicationSession: object {} failed to encode, {} objects stay dirty: {}",
                        object_id,
                        self.dirty_tracker.len(),
                        error
                    );
                    return Err(error);
                }
            };
            if written {
                updates.push(ObjectUpdate {
                    object_id,
                    payload: writer.to_bytes(),
                });
            }
            swept.push(object_id);
        }

        for object_id in swept {
            if let Some(replica) = replicas.replica_mut(&object_id) {
                reset_replica_dirty(replica);
            }
            self.dirty_tracker.mark(&object_id, false);
        }
        Ok(updates)
    }

    /// Applies an update produced by the authority's `sweep`
    pub fn apply_update(
        &mut self,
        update: &ObjectUpdate,
        replicas: &mut dyn ReplicaStore<O>,
        spawned: &dyn SpawnedObjects<O>,
        keep_dirty_delta: bool,
    ) -> Result<(), ReplicaError> {
        let Some(replica) = replicas.replica_mut(&update.object_id) else {
            return Err(ReplicaError::protocol_violation(format!(
                "update for object {} which has no replica",
                update.object_id
            )));
        };
        let mut resolver = Resolver::new(spawned, &mut self.registry);
        read_replica_update(
            replica,
            &mut ByteReader::new(&update.payload),
            keep_dirty_delta,
            &mut resolver,
        )
    }

    /// Reads a replica's full state, as written by `write_replica_full`
    pub fn apply_full(
        &mut self,
        payload: &[u8],
        replica: &mut dyn Replica<O>,
        spawned: &dyn SpawnedObjects<O>,
    ) -> Result<(), ReplicaError> {
        let mut resolver = Resolver::new(spawned, &mut self.registry);
        read_replica_full(replica, &mut ByteReader::new(payload), &mut resolver)
    }

    /// Drops registrations older than the configured `pending_ttl`.
    /// Does nothing when no ttl is configured.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        match self.config.pending_ttl {
            Some(ttl) => self.registry.evict_expired(now, ttl),
            None => 0,
        }
    }
}
