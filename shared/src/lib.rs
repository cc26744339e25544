//! # Naia Reference
//! Replicated variables that hold references to components of other
//! networked objects, resolving late when a referenced object spawns after
//! the reference arrives.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use naia_reference_serde::{
    ByteCounter, ByteReader, ByteWrite, ByteWriter, ConstByteLength, Serde, SerdeErr,
    StreamWriter, MTU_SIZE_BYTES,
};

mod config;
mod types;
mod world;

pub use config::ReplicationConfig;
pub use types::HostType;
pub use world::{
    component::{
        error::ReplicaError,
        list_event::{ListChange, ListEvent, ListEventType},
        listeners::ListenerId,
        ownership::Ownership,
        replicated_list::ReplicatedList,
        replicated_ref::ReplicatedRef,
        replicated_variable::ReplicatedVariable,
    },
    host::dirty_tracker::{DirtyMutator, DirtyTracker},
    identity::{AwaitKey, ComponentIndex, Identity, ObjectId},
    object::{NetworkComponent, NetworkObject, SpawnedObjects},
    remote::{
        resolution_registry::{AwaitHandle, ComponentCallback, ObjectCallback, ResolutionRegistry},
        resolver::Resolver,
    },
    replica::{
        bind_replica, cancel_replica_pending, read_replica_full, read_replica_update,
        reset_replica_dirty, write_replica_full, write_replica_update, Replica, ReplicaStore,
    },
    replication_session::{ObjectUpdate, ReplicationSession},
};
