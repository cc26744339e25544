use log::warn;
use naia_reference_serde::{ByteReader, ByteWrite, Serde};

use crate::world::{
    component::{error::ReplicaError, replicated_variable::ReplicatedVariable},
    host::dirty_tracker::DirtyTracker,
    identity::ObjectId,
    object::NetworkObject,
    remote::{resolution_registry::ResolutionRegistry, resolver::Resolver},
};

/// The replicated state of one networked object: an ordered set of
/// variables, addressed on the wire by their position.
pub trait Replica<O: NetworkObject> {
    fn object_id(&self) -> ObjectId;
    fn variable_count(&self) -> u8;
    fn variable(&self, index: u8) -> Option<&dyn ReplicatedVariable<O>>;
    fn variable_mut(&mut self, index: u8) -> Option<&mut dyn ReplicatedVariable<O>>;
}

/// The engine's table of replicas, keyed by the object they belong to
pub trait ReplicaStore<O: NetworkObject> {
    fn replica(&self, object_id: &ObjectId) -> Option<&dyn Replica<O>>;
    fn replica_mut(&mut self, object_id: &ObjectId) -> Option<&mut dyn Replica<O>>;
}

/// Points every variable of `replica` at the tracker, so local writes mark
/// the object dirty
pub fn bind_replica<O: NetworkObject>(replica: &mut dyn Replica<O>, tracker: &DirtyTracker) {
    let mutator = tracker.mutator(&replica.object_id());
    for index in 0..replica.variable_count() {
        if let Some(variable) = replica.variable_mut(index) {
            variable.set_mutator(&mutator);
        }
    }
}

/// Writes every variable's full state, in order
pub fn write_replica_full<O: NetworkObject>(
    replica: &dyn Replica<O>,
    writer: &mut dyn ByteWrite,
) -> Result<(), ReplicaError> {
    for index in 0..replica.variable_count() {
        missing_variable(replica.variable(index), index)?.write_field(writer)?;
    }
    Ok(())
}

pub fn read_replica_full<O: NetworkObject>(
    replica: &mut dyn Replica<O>,
    reader: &mut ByteReader,
    resolver: &mut Resolver<O>,
) -> Result<(), ReplicaError> {
    for index in 0..replica.variable_count() {
        missing_variable(replica.variable_mut(index), index)?.read_field(reader, resolver)?;
    }
    Ok(())
}

/// Writes `[u8 count]([u8 variable index][delta])*` for the dirty
/// variables. Returns whether any variable was dirty.
pub fn write_replica_update<O: NetworkObject>(
    replica: &dyn Replica<O>,
    writer: &mut dyn ByteWrite,
) -> Result<bool, ReplicaError> {
    let mut dirty = Vec::new();
    for index in 0..replica.variable_count() {
        if missing_variable(replica.variable(index), index)?.is_dirty() {
            dirty.push(index);
        }
    }
    if dirty.is_empty() {
        return Ok(false);
    }

    // at most variable_count entries, so this always fits a u8
    let count = dirty.len() as u8;
    count.ser_safe(writer)?;
    for index in dirty {
        index.ser_safe(writer)?;
        missing_variable(replica.variable(index), index)?.write_delta(writer)?;
    }
    Ok(true)
}

pub fn read_replica_update<O: NetworkObject>(
    replica: &mut dyn Replica<O>,
    reader: &mut ByteReader,
    keep_dirty_delta: bool,
    resolver: &mut Resolver<O>,
) -> Result<(), ReplicaError> {
    let object_id = replica.object_id();
    let variable_count = replica.variable_count();
    let count = reader
        .read_value_safe::<u8>()
        .map_err(ReplicaError::from_read)?;
    for _ in 0..count {
        let index = reader
            .read_value_safe::<u8>()
            .map_err(ReplicaError::from_read)?;
        let Some(variable) = replica.variable_mut(index) else {
            return Err(ReplicaError::protocol_violation(format!(
                "update for object {} names variable {}, but it has {}",
                object_id,
                index,
                variable_count
            )));
        };
        variable.read_delta(reader, keep_dirty_delta, resolver)?;
    }
    Ok(())
}

pub fn reset_replica_dirty<O: NetworkObject>(replica: &mut dyn Replica<O>) {
    for index in 0..replica.variable_count() {
        if let Some(variable) = replica.variable_mut(index) {
            variable.reset_dirty();
        }
    }
}

/// Releases every registration the replica's variables still wait on
pub fn cancel_replica_pending<O: NetworkObject>(
    replica: &mut dyn Replica<O>,
    registry: &mut ResolutionRegistry<O>,
) {
    for index in 0..replica.variable_count() {
        if let Some(variable) = replica.variable_mut(index) {
            variable.cancel_pending(registry);
        }
    }
}

fn missing_variable<V>(variable: Option<V>, index: u8) -> Result<V, ReplicaError> {
    variable.ok_or_else(|| {
        warn!("Replica: variable {} is listed but not present", index);
        ReplicaError::IllegalState {
            reason: format!("replica has no variable at index {}", index),
        }
    })
}
