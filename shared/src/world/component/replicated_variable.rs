use naia_reference_serde::{ByteReader, ByteWrite};

use crate::world::{
    component::{error::ReplicaError, replicated_list::ReplicatedList, replicated_ref::ReplicatedRef},
    host::dirty_tracker::DirtyMutator,
    object::NetworkObject,
    remote::{resolution_registry::ResolutionRegistry, resolver::Resolver},
};

/// A variable of a replica that can be encoded in full or as a delta
pub trait ReplicatedVariable<O: NetworkObject> {
    fn is_dirty(&self) -> bool;
    fn reset_dirty(&mut self);
    fn set_mutator(&mut self, mutator: &DirtyMutator);
    fn write_field(&self, writer: &mut dyn ByteWrite) -> Result<(), ReplicaError>;
    /// Returns whether anything was written
    fn write_delta(&self, writer: &mut dyn ByteWrite) -> Result<bool, ReplicaError>;
    fn read_field(
        &mut self,
        reader: &mut ByteReader,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError>;
    fn read_delta(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError>;
    /// Releases every registration the variable still waits on
    fn cancel_pending(&mut self, registry: &mut ResolutionRegistry<O>);
}

impl<O: NetworkObject> ReplicatedVariable<O> for ReplicatedRef<O> {
    fn is_dirty(&self) -> bool {
        ReplicatedRef::is_dirty(self)
    }

    fn reset_dirty(&mut self) {
        ReplicatedRef::reset_dirty(self)
    }

    fn set_mutator(&mut self, mutator: &DirtyMutator) {
        ReplicatedRef::set_mutator(self, mutator)
    }

    fn write_field(&self, writer: &mut dyn ByteWrite) -> Result<(), ReplicaError> {
        ReplicatedRef::write_field(self, writer)
    }

    fn write_delta(&self, writer: &mut dyn ByteWrite) -> Result<bool, ReplicaError> {
        ReplicatedRef::write_delta(self, writer)
    }

    fn read_field(
        &mut self,
        reader: &mut ByteReader,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError> {
        ReplicatedRef::read_field(self, reader, resolver)
    }

    fn read_delta(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError> {
        ReplicatedRef::read_delta(self, reader, keep_dirty_delta, resolver)
    }

    fn cancel_pending(&mut self, registry: &mut ResolutionRegistry<O>) {
        ReplicatedRef::cancel_pending(self, registry);
    }
}

impl<O: NetworkObject> ReplicatedVariable<O> for ReplicatedList<O> {
    fn is_dirty(&self) -> bool {
        ReplicatedList::is_dirty(self)
    }

    fn reset_dirty(&mut self) {
        ReplicatedList::reset_dirty(self)
    }

    fn set_mutator(&mut self, mutator: &DirtyMutator) {
        ReplicatedList::set_mutator(self, mutator)
    }

    fn write_field(&self, writer: &mut dyn ByteWrite) -> Result<(), ReplicaError> {
        ReplicatedList::write_field(self, writer)
    }

    fn write_delta(&self, writer: &mut dyn ByteWrite) -> Result<bool, ReplicaError> {
        ReplicatedList::write_delta(self, writer)
    }

    fn read_field(
        &mut self,
        reader: &mut ByteReader,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError> {
        ReplicatedList::read_field(self, reader, resolver)
    }

    fn read_delta(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError> {
        ReplicatedList::read_delta(self, reader, keep_dirty_delta, resolver)
    }

    fn cancel_pending(&mut self, registry: &mut ResolutionRegistry<O>) {
        ReplicatedList::cancel_pending(self, registry);
    }
}
