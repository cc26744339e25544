use crate::world::{
    identity::Identity,
    object::{NetworkObject, SpawnedObjects},
    remote::resolution_registry::ResolutionRegistry,
};

/// What a decoding variable needs to turn an identity into a component:
/// the local spawn table for immediate resolution, and the registry for
/// everything that has not spawned yet.
pub struct Resolver<'r, O: NetworkObject> {
    spawned: &'r dyn SpawnedObjects<O>,
    registry: &'r mut ResolutionRegistry<O>,
}

impl<'r, O: NetworkObject> Resolver<'r, O> {
    pub fn new(spawned: &'r dyn SpawnedObjects<O>, registry: &'r mut ResolutionRegistry<O>) -> Self {
        Self { spawned, registry }
    }

    pub fn locate(&self, identity: &Identity) -> Option<O::Component> {
        self.spawned.locate(identity)
    }

    pub fn registry(&self) -> &ResolutionRegistry<O> {
        self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResolutionRegistry<O> {
        self.registry
    }
}
