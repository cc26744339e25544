use super::identity::{ComponentIndex, Identity, ObjectId};

/// A locally spawned, replicated object, as seen by the reference layer.
///
/// Implemented by the engine integration; the core never creates objects.
pub trait NetworkObject: 'static {
    type Component: NetworkComponent;

    fn object_id(&self) -> ObjectId;

    /// The component at `index` in this object's ordered component list
    fn component_at(&self, index: ComponentIndex) -> Option<Self::Component>;
}

/// A component handle that can be named on the wire
pub trait NetworkComponent: Clone + 'static {
    fn identity(&self) -> Identity;
}

/// The engine's table of locally spawned objects
pub trait SpawnedObjects<O: NetworkObject> {
    fn spawned(&self, object_id: &ObjectId) -> Option<&O>;

    fn locate(&self, identity: &Identity) -> Option<O::Component> {
        self.spawned(&identity.object_id)?
            .component_at(identity.component_index)
    }
}
