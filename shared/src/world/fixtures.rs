use std::collections::HashMap;

use crate::world::{
    identity::{ComponentIndex, Identity, ObjectId},
    object::{NetworkComponent, NetworkObject, SpawnedObjects},
};

#[derive(Clone, Debug, PartialEq)]
pub struct FakeComponent(pub Identity);

impl NetworkComponent for FakeComponent {
    fn identity(&self) -> Identity {
        self.0
    }
}

pub struct FakeObject {
    id: ObjectId,
    component_count: u16,
}

impl NetworkObject for FakeObject {
    type Component = FakeComponent;

    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn component_at(&self, index: ComponentIndex) -> Option<FakeComponent> {
        (index < self.component_count).then(|| FakeComponent(Identity::new(self.id, index)))
    }
}

#[derive(Default)]
pub struct FakeWorld {
    objects: HashMap<ObjectId, FakeObject>,
}

impl FakeWorld {
    pub fn spawn(&mut self, id: u64) -> &FakeObject {
        let id = ObjectId::new(id);
        self.objects.entry(id).or_insert(FakeObject {
            id,
            component_count: 4,
        })
    }
}

impl SpawnedObjects<FakeObject> for FakeWorld {
    fn spawned(&self, object_id: &ObjectId) -> Option<&FakeObject> {
        self.objects.get(object_id)
    }
}

pub fn component(object: u64, index: ComponentIndex) -> FakeComponent {
    FakeComponent(Identity::new(ObjectId::new(object), index))
}
