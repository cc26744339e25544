use std::{cell::RefCell, collections::HashSet, rc::Rc};

use crate::world::identity::ObjectId;

/// Set of objects with changes not yet captured by a replication sweep.
///
/// Cloning yields another handle onto the same set. Membership only: no
/// ordering is kept and iteration order is unspecified.
#[derive(Clone, Default)]
pub struct DirtyTracker {
    objects: Rc<RefCell<HashSet<ObjectId>>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, object_id: &ObjectId, dirty: bool) {
        let mut objects = self.objects.borrow_mut();
        if dirty {
            objects.insert(*object_id);
        } else {
            objects.remove(object_id);
        }
    }

    pub fn remove(&self, object_id: &ObjectId) {
        self.objects.borrow_mut().remove(object_id);
    }

    pub fn clear(&self) {
        self.objects.borrow_mut().clear();
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.objects.borrow().contains(object_id)
    }

    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }

    pub fn dirty_objects(&self) -> Vec<ObjectId> {
        self.objects.borrow().iter().copied().collect()
    }

    pub fn mutator(&self, object_id: &ObjectId) -> DirtyMutator {
        DirtyMutator {
            tracker: self.clone(),
            object_id: *object_id,
        }
    }
}

/// Handed to a replicated variable so that local writes mark its owning
/// object dirty
#[derive(Clone)]
pub struct DirtyMutator {
    tracker: DirtyTracker,
    object_id: ObjectId,
}

impl DirtyMutator {
    pub fn mutate(&self) {
        self.tracker.mark(&self.object_id, true);
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }
}
