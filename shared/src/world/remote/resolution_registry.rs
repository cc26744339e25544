use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use log::{info, warn};

use crate::world::{
    identity::{AwaitKey, ComponentIndex, Identity, ObjectId},
    object::NetworkObject,
};

/// Names a single registration in the `ResolutionRegistry`.
///
/// Every registration gets a fresh handle, and a handle awaits exactly one
/// key. Cancelling and re-registering is how a waiter moves to another key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AwaitHandle(u64);

pub type ObjectCallback<O> = Box<dyn FnOnce(&O)>;
pub type ComponentCallback<O> = Box<dyn FnOnce(&<O as NetworkObject>::Component)>;

enum Waiter<O: NetworkObject> {
    Object(ObjectCallback<O>),
    Component {
        index: ComponentIndex,
        callback: ComponentCallback<O>,
    },
}

struct Registration<O: NetworkObject> {
    waiter: Waiter<O>,
    registered_at: Instant,
}

impl<O: NetworkObject> Registration<O> {
    fn key(&self, object_id: ObjectId) -> AwaitKey {
        match &self.waiter {
            Waiter::Object(_) => AwaitKey::Object(object_id),
            Waiter::Component { index, .. } => {
                AwaitKey::Component(Identity::new(object_id, *index))
            }
        }
    }
}

/// Continuations waiting for objects that are not yet spawned locally.
///
/// `resolve` is driven by the spawn hook and fires every registration for
/// the spawned object exactly once, then forgets the object. Firing order
/// among registrations for the same object is unspecified.
///
/// Registrations never time out by themselves: an object that never spawns
/// keeps its registrations, and whatever their callbacks capture, alive until
/// they are cancelled, evicted with `evict_expired`, or dropped by `clear`.
pub struct ResolutionRegistry<O: NetworkObject> {
    next_handle: u64,
    waiting_objects: HashMap<ObjectId, HashMap<AwaitHandle, Registration<O>>>,
    handle_to_object: HashMap<AwaitHandle, ObjectId>,
    pending_warn_threshold: usize,
}

impl<O: NetworkObject> ResolutionRegistry<O> {
    pub fn new(pending_warn_threshold: usize) -> Self {
        Self {
            next_handle: 0,
            waiting_objects: HashMap::new(),
            handle_to_object: HashMap::new(),
            pending_warn_threshold,
        }
    }

    /// Calls `callback` with the object once it spawns
    pub fn await_object(
        &mut self,
        object_id: ObjectId,
        callback: impl FnOnce(&O) + 'static,
    ) -> AwaitHandle {
        self.insert(object_id, Waiter::Object(Box::new(callback)))
    }

    /// Calls `callback` with the component at `identity.component_index`
    /// once its object spawns
    pub fn await_component(
        &mut self,
        identity: Identity,
        callback: impl FnOnce(&O::Component) + 'static,
    ) -> AwaitHandle {
        self.insert(
            identity.object_id,
            Waiter::Component {
                index: identity.component_index,
                callback: Box::new(callback),
            },
        )
    }

    /// Removes the registration `handle` if it is waiting on `key`.
    /// Returns whether anything was removed.
    pub fn cancel(&mut self, key: &AwaitKey, handle: AwaitHandle) -> bool {
        let object_id = key.object_id();
        if self.handle_to_object.get(&handle) != Some(&object_id) {
            return false;
        }
        let Some(registrations) = self.waiting_objects.get_mut(&object_id) else {
            return false;
        };
        let matches_key = registrations
            .get(&handle)
            .is_some_and(|registration| registration.key(object_id) == *key);
        if !matches_key {
            return false;
        }

        registrations.remove(&handle);
        if registrations.is_empty() {
            self.waiting_objects.remove(&object_id);
        }
        self.handle_to_object.remove(&handle);
        true
    }

    /// Fires every registration waiting on `object`, returning how many fired.
    /// Resolving an object nothing waits on is a no-op.
    pub fn resolve(&mut self, object: &O) -> usize {
        let object_id = object.object_id();
        let Some(registrations) = self.waiting_objects.remove(&object_id) else {
            return 0;
        };

        info!(
            "ResolutionRegistry: object {} spawned, firing {} waiting registrations",
            object_id,
            registrations.len()
        );

        let mut fired = 0;
        for (handle, registration) in registrations {
            self.handle_to_object.remove(&handle);
            match registration.waiter {
                Waiter::Object(callback) => {
                    callback(object);
                    fired += 1;
                }
                Waiter::Component { index, callback } => {
                    let Some(component) = object.component_at(index) else {
                        warn!(
                            "ResolutionRegistry: object {} spawned without a component at index {}, dropping registration",
                            object_id, index
                        );
                        continue;
                    };
                    callback(&component);
                    fired += 1;
                }
            }
        }
        fired
    }

    /// Drops, without firing, every registration that has waited at least
    /// `ttl` as of `now`. Returns how many were dropped.
    pub fn evict_expired(&mut self, now: Instant, ttl: Duration) -> usize {
        let mut evicted = Vec::new();
        for (object_id, registrations) in self.waiting_objects.iter_mut() {
            registrations.retain(|handle, registration| {
                let expired = now.saturating_duration_since(registration.registered_at) >= ttl;
                if expired {
                    evicted.push((*object_id, *handle));
                }
                !expired
            });
        }
        self.waiting_objects
            .retain(|_, registrations| !registrations.is_empty());

        for (object_id, handle) in &evicted {
            warn!(
                "ResolutionRegistry: evicting registration {:?} after waiting {:?} for object {}",
                handle, ttl, object_id
            );
            self.handle_to_object.remove(handle);
        }
        evicted.len()
    }

    /// Drops every registration without firing it. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.handle_to_object.len();
        self.waiting_objects.clear();
        self.handle_to_object.clear();
        dropped
    }

    pub fn is_pending(&self, handle: &AwaitHandle) -> bool {
        self.handle_to_object.contains_key(handle)
    }

    pub fn is_awaiting(&self, object_id: &ObjectId) -> bool {
        self.waiting_objects.contains_key(object_id)
    }

    pub fn pending_count(&self) -> usize {
        self.handle_to_object.len()
    }

    pub fn awaited_objects(&self) -> Vec<ObjectId> {
        self.waiting_objects.keys().copied().collect()
    }

    fn insert(&mut self, object_id: ObjectId, waiter: Waiter<O>) -> AwaitHandle {
        let handle = AwaitHandle(self.next_handle);
        self.next_handle += 1;

        self.waiting_objects.entry(object_id).or_default().insert(
            handle,
            Registration {
                waiter,
                registered_at: Instant::now(),
            },
        );
        self.handle_to_object.insert(handle, object_id);

        let pending = self.handle_to_object.len();
        if pending == self.pending_warn_threshold {
            warn!(
                "ResolutionRegistry: {} registrations are waiting on unspawned objects; they are only released by resolution, cancellation or eviction",
                pending
            );
        }

        handle
    }
}
