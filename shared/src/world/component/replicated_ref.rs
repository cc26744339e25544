use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use log::info;
use naia_reference_serde::{ByteReader, ByteWrite, Serde};

use crate::world::{
    component::{
        error::ReplicaError,
        listeners::{notify, ListenerId, Listeners},
        ownership::Ownership,
    },
    host::dirty_tracker::DirtyMutator,
    identity::{AwaitKey, Identity},
    object::{NetworkComponent, NetworkObject},
    remote::{
        resolution_registry::{AwaitHandle, ResolutionRegistry},
        resolver::Resolver,
    },
};

struct RefState<C> {
    identity: Option<Identity>,
    // Some exactly when resolved
    value: Option<C>,
    announce_on_resolve: bool,
    pending: Option<(AwaitKey, AwaitHandle)>,
    dirty: bool,
    mutator: Option<DirtyMutator>,
    next_listener_id: u32,
    will_change: Listeners<C>,
    changed: Listeners<C>,
}

impl<C> RefState<C> {
    fn new(identity: Option<Identity>, value: Option<C>) -> Self {
        Self {
            identity,
            value,
            announce_on_resolve: false,
            pending: None,
            dirty: false,
            mutator: None,
            next_listener_id: 0,
            will_change: Listeners::new(),
            changed: Listeners::new(),
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        if let Some(mutator) = &self.mutator {
            mutator.mutate();
        }
    }

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId::new(self.next_listener_id);
        self.next_listener_id += 1;
        id
    }
}

/// A replicated variable holding a reference to a component of another
/// networked object.
///
/// On the wire the reference travels as the component's `Identity`. A peer
/// that decodes an identity whose object has not spawned yet stays
/// unresolved, and resolves through the `ResolutionRegistry` once the object
/// spawns. A newer decode supersedes any resolution still pending.
pub struct ReplicatedRef<O: NetworkObject> {
    ownership: Ownership,
    state: Rc<RefCell<RefState<O::Component>>>,
}

impl<O: NetworkObject> ReplicatedRef<O> {
    /// Create a new, resolved ReplicatedRef on the authority
    pub fn host_owned(value: O::Component) -> Self {
        let identity = value.identity();
        Self {
            ownership: Ownership::HostOwned,
            state: Rc::new(RefCell::new(RefState::new(Some(identity), Some(value)))),
        }
    }

    /// Create a new ReplicatedRef that mirrors an authority, with nothing
    /// received yet
    pub fn remote() -> Self {
        Self {
            ownership: Ownership::RemoteOwned,
            state: Rc::new(RefCell::new(RefState::new(None, None))),
        }
    }

    /// Create a new ReplicatedRef from an incoming full state
    pub fn new_read(reader: &mut ByteReader, resolver: &mut Resolver<O>) -> Result<Self, ReplicaError> {
        let mut new_ref = Self::remote();
        new_ref.read_field(reader, resolver)?;
        Ok(new_ref)
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// The identity last assigned or received, resolved or not
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity
    }

    pub fn is_resolved(&self) -> bool {
        self.state.borrow().value.is_some()
    }

    /// Whether a resolution is still waiting in `registry`. A registration
    /// the registry evicted no longer counts.
    pub fn is_pending(&self, registry: &ResolutionRegistry<O>) -> bool {
        match &self.state.borrow().pending {
            Some((_, handle)) => registry.is_pending(handle),
            None => false,
        }
    }

    pub fn try_value(&self) -> Result<O::Component, ReplicaError> {
        let state = self.state.borrow();
        match (&state.value, state.identity) {
            (Some(value), _) => Ok(value.clone()),
            (None, Some(identity)) => Err(ReplicaError::IllegalState {
                reason: format!("reference to {} has not resolved yet", identity),
            }),
            (None, None) => Err(ReplicaError::IllegalState {
                reason: "reference has not been received yet".to_string(),
            }),
        }
    }

    /// Gets the referenced component. Panics if the reference is unresolved.
    pub fn value(&self) -> O::Component {
        self.try_value()
            .expect("ReplicatedRef value read before resolution")
    }

    /// Assigns a new component. Only the authority may set a reference.
    pub fn try_set(&mut self, value: O::Component) -> Result<(), ReplicaError> {
        if !self.ownership.is_host_owned() {
            return Err(ReplicaError::Permission {
                property_type: self.ownership.name(),
                operation: "be set",
            });
        }

        let (previous, will_change) = {
            let state = self.state.borrow();
            (state.value.clone(), state.will_change.snapshot())
        };
        if let Some(previous) = previous {
            notify(will_change, &previous);
        }

        let changed = {
            let mut state = self.state.borrow_mut();
            state.identity = Some(value.identity());
            state.value = Some(value.clone());
            state.mark_dirty();
            state.changed.snapshot()
        };
        notify(changed, &value);
        Ok(())
    }

    pub fn set(&mut self, value: O::Component) {
        self.try_set(value)
            .expect("Remote ReplicatedRef should never be set manually.")
    }

    /// Registers a listener called with the previous component just before
    /// a resolved reference changes
    pub fn on_will_change(&mut self, listener: impl Fn(&O::Component) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener_id();
        state.will_change.add(id, listener);
        id
    }

    /// Registers a listener called with the new component after a change,
    /// including one that only lands when a pending reference resolves
    pub fn on_changed(&mut self, listener: impl Fn(&O::Component) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener_id();
        state.changed.add(id, listener);
        id
    }

    pub fn remove_listener(&mut self, id: &ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let removed_will_change = state.will_change.remove(id);
        let removed_changed = state.changed.remove(id);
        removed_will_change || removed_changed
    }

    pub fn is_dirty(&self) -> bool {
        self.state.borrow().dirty
    }

    pub fn reset_dirty(&mut self) {
        self.state.borrow_mut().dirty = false;
    }

    /// Set a DirtyMutator to track changes to the reference
    pub fn set_mutator(&mut self, mutator: &DirtyMutator) {
        self.state.borrow_mut().mutator = Some(mutator.clone());
    }

    /// Writes the current identity, resolved or not
    pub fn write_field(&self, writer: &mut dyn ByteWrite) -> Result<(), ReplicaError> {
        let Some(identity) = self.state.borrow().identity else {
            return Err(ReplicaError::IllegalState {
                reason: "ReplicatedRef has no identity to write".to_string(),
            });
        };
        identity.ser_safe(writer)?;
        Ok(())
    }

    /// Writes the identity if it changed since the last `reset_dirty`.
    /// Returns whether anything was written.
    pub fn write_delta(&self, writer: &mut dyn ByteWrite) -> Result<bool, ReplicaError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.write_field(writer)?;
        Ok(true)
    }

    /// Reads a full state. Does not notify listeners when resolving
    /// immediately, nor when a pending resolution completes later.
    pub fn read_field(
        &mut self,
        reader: &mut ByteReader,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError> {
        let identity = reader
            .read_value_safe::<Identity>()
            .map_err(ReplicaError::from_read)?;
        self.assign(identity, false, resolver);
        Ok(())
    }

    /// Reads a delta. With `keep_dirty_delta` the reference becomes dirty
    /// again so a relay forwards what it received.
    pub fn read_delta(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError> {
        let identity = reader
            .read_value_safe::<Identity>()
            .map_err(ReplicaError::from_read)?;

        let (previous, will_change) = {
            let state = self.state.borrow();
            (state.value.clone(), state.will_change.snapshot())
        };
        if let Some(previous) = previous {
            notify(will_change, &previous);
        }

        self.assign(identity, true, resolver);

        if keep_dirty_delta {
            self.state.borrow_mut().mark_dirty();
        }
        Ok(())
    }

    /// Drops a pending resolution, if any. Owners call this before
    /// discarding a reference that may still be waiting.
    pub fn cancel_pending(&mut self, registry: &mut ResolutionRegistry<O>) -> bool {
        let pending = self.state.borrow_mut().pending.take();
        match pending {
            Some((key, handle)) => registry.cancel(&key, handle),
            None => false,
        }
    }

    fn assign(&mut self, identity: Identity, announce: bool, resolver: &mut Resolver<O>) {
        let superseded = self.state.borrow_mut().pending.take();
        if let Some((key, handle)) = superseded {
            info!(
                "ReplicatedRef: reference to {} superseded by {} before resolving",
                key.object_id(),
                identity
            );
            resolver.registry_mut().cancel(&key, handle);
        }

        match resolver.locate(&identity) {
            Some(component) => {
                let changed = {
                    let mut state = self.state.borrow_mut();
                    state.identity = Some(identity);
                    state.value = Some(component.clone());
                    state.changed.snapshot()
                };
                if announce {
                    notify(changed, &component);
                }
            }
            None => {
                let state = Rc::downgrade(&self.state);
                let handle = resolver
                    .registry_mut()
                    .await_component(identity, move |component| complete(&state, component));

                let mut state = self.state.borrow_mut();
                state.identity = Some(identity);
                state.value = None;
                state.announce_on_resolve = announce;
                state.pending = Some((AwaitKey::Component(identity), handle));
            }
        }
    }
}

fn complete<C: Clone>(state: &Weak<RefCell<RefState<C>>>, component: &C) {
    // the variable was dropped while waiting
    let Some(state) = state.upgrade() else {
        return;
    };
    let (announce, changed) = {
        let mut state = state.borrow_mut();
        state.pending = None;
        state.value = Some(component.clone());
        (state.announce_on_resolve, state.changed.snapshot())
    };
    if announce {
        notify(changed, component);
    }
}
