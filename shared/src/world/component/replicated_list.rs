use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use log::warn;
use naia_reference_serde::{ByteReader, ByteWrite, ConstByteLength, Serde, SerdeErr};

use crate::world::{
    component::{
        error::ReplicaError,
        list_event::{ListChange, ListEvent, ListEventType},
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

enum Slot<C> {
    Resolved(C),
    Pending {
        identity: Identity,
        token: u64,
        handle: AwaitHandle,
    },
}

impl<C: NetworkComponent> Slot<C> {
    fn identity(&self) -> Identity {
        match self {
            Slot::Resolved(component) => component.identity(),
            Slot::Pending { identity, .. } => *identity,
        }
    }

    fn resolved(&self) -> Option<&C> {
        match self {
            Slot::Resolved(component) => Some(component),
            Slot::Pending { .. } => None,
        }
    }

    fn into_resolved(self) -> Option<C> {
        match self {
            Slot::Resolved(component) => Some(component),
            Slot::Pending { .. } => None,
        }
    }

    fn pending_registration(&self) -> Option<(AwaitKey, AwaitHandle)> {
        match self {
            Slot::Resolved(_) => None,
            Slot::Pending {
                identity, handle, ..
            } => Some((AwaitKey::Component(*identity), *handle)),
        }
    }
}

struct ListState<C> {
    // authoritative order, resolved or not
    slots: Vec<Slot<C>>,
    events: Vec<ListEvent>,
    full_dirty: bool,
    mutator: Option<DirtyMutator>,
    next_token: u64,
    next_listener_id: u32,
    listeners: Listeners<ListChange<C>>,
}

impl<C: NetworkComponent> ListState<C> {
    fn new(slots: Vec<Slot<C>>) -> Self {
        Self {
            slots,
            events: Vec::new(),
            full_dirty: false,
            mutator: None,
            next_token: 0,
            next_listener_id: 0,
            listeners: Listeners::new(),
        }
    }

    /// Index of `slot_index` among resolved slots only
    fn visible_index(&self, slot_index: usize) -> usize {
        self.slots[..slot_index]
            .iter()
            .filter(|slot| slot.resolved().is_some())
            .count()
    }

    /// Slot index of the `index`-th resolved slot
    fn slot_index_of_visible(&self, index: usize) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.resolved().is_some())
            .nth(index)
            .map(|(slot_index, _)| slot_index)
    }

    fn log(&mut self, event: ListEvent) {
        self.events.push(event);
        self.mutate();
    }

    fn mutate(&self) {
        if let Some(mutator) = &self.mutator {
            mutator.mutate();
        }
    }

    fn pending_registrations(&self) -> Vec<(AwaitKey, AwaitHandle)> {
        self.slots
            .iter()
            .filter_map(Slot::pending_registration)
            .collect()
    }

    fn write_slots(&self, writer: &mut dyn ByteWrite) -> Result<(), ReplicaError> {
        let len = self.slots.len();
        let count = u16::try_from(len).map_err(|_| ReplicaError::TooManyElements { len })?;
        let length = 2 + len * Identity::const_byte_length();
        if !writer.try_begin_write(length) {
            return Err(ReplicaError::Codec(SerdeErr::CapacityExceeded {
                requested: length,
                available: writer.available(),
            }));
        }
        count.ser(writer)?;
        for slot in &self.slots {
            slot.identity().ser(writer)?;
        }
        Ok(())
    }
}

/// A replicated, ordered collection of references to components of other
/// networked objects.
///
/// The authority records every structural change in an event log, which
/// `write_delta` replays onto observers. An observer keeps elements whose
/// object has not spawned yet as placeholders in authoritative order, so a
/// late resolution lands where the authority put it. Accessors and listeners
/// only ever see resolved elements.
pub struct ReplicatedList<O: NetworkObject> {
    ownership: Ownership,
    state: Rc<RefCell<ListState<O::Component>>>,
}

impl<O: NetworkObject> ReplicatedList<O> {
    /// Create a new ReplicatedList on the authority
    pub fn host_owned(items: Vec<O::Component>) -> Self {
        let slots = items.into_iter().map(Slot::Resolved).collect();
        Self {
            ownership: Ownership::HostOwned,
            state: Rc::new(RefCell::new(ListState::new(slots))),
        }
    }

    /// Create a new, empty ReplicatedList that mirrors an authority
    pub fn remote() -> Self {
        Self {
            ownership: Ownership::RemoteOwned,
            state: Rc::new(RefCell::new(ListState::new(Vec::new()))),
        }
    }

    /// Create a new ReplicatedList from an incoming full state
    pub fn new_read(reader: &mut ByteReader, resolver: &mut Resolver<O>) -> Result<Self, ReplicaError> {
        let mut new_list = Self::remote();
        new_list.read_field(reader, resolver)?;
        Ok(new_list)
    }

    pub fn with_event_capacity(self, capacity: usize) -> Self {
        self.state.borrow_mut().events.reserve(capacity);
        self
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Number of resolved elements
    pub fn len(&self) -> usize {
        self.state
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.resolved().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements still waiting for their object to spawn
    pub fn pending_len(&self) -> usize {
        self.slot_len() - self.len()
    }

    /// Number of elements in the authority's sequence, resolved or not
    pub fn slot_len(&self) -> usize {
        self.state.borrow().slots.len()
    }

    pub fn get(&self, index: usize) -> Option<O::Component> {
        let state = self.state.borrow();
        let slot_index = state.slot_index_of_visible(index)?;
        state.slots[slot_index].resolved().cloned()
    }

    /// Resolved elements, in order
    pub fn items(&self) -> Vec<O::Component> {
        self.state
            .borrow()
            .slots
            .iter()
            .filter_map(|slot| slot.resolved().cloned())
            .collect()
    }

    /// Identities of every element, resolved or not, in authoritative order
    pub fn identities(&self) -> Vec<Identity> {
        self.state.borrow().slots.iter().map(Slot::identity).collect()
    }

    /// Registers a listener called after each change to the resolved elements
    pub fn on_change(&mut self, listener: impl Fn(&ListChange<O::Component>) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId::new(state.next_listener_id);
        state.next_listener_id += 1;
        state.listeners.add(id, listener);
        id
    }

    pub fn remove_listener(&mut self, id: &ListenerId) -> bool {
        self.state.borrow_mut().listeners.remove(id)
    }

    // Authority mutations

    pub fn push(&mut self, value: O::Component) -> Result<(), ReplicaError> {
        self.check_authority("be pushed to")?;
        let index = {
            let mut state = self.state.borrow_mut();
            state.log(ListEvent::add(value.identity()));
            state.slots.push(Slot::Resolved(value.clone()));
            state.slots.len() - 1
        };
        self.emit(ListChange::new(ListEventType::Add, index, Some(value), None));
        Ok(())
    }

    pub fn insert(&mut self, index: usize, value: O::Component) -> Result<(), ReplicaError> {
        self.check_authority("be inserted into")?;
        let wire_index = self.check_index(index, true)?;
        {
            let mut state = self.state.borrow_mut();
            state.log(ListEvent::insert(wire_index, value.identity()));
            state.slots.insert(index, Slot::Resolved(value.clone()));
        }
        self.emit(ListChange::new(ListEventType::Insert, index, Some(value), None));
        Ok(())
    }

    /// Removes the first element referencing the same component as `value`.
    /// Returns whether one was found.
    pub fn remove(&mut self, value: &O::Component) -> Result<bool, ReplicaError> {
        self.check_authority("be removed from")?;
        let identity = value.identity();
        let removed = {
            let mut state = self.state.borrow_mut();
            let Some(index) = state
                .slots
                .iter()
                .position(|slot| slot.identity() == identity)
            else {
                return Ok(false);
            };
            state.log(ListEvent::remove(identity));
            (index, state.slots.remove(index).into_resolved())
        };
        let (index, value) = removed;
        self.emit(ListChange::new(ListEventType::Remove, index, value, None));
        Ok(true)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<O::Component, ReplicaError> {
        self.check_authority("be removed from")?;
        let wire_index = self.check_index(index, false)?;
        let removed = {
            let mut state = self.state.borrow_mut();
            state.log(ListEvent::remove_at(wire_index));
            state.slots.remove(index).into_resolved()
        };
        let Some(removed) = removed else {
            return Err(ReplicaError::IllegalState {
                reason: format!("authority list element {} was unresolved", index),
            });
        };
        self.emit(ListChange::new(
            ListEventType::RemoveAt,
            index,
            Some(removed.clone()),
            None,
        ));
        Ok(removed)
    }

    /// Replaces the element at `index`
    pub fn set(&mut self, index: usize, value: O::Component) -> Result<(), ReplicaError> {
        self.check_authority("be assigned")?;
        let wire_index = self.check_index(index, false)?;
        let previous = {
            let mut state = self.state.borrow_mut();
            state.log(ListEvent::value(wire_index, value.identity()));
            std::mem::replace(&mut state.slots[index], Slot::Resolved(value.clone())).into_resolved()
        };
        self.emit(ListChange::new(ListEventType::Value, index, Some(value), previous));
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), ReplicaError> {
        self.check_authority("be cleared")?;
        {
            let mut state = self.state.borrow_mut();
            state.log(ListEvent::clear());
            state.slots.clear();
        }
        self.emit(ListChange::new(ListEventType::Clear, 0, None, None));
        Ok(())
    }

    /// Makes the next delta carry the whole list instead of the event log
    pub fn mark_full_dirty(&mut self) {
        let mut state = self.state.borrow_mut();
        state.full_dirty = true;
        state.mutate();
    }

    pub fn is_dirty(&self) -> bool {
        let state = self.state.borrow();
        state.full_dirty || !state.events.is_empty()
    }

    pub fn reset_dirty(&mut self) {
        let mut state = self.state.borrow_mut();
        state.full_dirty = false;
        state.events.clear();
    }

    /// Set a DirtyMutator to track changes to the list
    pub fn set_mutator(&mut self, mutator: &DirtyMutator) {
        self.state.borrow_mut().mutator = Some(mutator.clone());
    }

    /// Writes every element's identity, resolved or not
    pub fn write_field(&self, writer: &mut dyn ByteWrite) -> Result<(), ReplicaError> {
        self.state.borrow().write_slots(writer)
    }

    /// Writes the event log since the last `reset_dirty`, or a single `Full`
    /// event when the list was marked full dirty or the log can't be counted
    /// in a u16. Returns whether anything was written.
    pub fn write_delta(&self, writer: &mut dyn ByteWrite) -> Result<bool, ReplicaError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        let state = self.state.borrow();
        match u16::try_from(state.events.len()) {
            Ok(count) if !state.full_dirty => {
                count.ser_safe(writer)?;
                for event in &state.events {
                    event.write(writer)?;
                }
            }
            _ => {
                1u16.ser_safe(writer)?;
                ListEventType::Full.ser_safe(writer)?;
                state.write_slots(writer)?;
            }
        }
        Ok(true)
    }

    /// Reads a full state, replacing the sequence. Listeners are not
    /// notified, including for elements that resolve later.
    pub fn read_field(
        &mut self,
        reader: &mut ByteReader,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError> {
        let identities = read_full_state(reader)?;
        self.replace_all(identities, resolver);
        Ok(())
    }

    /// Replays a delta. Events before a malformed one stay applied.
    /// With `keep_dirty_delta` every applied event is logged again so a relay
    /// forwards it.
    pub fn read_delta(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<(), ReplicaError> {
        let count = reader
            .read_value_safe::<u16>()
            .map_err(ReplicaError::from_read)?;
        for _ in 0..count {
            let kind = reader
                .read_value_safe::<ListEventType>()
                .map_err(ReplicaError::from_read)?;
            let change = match kind {
                ListEventType::Add => self.replay_add(reader, keep_dirty_delta, resolver)?,
                ListEventType::Insert => self.replay_insert(reader, keep_dirty_delta, resolver)?,
                ListEventType::Remove => self.replay_remove(reader, keep_dirty_delta, resolver)?,
                ListEventType::RemoveAt => {
                    self.replay_remove_at(reader, keep_dirty_delta, resolver)?
                }
                ListEventType::Value => self.replay_value(reader, keep_dirty_delta, resolver)?,
                ListEventType::Clear => self.replay_clear(keep_dirty_delta, resolver),
                ListEventType::Full => self.replay_full(reader, keep_dirty_delta, resolver)?,
            };
            if let Some(change) = change {
                self.emit(change);
            }
        }
        Ok(())
    }

    /// Drops every element still waiting for its object, cancelling its
    /// registration. Returns how many were dropped.
    pub fn cancel_pending(&mut self, registry: &mut ResolutionRegistry<O>) -> usize {
        let registrations = {
            let mut state = self.state.borrow_mut();
            let registrations = state.pending_registrations();
            state.slots.retain(|slot| slot.resolved().is_some());
            registrations
        };
        for (key, handle) in &registrations {
            registry.cancel(key, *handle);
        }
        registrations.len()
    }

    fn check_authority(&self, operation: &'static str) -> Result<(), ReplicaError> {
        if self.ownership.is_host_owned() {
            return Ok(());
        }
        Err(ReplicaError::Permission {
            property_type: self.ownership.name(),
            operation,
        })
    }

    fn check_index(&self, index: usize, inclusive_end: bool) -> Result<i32, ReplicaError> {
        let len = self.slot_len();
        let in_range = if inclusive_end { index <= len } else { index < len };
        if !in_range {
            return Err(ReplicaError::IndexOutOfRange { index, len });
        }
        i32::try_from(index).map_err(|_| ReplicaError::TooManyElements { len })
    }

    fn emit(&self, change: ListChange<O::Component>) {
        let listeners = self.state.borrow().listeners.snapshot();
        notify(listeners, &change);
    }

    /// Resolves `identity` now if its object is spawned, otherwise registers
    /// a placeholder that fills itself in on spawn
    fn make_slot(&self, identity: Identity, resolver: &mut Resolver<O>) -> Slot<O::Component> {
        if let Some(component) = resolver.locate(&identity) {
            return Slot::Resolved(component);
        }
        let token = {
            let mut state = self.state.borrow_mut();
            let token = state.next_token;
            state.next_token += 1;
            token
        };
        let state = Rc::downgrade(&self.state);
        let handle = resolver
            .registry_mut()
            .await_component(identity, move |component| complete(&state, token, component));
        Slot::Pending {
            identity,
            token,
            handle,
        }
    }

    fn cancel_slot(slot: &Slot<O::Component>, resolver: &mut Resolver<O>) {
        if let Some((key, handle)) = slot.pending_registration() {
            resolver.registry_mut().cancel(&key, handle);
        }
    }

    fn replace_all(&mut self, identities: Vec<Identity>, resolver: &mut Resolver<O>) {
        let previous = std::mem::take(&mut self.state.borrow_mut().slots);
        for slot in &previous {
            Self::cancel_slot(slot, resolver);
        }
        let slots = identities
            .into_iter()
            .map(|identity| self.make_slot(identity, resolver))
            .collect();
        self.state.borrow_mut().slots = slots;
    }

    fn replay_add(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<Option<ListChange<O::Component>>, ReplicaError> {
        let identity = read_identity(reader)?;
        let slot = self.make_slot(identity, resolver);

        let mut state = self.state.borrow_mut();
        let value = slot.resolved().cloned();
        state.slots.push(slot);
        if keep_dirty_delta {
            state.log(ListEvent::add(identity));
        }
        let index = state.visible_index(state.slots.len() - 1);
        Ok(value.map(|value| ListChange::new(ListEventType::Add, index, Some(value), None)))
    }

    fn replay_insert(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<Option<ListChange<O::Component>>, ReplicaError> {
        let index = read_index(reader)?;
        let identity = read_identity(reader)?;
        let slot_len = self.slot_len();
        let Some(slot_index) = usize::try_from(index).ok().filter(|index| *index <= slot_len) else {
            return Err(ReplicaError::protocol_violation(format!(
                "ReplicatedList: Insert at index {} into a list of {} elements",
                index, slot_len
            )));
        };
        let slot = self.make_slot(identity, resolver);

        let mut state = self.state.borrow_mut();
        let value = slot.resolved().cloned();
        state.slots.insert(slot_index, slot);
        if keep_dirty_delta {
            state.log(ListEvent::insert(index, identity));
        }
        let visible = state.visible_index(slot_index);
        Ok(value.map(|value| ListChange::new(ListEventType::Insert, visible, Some(value), None)))
    }

    fn replay_remove(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<Option<ListChange<O::Component>>, ReplicaError> {
        let identity = read_identity(reader)?;
        let removed = {
            let mut state = self.state.borrow_mut();
            let Some(slot_index) = state
                .slots
                .iter()
                .position(|slot| slot.identity() == identity)
            else {
                warn!(
                    "ReplicatedList: Remove of {} which is not in the list, ignoring",
                    identity
                );
                return Ok(None);
            };
            let visible = state.visible_index(slot_index);
            let slot = state.slots.remove(slot_index);
            if keep_dirty_delta {
                state.log(ListEvent::remove(identity));
            }
            (visible, slot)
        };
        let (visible, slot) = removed;
        Self::cancel_slot(&slot, resolver);
        Ok(slot
            .into_resolved()
            .map(|value| ListChange::new(ListEventType::Remove, visible, Some(value), None)))
    }

    fn replay_remove_at(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<Option<ListChange<O::Component>>, ReplicaError> {
        let index = read_index(reader)?;
        let slot_index = self.existing_slot(ListEventType::RemoveAt, index)?;
        let removed = {
            let mut state = self.state.borrow_mut();
            let visible = state.visible_index(slot_index);
            let slot = state.slots.remove(slot_index);
            if keep_dirty_delta {
                state.log(ListEvent::remove_at(index));
            }
            (visible, slot)
        };
        let (visible, slot) = removed;
        Self::cancel_slot(&slot, resolver);
        Ok(slot
            .into_resolved()
            .map(|value| ListChange::new(ListEventType::RemoveAt, visible, Some(value), None)))
    }

    fn replay_value(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<Option<ListChange<O::Component>>, ReplicaError> {
        let index = read_index(reader)?;
        let identity = read_identity(reader)?;
        let slot_index = self.existing_slot(ListEventType::Value, index)?;
        let slot = self.make_slot(identity, resolver);

        let replaced = {
            let mut state = self.state.borrow_mut();
            let value = slot.resolved().cloned();
            let replaced = std::mem::replace(&mut state.slots[slot_index], slot);
            if keep_dirty_delta {
                state.log(ListEvent::value(index, identity));
            }
            (state.visible_index(slot_index), value, replaced)
        };
        let (visible, value, replaced) = replaced;
        Self::cancel_slot(&replaced, resolver);

        // listeners only see resolved elements, so a placeholder on either
        // side turns the assignment into an insertion or a removal
        Ok(match (replaced.into_resolved(), value) {
            (Some(previous), Some(value)) => Some(ListChange::new(
                ListEventType::Value,
                visible,
                Some(value),
                Some(previous),
            )),
            (None, Some(value)) => Some(ListChange::new(
                ListEventType::Insert,
                visible,
                Some(value),
                None,
            )),
            (Some(previous), None) => Some(ListChange::new(
                ListEventType::RemoveAt,
                visible,
                Some(previous),
                None,
            )),
            (None, None) => None,
        })
    }

    fn replay_clear(
        &mut self,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Option<ListChange<O::Component>> {
        let previous = {
            let mut state = self.state.borrow_mut();
            if keep_dirty_delta {
                state.log(ListEvent::clear());
            }
            std::mem::take(&mut state.slots)
        };
        for slot in &previous {
            Self::cancel_slot(slot, resolver);
        }
        Some(ListChange::new(ListEventType::Clear, 0, None, None))
    }

    fn replay_full(
        &mut self,
        reader: &mut ByteReader,
        keep_dirty_delta: bool,
        resolver: &mut Resolver<O>,
    ) -> Result<Option<ListChange<O::Component>>, ReplicaError> {
        let identities = read_full_state(reader)?;
        self.replace_all(identities, resolver);
        if keep_dirty_delta {
            // the full state supersedes anything logged before it
            let mut state = self.state.borrow_mut();
            state.events.clear();
            state.full_dirty = true;
            state.mutate();
        }
        Ok(Some(ListChange::new(ListEventType::Full, 0, None, None)))
    }

    fn existing_slot(&self, kind: ListEventType, index: i32) -> Result<usize, ReplicaError> {
        let slot_len = self.slot_len();
        usize::try_from(index)
            .ok()
            .filter(|index| *index < slot_len)
            .ok_or_else(|| {
                ReplicaError::protocol_violation(format!(
                    "ReplicatedList: {:?} at index {} in a list of {} elements",
                    kind, index, slot_len
                ))
            })
    }
}

fn complete<C: NetworkComponent>(state: &Weak<RefCell<ListState<C>>>, token: u64, component: &C) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let (change, listeners) = {
        let mut state = state.borrow_mut();
        let Some(slot_index) = state.slots.iter().position(
            |slot| matches!(slot, Slot::Pending { token: pending, .. } if *pending == token),
        ) else {
            return;
        };
        state.slots[slot_index] = Slot::Resolved(component.clone());
        let change = ListChange::new(
            ListEventType::Insert,
            state.visible_index(slot_index),
            Some(component.clone()),
            None,
        );
        (change, state.listeners.snapshot())
    };
    notify(listeners, &change);
}

fn read_identity(reader: &mut ByteReader) -> Result<Identity, ReplicaError> {
    reader
        .read_value_safe::<Identity>()
        .map_err(ReplicaError::from_read)
}

fn read_index(reader: &mut ByteReader) -> Result<i32, ReplicaError> {
    reader
        .read_value_safe::<i32>()
        .map_err(ReplicaError::from_read)
}

fn read_full_state(reader: &mut ByteReader) -> Result<Vec<Identity>, ReplicaError> {
    let count = reader
        .read_value_safe::<u16>()
        .map_err(ReplicaError::from_read)?;
    let length = usize::from(count) * Identity::const_byte_length();
    if !reader.try_begin_read(length) {
        return Err(ReplicaError::protocol_violation(format!(
            "ReplicatedList: full state of {} elements needs {} bytes, {} remain",
            count,
            length,
            reader.remaining()
        )));
    }
    (0..count)
        .map(|_| Identity::de(reader).map_err(ReplicaError::from_read))
        .collect()
}
