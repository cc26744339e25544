use naia_reference_serde::{ByteReader, ByteWrite, ConstByteLength, Serde, SerdeErr};

use crate::world::identity::Identity;

/// Kind of a structural change to a replicated list. The discriminant is the
/// event's wire tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ListEventType {
    Add = 0,
    Insert = 1,
    Remove = 2,
    RemoveAt = 3,
    Value = 4,
    Clear = 5,
    Full = 6,
}

impl ListEventType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ListEventType::Add),
            1 => Some(ListEventType::Insert),
            2 => Some(ListEventType::Remove),
            3 => Some(ListEventType::RemoveAt),
            4 => Some(ListEventType::Value),
            5 => Some(ListEventType::Clear),
            6 => Some(ListEventType::Full),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl Serde for ListEventType {
    fn ser(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        self.to_u8().ser(writer)
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let tag = u8::de(reader)?;
        Self::from_u8(tag).ok_or(SerdeErr::InvalidValue {
            type_name: "ListEventType",
            value: u64::from(tag),
        })
    }

    fn byte_length(&self) -> usize {
        1
    }
}

impl ConstByteLength for ListEventType {
    fn const_byte_length() -> usize {
        1
    }
}

/// One entry of a list's outgoing event log.
///
/// `index` is meaningful for `Insert`, `RemoveAt` and `Value`; `identity`
/// for `Add`, `Insert`, `Remove` and `Value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListEvent {
    pub kind: ListEventType,
    pub index: i32,
    pub identity: Option<Identity>,
}

impl ListEvent {
    pub fn add(identity: Identity) -> Self {
        Self::new(ListEventType::Add, 0, Some(identity))
    }

    pub fn insert(index: i32, identity: Identity) -> Self {
        Self::new(ListEventType::Insert, index, Some(identity))
    }

    pub fn remove(identity: Identity) -> Self {
        Self::new(ListEventType::Remove, 0, Some(identity))
    }

    pub fn remove_at(index: i32) -> Self {
        Self::new(ListEventType::RemoveAt, index, None)
    }

    pub fn value(index: i32, identity: Identity) -> Self {
        Self::new(ListEventType::Value, index, Some(identity))
    }

    pub fn clear() -> Self {
        Self::new(ListEventType::Clear, 0, None)
    }

    fn new(kind: ListEventType, index: i32, identity: Option<Identity>) -> Self {
        Self {
            kind,
            index,
            identity,
        }
    }

    /// Writes the tag and payload. `Full` carries the list's full state,
    /// which the list writes itself.
    pub(crate) fn write(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        self.kind.ser_safe(writer)?;
        match self.kind {
            ListEventType::Add | ListEventType::Remove => self.write_identity(writer),
            ListEventType::Insert | ListEventType::Value => {
                self.index.ser_safe(writer)?;
                self.write_identity(writer)
            }
            ListEventType::RemoveAt => self.index.ser_safe(writer),
            ListEventType::Clear | ListEventType::Full => Ok(()),
        }
    }

    fn write_identity(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        match &self.identity {
            Some(identity) => identity.ser_safe(writer),
            None => Err(SerdeErr::InvalidValue {
                type_name: "ListEvent identity",
                value: 0,
            }),
        }
    }
}

/// A change to the resolved elements of a list, as seen by listeners.
///
/// `index` addresses the resolved view, not the authority's sequence:
/// elements still waiting for their object are invisible to listeners and
/// appear as an `Insert` when they resolve.
#[derive(Clone, Debug, PartialEq)]
pub struct ListChange<C> {
    pub kind: ListEventType,
    pub index: usize,
    /// The element added, inserted, assigned or removed
    pub value: Option<C>,
    /// For `Value`, the element that was replaced
    pub previous: Option<C>,
}

impl<C> ListChange<C> {
    pub(crate) fn new(kind: ListEventType, index: usize, value: Option<C>, previous: Option<C>) -> Self {
        Self {
            kind,
            index,
            value,
            previous,
        }
    }
}
