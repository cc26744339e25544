use std::fmt;

use naia_reference_serde::{ByteReader, ByteWrite, ConstByteLength, Serde, SerdeErr};

/// Stable network identifier of a replicated object, assigned once at spawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serde for ObjectId {
    fn ser(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        self.0.ser(writer)
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(u64::de(reader)?))
    }

    fn byte_length(&self) -> usize {
        Self::const_byte_length()
    }
}

impl ConstByteLength for ObjectId {
    fn const_byte_length() -> usize {
        8
    }
}

/// Position of a component within its object's ordered component list
pub type ComponentIndex = u16;

/// Names one replicable component: its object plus its index within the object.
///
/// On the wire: `[object-id: u64][component-index: u16]`, little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    pub object_id: ObjectId,
    pub component_index: ComponentIndex,
}

impl Identity {
    pub fn new(object_id: ObjectId, component_index: ComponentIndex) -> Self {
        Self {
            object_id,
            component_index,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_id, self.component_index)
    }
}

impl Serde for Identity {
    fn ser(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        self.object_id.ser(writer)?;
        self.component_index.ser(writer)
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let object_id = ObjectId::de(reader)?;
        let component_index = ComponentIndex::de(reader)?;
        Ok(Self {
            object_id,
            component_index,
        })
    }

    fn byte_length(&self) -> usize {
        Self::const_byte_length()
    }
}

impl ConstByteLength for Identity {
    fn const_byte_length() -> usize {
        ObjectId::const_byte_length() + ComponentIndex::const_byte_length()
    }
}

/// What a registration in the `ResolutionRegistry` is waiting for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AwaitKey {
    Object(ObjectId),
    Component(Identity),
}

impl AwaitKey {
    pub fn object_id(&self) -> ObjectId {
        match self {
            AwaitKey::Object(object_id) => *object_id,
            AwaitKey::Component(identity) => identity.object_id,
        }
    }
}

impl From<Identity> for AwaitKey {
    fn from(identity: Identity) -> Self {
        AwaitKey::Component(identity)
    }
}

impl From<ObjectId> for AwaitKey {
    fn from(object_id: ObjectId) -> Self {
        AwaitKey::Object(object_id)
    }
}
