use naia_reference_serde::SerdeErr;
use thiserror::Error;

/// Errors that can occur while reading, writing or mutating replicated variables
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicaError {
    /// The operation is not valid in the variable's current state, for
    /// example reading a reference that is still waiting for its object
    /// to spawn. Indicates sequencing code that did not wait for resolution.
    #[error("Illegal state: {reason}")]
    IllegalState { reason: String },

    /// A peer without authority over the variable attempted to mutate it
    #[error("{property_type} variable can't {operation}; only the authority may mutate it")]
    Permission {
        property_type: &'static str,
        operation: &'static str,
    },

    /// Incoming data is malformed; the sending peer should be treated as desynchronized
    #[error("Protocol violation: {reason}")]
    ProtocolViolation { reason: String },

    /// A pre-checked write or read exceeded its reservation
    #[error("Codec overflow: {0}")]
    Overflow(SerdeErr),

    /// A bounds-checked write failed
    #[error("Codec error: {0}")]
    Codec(SerdeErr),

    /// A local mutation addressed an index past the end of a list
    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A list grew past what its u16 element count can describe on the wire
    #[error("List of {len} elements can't be written, the maximum is {max}", max = u16::MAX)]
    TooManyElements { len: usize },
}

impl ReplicaError {
    /// Classifies a codec failure raised while decoding incoming data
    pub fn from_read(error: SerdeErr) -> Self {
        match error {
            SerdeErr::Overflow { .. } => ReplicaError::Overflow(error),
            other => ReplicaError::ProtocolViolation {
                reason: other.to_string(),
            },
        }
    }

    pub fn protocol_violation(reason: impl Into<String>) -> Self {
        ReplicaError::ProtocolViolation {
            reason: reason.into(),
        }
    }
}

impl From<SerdeErr> for ReplicaError {
    fn from(error: SerdeErr) -> Self {
        match error {
            SerdeErr::Overflow { .. } => ReplicaError::Overflow(error),
            other => ReplicaError::Codec(other),
        }
    }
}
