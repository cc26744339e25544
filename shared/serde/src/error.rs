use thiserror::Error;

/// Errors raised by the byte codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// A pre-checked write or read went past the space reserved for it.
    /// This is always a bug in the caller's reservation.
    #[error("Pre-checked access of {requested} bytes overflows reservation ({reserved} bytes remaining)")]
    Overflow { requested: usize, reserved: usize },

    /// A safe write did not fit in the writer's capacity
    #[error("Write of {requested} bytes exceeds writer capacity ({available} bytes available)")]
    CapacityExceeded { requested: usize, available: usize },

    /// A safe read ran past the end of the buffer
    #[error("Read of {requested} bytes past end of buffer ({remaining} bytes remaining)")]
    OutOfBounds { requested: usize, remaining: usize },

    /// Bytes were read successfully but do not form a valid value
    #[error("Invalid value {value} for {type_name}")]
    InvalidValue {
        type_name: &'static str,
        value: u64,
    },
}
