use crate::{constants::MTU_SIZE_BYTES, error::SerdeErr, serde::Serde};

/// A sink for bytes.
///
/// `write_byte` and `write_bytes` are pre-checked: the caller must first
/// reserve space with `try_begin_write`, and writing past that reservation
/// fails with `SerdeErr::Overflow`.
pub trait ByteWrite {
    /// Reserves `length` bytes from the current position. Returns false if
    /// they do not fit, in which case the previous reservation is kept.
    fn try_begin_write(&mut self, length: usize) -> bool;
    fn write_byte(&mut self, byte: u8) -> Result<(), SerdeErr>;
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SerdeErr>;
    /// Bytes that can still be reserved
    fn available(&self) -> usize;
    fn is_counter(&self) -> bool;
    fn count_bytes(&mut self, bytes: usize);
}

/// Fixed-capacity writer, by default sized to one packet
pub struct ByteWriter {
    buffer: Vec<u8>,
    capacity: usize,
    reserved_until: usize,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::with_capacity(MTU_SIZE_BYTES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            reserved_until: 0,
        }
    }

    /// Reserves then writes `value`, failing with
    /// `SerdeErr::CapacityExceeded` if it does not fit
    pub fn write_value_safe<T: Serde>(&mut self, value: &T) -> Result<(), SerdeErr> {
        value.ser_safe(self)
    }

    /// Writes `value` into space already reserved with `try_begin_write`
    pub fn write_value<T: Serde>(&mut self, value: &T) -> Result<(), SerdeErr> {
        value.ser(self)
    }

    pub fn bytes_written(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn check_reservation(&self, requested: usize) -> Result<(), SerdeErr> {
        let reserved = self.reserved_until.saturating_sub(self.buffer.len());
        if requested > reserved {
            return Err(SerdeErr::Overflow {
                requested,
                reserved,
            });
        }
        Ok(())
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWrite for ByteWriter {
    fn try_begin_write(&mut self, length: usize) -> bool {
        let end = self.buffer.len() + length;
        if end > self.capacity {
            return false;
        }
        self.reserved_until = end;
        true
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerdeErr> {
        self.check_reservation(1)?;
        self.buffer.push(byte);
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SerdeErr> {
        self.check_reservation(bytes.len())?;
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn available(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    fn is_counter(&self) -> bool {
        false
    }

    fn count_bytes(&mut self, _bytes: usize) {
        panic!("This method should not be called for ByteWriter!");
    }
}

/// Measures how many bytes a sequence of writes would take, without
/// storing anything
pub struct ByteCounter {
    count: usize,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    pub fn byte_count(&self) -> usize {
        self.count
    }
}

impl Default for ByteCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWrite for ByteCounter {
    fn try_begin_write(&mut self, _length: usize) -> bool {
        true
    }

    fn write_byte(&mut self, _byte: u8) -> Result<(), SerdeErr> {
        self.count += 1;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SerdeErr> {
        self.count += bytes.len();
        Ok(())
    }

    fn available(&self) -> usize {
        usize::MAX
    }

    fn is_counter(&self) -> bool {
        true
    }

    fn count_bytes(&mut self, bytes: usize) {
        self.count += bytes;
    }
}
