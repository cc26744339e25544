use crate::{error::SerdeErr, serde::Serde, ConstByteLength};

/// Cursor over an incoming byte buffer.
///
/// `read_byte` and `read_bytes` are pre-checked against the reservation made
/// by `try_begin_read`; `read_value_safe` checks the buffer bounds itself.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    position: usize,
    reserved_until: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            reserved_until: 0,
        }
    }

    /// Reserves `length` bytes for pre-checked reads. Returns false if the
    /// buffer does not hold that many more bytes.
    pub fn try_begin_read(&mut self, length: usize) -> bool {
        let end = self.position + length;
        if end > self.buffer.len() {
            return false;
        }
        self.reserved_until = end;
        true
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'b [u8], SerdeErr> {
        let reserved = self.reserved_until.saturating_sub(self.position);
        if length > reserved {
            return Err(SerdeErr::Overflow {
                requested: length,
                reserved,
            });
        }
        let start = self.position;
        self.position += length;
        Ok(&self.buffer[start..self.position])
    }

    /// Bounds-checked read of a fixed-size value
    pub fn read_value_safe<T: Serde + ConstByteLength>(&mut self) -> Result<T, SerdeErr> {
        let length = T::const_byte_length();
        if !self.try_begin_read(length) {
            return Err(SerdeErr::OutOfBounds {
                requested: length,
                remaining: self.remaining(),
            });
        }
        T::de(self)
    }

    /// Reads a value from space already reserved with `try_begin_read`
    pub fn read_value<T: Serde>(&mut self) -> Result<T, SerdeErr> {
        T::de(self)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}
