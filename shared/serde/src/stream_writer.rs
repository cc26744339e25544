use crate::{ByteWrite, SerdeErr};

/// A ByteWrite implementation that can grow beyond MTU size.
/// Unlike ByteWriter which has a fixed capacity, every reservation on a
/// StreamWriter succeeds and the buffer grows to accommodate it.
pub struct StreamWriter {
    buffer: Vec<u8>,
    reserved_until: usize,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096), // Start with 4KB, will grow as needed
            reserved_until: 0,
        }
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn bytes_written(&self) -> usize {
        self.buffer.len()
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

impl Default for StreamWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWrite for StreamWriter {
    fn try_begin_write(&mut self, length: usize) -> bool {
        let end = self.buffer.len() + length;
        self.buffer.reserve(length);
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
        usize::MAX - self.buffer.len()
    }

    fn is_counter(&self) -> bool {
        false
    }

    fn count_bytes(&mut self, _bytes: usize) {
        // StreamWriter doesn't need counting - it can grow indefinitely
    }
}
