use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr};

/// A type that can be written to and read from a byte stream.
///
/// `ser` and `de` are pre-checked: they assume the caller has reserved
/// `byte_length()` bytes. `ser_safe` performs the reservation first.
pub trait Serde: Sized + Clone {
    fn ser(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr>;

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;

    fn byte_length(&self) -> usize;

    fn ser_safe(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        let length = self.byte_length();
        if !writer.try_begin_write(length) {
            return Err(SerdeErr::CapacityExceeded {
                requested: length,
                available: writer.available(),
            });
        }
        self.ser(writer)
    }
}

/// Implemented by types whose encoding always has the same length
pub trait ConstByteLength {
    fn const_byte_length() -> usize;
}
