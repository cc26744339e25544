use crate::{
    byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde,
    ConstByteLength,
};

// All multi-byte integers travel little-endian
macro_rules! impl_serde_for_integer {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
                    writer.write_bytes(&self.to_le_bytes())
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    const LEN: usize = std::mem::size_of::<$ty>();
                    let mut bytes = [0u8; LEN];
                    bytes.copy_from_slice(reader.read_bytes(LEN)?);
                    Ok(<$ty>::from_le_bytes(bytes))
                }

                fn byte_length(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }
            }

            impl ConstByteLength for $ty {
                fn const_byte_length() -> usize {
                    std::mem::size_of::<$ty>()
                }
            }
        )*
    };
}

impl_serde_for_integer!(u8, u16, u32, u64, i32);

impl Serde for bool {
    fn ser(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        writer.write_byte(u8::from(*self))
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SerdeErr::InvalidValue {
                type_name: "bool",
                value: u64::from(other),
            }),
        }
    }

    fn byte_length(&self) -> usize {
        1
    }
}

impl ConstByteLength for bool {
    fn const_byte_length() -> usize {
        1
    }
}
