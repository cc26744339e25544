//! # Naia Reference Serde
//! Byte-aligned writers and readers with bounds-checked ("safe") and
//! reservation-checked ("pre-checked") primitives.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod constants;
mod error;
mod integer;
mod serde;
mod stream_writer;

pub use byte_reader::ByteReader;
pub use byte_writer::{ByteCounter, ByteWrite, ByteWriter};
pub use constants::MTU_SIZE_BYTES;
pub use error::SerdeErr;
pub use serde::{ConstByteLength, Serde};
pub use stream_writer::StreamWriter;
