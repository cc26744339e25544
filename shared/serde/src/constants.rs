/// Default capacity of a `ByteWriter`, sized to fit a single unfragmented packet
pub const MTU_SIZE_BYTES: usize = 1200;
