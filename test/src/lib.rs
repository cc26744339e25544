pub mod helpers;

pub use helpers::*;
pub use test_world::{TestComponent, TestObject, TestWorld};
