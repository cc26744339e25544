pub mod resolution_registry;
pub mod resolver;
