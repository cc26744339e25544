pub mod component;
pub mod host;
pub mod identity;
pub mod object;
pub mod remote;
pub mod replica;
pub mod replication_session;

#[cfg(test)]
pub(crate) mod fixtures;
