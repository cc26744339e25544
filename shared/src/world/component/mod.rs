pub mod error;
pub mod list_event;
pub mod listeners;
pub mod ownership;
pub mod replicated_list;
pub mod replicated_ref;
pub mod replicated_variable;
