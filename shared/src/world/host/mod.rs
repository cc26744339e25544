pub mod dirty_tracker;
