pub mod entry;
pub mod job;
pub mod settings;
