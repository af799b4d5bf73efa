pub mod ai;
pub mod encoding;
pub mod events;
pub mod google;
pub mod job;
pub mod mask;
pub mod pipeline;
pub mod qa;
pub mod rebuild;
pub mod translation_memory;
pub mod translator;
