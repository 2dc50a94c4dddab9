pub mod domain;
pub mod inference_scheduler;
pub mod infrastructure;
pub mod overlay;
pub mod scheduler_core;
