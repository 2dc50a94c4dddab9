pub mod domain;
pub mod enrollment_workflow;
pub mod infrastructure;
