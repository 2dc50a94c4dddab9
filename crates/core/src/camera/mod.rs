pub mod device_session;
pub mod domain;
pub mod infrastructure;
