pub mod enrollment_error;
pub mod enrollment_gateway;
pub mod enrollment_session;
pub mod enrollment_state;
