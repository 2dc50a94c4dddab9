pub mod http_enrollment_gateway;
