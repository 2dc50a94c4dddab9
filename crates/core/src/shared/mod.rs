pub mod constants;
pub mod encoded_image;
pub mod frame;
pub mod http;
