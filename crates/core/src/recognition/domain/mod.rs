pub mod inference_error;
pub mod recognition_result;
pub mod recognizer;
