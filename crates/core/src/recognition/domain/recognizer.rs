use crate::recognition::domain::inference_error::InferenceError;
use crate::recognition::domain::recognition_result::RecognitionResult;
use crate::shared::encoded_image::EncodedImage;

/// Remote face recognizer: one encoded still in, one result out.
///
/// Shared with the scheduler's request threads, hence `Send + Sync`.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &EncodedImage) -> Result<RecognitionResult, InferenceError>;
}
