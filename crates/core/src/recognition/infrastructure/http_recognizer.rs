use std::time::Duration;

use crate::recognition::domain::inference_error::InferenceError;
use crate::recognition::domain::recognition_result::{RecognitionResult, RecognizeRequest};
use crate::recognition::domain::recognizer::Recognizer;
use crate::shared::constants::RECOGNIZE_PATH;
use crate::shared::encoded_image::EncodedImage;
use crate::shared::http::{build_client, endpoint_url};

/// Calls `POST /api/recognize` on the recognition service.
pub struct HttpRecognizer {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpRecognizer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InferenceError> {
        let endpoint = endpoint_url(base_url, RECOGNIZE_PATH);
        let client = build_client(timeout).map_err(|source| InferenceError::Transport {
            url: endpoint.clone(),
            source,
        })?;
        Ok(Self { client, endpoint })
    }

    fn transport(&self, source: reqwest::Error) -> InferenceError {
        InferenceError::Transport {
            url: self.endpoint.clone(),
            source,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Recognizer for HttpRecognizer {
    fn recognize(&self, image: &EncodedImage) -> Result<RecognitionResult, InferenceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RecognizeRequest {
                image: image.data_uri(),
            })
            .send()
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| self.transport(e))?;
        if !status.is_success() {
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        RecognitionResult::from_response_body(&body)
    }
}
