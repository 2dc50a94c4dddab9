use std::time::Duration;

use serde::Deserialize;

use crate::enrollment::domain::enrollment_error::EnrollmentError;
use crate::enrollment::domain::enrollment_gateway::{EnrollmentGateway, EnrollmentReceipt};
use crate::enrollment::domain::enrollment_session::EnrollRequest;
use crate::shared::constants::ENROLL_PATH;
use crate::shared::http::{build_client, endpoint_url};

/// Calls `POST /api/enroll`.
pub struct HttpEnrollmentGateway {
    client: reqwest::blocking::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct SuccessBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpEnrollmentGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EnrollmentError> {
        let endpoint = endpoint_url(base_url, ENROLL_PATH);
        let client = build_client(timeout).map_err(|source| EnrollmentError::Unreachable {
            url: endpoint.clone(),
            source,
        })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EnrollmentGateway for HttpEnrollmentGateway {
    fn submit(&self, request: &EnrollRequest<'_>) -> Result<EnrollmentReceipt, EnrollmentError> {
        let unreachable = |source| EnrollmentError::Unreachable {
            url: self.endpoint.clone(),
            source,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(unreachable)?;
        let status = response.status();
        let body = response.text().map_err(unreachable)?;

        if status.is_success() {
            let message = serde_json::from_str::<SuccessBody>(&body)
                .ok()
                .and_then(|b| b.message);
            log::info!("Enrolled {} ({})", request.name, request.id);
            return Ok(EnrollmentReceipt { message });
        }

        let detail = rejection_detail(status.as_u16(), &body);
        log::warn!("Enrollment rejected with HTTP {}: {detail}", status.as_u16());
        Err(EnrollmentError::SubmissionRejected {
            status: status.as_u16(),
            detail,
        })
    }
}

/// `{"detail": "..."}` yields the string as-is; structured details (such as
/// validation errors) keep their JSON text; anything else falls back to the
/// raw body.
fn rejection_detail(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !body.trim().is_empty() => body.to_string(),
        Err(_) => format!("HTTP {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::domain::enrollment_error::EnrollmentErrorKind;
    use crate::testing::{serve_once, unreachable_url};
    use rstest::rstest;

    fn request() -> EnrollRequest<'static> {
        EnrollRequest {
            name: "Alice",
            id: "E042",
            dept: "R&D",
            images: vec!["data:image/jpeg;base64,AAAA"; 5],
        }
    }

    #[test]
    fn test_success_returns_backend_message() {
        let (url, server) = serve_once(200, r#"{"status":"success","message":"Enrolled Alice"}"#);
        let gateway = HttpEnrollmentGateway::new(&url, Duration::from_secs(5)).unwrap();
        let receipt = gateway.submit(&request()).unwrap();
        assert_eq!(receipt.message.as_deref(), Some("Enrolled Alice"));

        let sent: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent["name"], "Alice");
        assert_eq!(sent["id"], "E042");
        assert_eq!(sent["dept"], "R&D");
        assert_eq!(sent["images"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_rejection_carries_detail_verbatim() {
        let (url, server) = serve_once(409, r#"{"detail":"Employee ID already exists"}"#);
        let gateway = HttpEnrollmentGateway::new(&url, Duration::from_secs(5)).unwrap();
        let err = gateway.submit(&request()).unwrap_err();
        match err {
            EnrollmentError::SubmissionRejected { status, detail } => {
                assert_eq!(status, 409);
                assert_eq!(detail, "Employee ID already exists");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_backend() {
        let gateway =
            HttpEnrollmentGateway::new(&unreachable_url(), Duration::from_secs(2)).unwrap();
        let err = gateway.submit(&request()).unwrap_err();
        assert_eq!(err.kind(), EnrollmentErrorKind::Unreachable);
    }

    #[rstest]
    #[case(400, r#"{"detail":"No face found"}"#, "No face found")]
    #[case(422, r#"{"detail":[{"msg":"field required"}]}"#, r#"[{"msg":"field required"}]"#)]
    #[case(502, "Bad Gateway", "Bad Gateway")]
    #[case(500, "", "HTTP 500")]
    fn test_rejection_detail(#[case] status: u16, #[case] body: &str, #[case] expected: &str) {
        assert_eq!(rejection_detail(status, body), expected);
    }
}
