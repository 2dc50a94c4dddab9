use serde::{Deserialize, Serialize};

use crate::recognition::domain::inference_error::InferenceError;
use crate::shared::constants::{SPOOF_SUBJECT, UNKNOWN_SUBJECT};

/// Face box in percent of the source frame, origin top-left of the
/// un-mirrored image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    fn is_usable(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite())
            && self.w > 0.0
            && self.h > 0.0
    }
}

/// Who the recognizer thinks is in front of the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectKind {
    Identified,
    Unknown,
    /// Liveness check failed (photo or screen replay).
    Spoof,
}

/// Outcome of one inference round trip. Superseded by the next one.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionResult {
    pub subject_label: String,
    pub confidence: f64,
    pub bounding_box: Option<BoundingBox>,
    pub attendance_status: Option<String>,
}

impl RecognitionResult {
    pub fn subject_kind(&self) -> SubjectKind {
        match self.subject_label.as_str() {
            UNKNOWN_SUBJECT => SubjectKind::Unknown,
            SPOOF_SUBJECT => SubjectKind::Spoof,
            _ => SubjectKind::Identified,
        }
    }

    pub fn is_identified(&self) -> bool {
        self.subject_kind() == SubjectKind::Identified
    }

    /// Parses a `/api/recognize` response body.
    ///
    /// A missing or malformed `bbox` is not an error: the result simply has
    /// no box. An empty `attendance_status` counts as absent.
    pub fn from_response_body(body: &str) -> Result<Self, InferenceError> {
        let wire: RecognizeResponse = serde_json::from_str(body)?;
        let bounding_box = wire
            .bbox
            .and_then(|value| serde_json::from_value::<BoundingBox>(value).ok())
            .filter(BoundingBox::is_usable);
        let confidence = if wire.conf.is_finite() {
            wire.conf.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Ok(Self {
            subject_label: wire.name,
            confidence,
            bounding_box,
            attendance_status: wire
                .attendance_status
                .filter(|status| !status.trim().is_empty()),
        })
    }
}

#[derive(Serialize)]
pub(crate) struct RecognizeRequest<'a> {
    pub image: &'a str,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    name: String,
    #[serde(default)]
    conf: f64,
    #[serde(default)]
    bbox: Option<serde_json::Value>,
    #[serde(default)]
    attendance_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_parses_full_response() {
        let body = r#"{"name":"Alice","conf":0.93,"bbox":{"x":10,"y":20,"w":30,"h":15},"attendance_status":"CHECKED IN"}"#;
        let result = RecognitionResult::from_response_body(body).unwrap();
        assert_eq!(result.subject_label, "Alice");
        assert_relative_eq!(result.confidence, 0.93);
        assert_eq!(
            result.bounding_box,
            Some(BoundingBox {
                x: 10.0,
                y: 20.0,
                w: 30.0,
                h: 15.0
            })
        );
        assert_eq!(result.attendance_status.as_deref(), Some("CHECKED IN"));
        assert!(result.is_identified());
    }

    #[test]
    fn test_no_face_response_has_no_box() {
        let body = r#"{"name":"Unknown","conf":0,"bbox":null,"attendance_status":""}"#;
        let result = RecognitionResult::from_response_body(body).unwrap();
        assert_eq!(result.subject_kind(), SubjectKind::Unknown);
        assert!(result.bounding_box.is_none());
        assert!(result.attendance_status.is_none());
    }

    #[rstest]
    #[case::missing_field(r#"{"name":"Bob","conf":0.8,"bbox":{"x":1,"y":2,"w":3}}"#)]
    #[case::wrong_type(r#"{"name":"Bob","conf":0.8,"bbox":"10,20,30,15"}"#)]
    #[case::zero_width(r#"{"name":"Bob","conf":0.8,"bbox":{"x":1,"y":2,"w":0,"h":4}}"#)]
    #[case::absent(r#"{"name":"Bob","conf":0.8}"#)]
    fn test_malformed_bbox_is_dropped(#[case] body: &str) {
        let result = RecognitionResult::from_response_body(body).unwrap();
        assert_eq!(result.subject_label, "Bob");
        assert!(result.bounding_box.is_none());
    }

    #[rstest]
    #[case::not_json("<html>502</html>")]
    #[case::missing_name(r#"{"conf":0.5}"#)]
    #[case::name_not_string(r#"{"name":42}"#)]
    fn test_malformed_payload_is_error(#[case] body: &str) {
        let err = RecognitionResult::from_response_body(body).unwrap_err();
        assert!(matches!(err, InferenceError::Malformed(_)));
    }

    #[rstest]
    #[case(1.7, 1.0)]
    #[case(-0.2, 0.0)]
    #[case(0.5, 0.5)]
    fn test_confidence_is_clamped(#[case] conf: f64, #[case] expected: f64) {
        let body = format!(r#"{{"name":"Alice","conf":{conf}}}"#);
        let result = RecognitionResult::from_response_body(&body).unwrap();
        assert_relative_eq!(result.confidence, expected);
    }

    #[test]
    fn test_spoof_subject() {
        let body = r#"{"name":"FAKE FACE","conf":0,"bbox":{"x":1,"y":1,"w":5,"h":5},"attendance_status":"SPOOF WARNING"}"#;
        let result = RecognitionResult::from_response_body(body).unwrap();
        assert_eq!(result.subject_kind(), SubjectKind::Spoof);
        assert!(!result.is_identified());
    }

    #[test]
    fn test_request_serializes_image_field() {
        let json = serde_json::to_string(&RecognizeRequest {
            image: "data:image/jpeg;base64,AAAA",
        })
        .unwrap();
        assert_eq!(json, r#"{"image":"data:image/jpeg;base64,AAAA"}"#);
    }
}
