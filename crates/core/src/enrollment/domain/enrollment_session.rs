use serde::Serialize;

use crate::shared::constants::ENROLLMENT_SHOT_COUNT;
use crate::shared::encoded_image::EncodedImage;

/// Profile and shots collected for one identity, in capture order.
#[derive(Clone, Debug, Default)]
pub struct EnrollmentSession {
    display_name: String,
    external_id: String,
    department: String,
    images: Vec<EncodedImage>,
}

impl EnrollmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn set_display_name(&mut self, value: impl Into<String>) {
        self.display_name = value.into();
    }

    pub fn set_external_id(&mut self, value: impl Into<String>) {
        self.external_id = value.into();
    }

    pub fn set_department(&mut self, value: impl Into<String>) {
        self.department = value.into();
    }

    pub fn images(&self) -> &[EncodedImage] {
        &self.images
    }

    pub fn shot_count(&self) -> usize {
        self.images.len()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= ENROLLMENT_SHOT_COUNT
    }

    /// Appends a shot. Returns `false`, leaving the session untouched, once
    /// all shots are taken.
    pub fn push_image(&mut self, image: EncodedImage) -> bool {
        if self.is_full() {
            return false;
        }
        self.images.push(image);
        true
    }

    pub fn clear_images(&mut self) {
        self.images.clear();
    }

    /// Names of the profile fields that are still blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.display_name),
            ("id", &self.external_id),
            ("dept", &self.department),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty() && self.images.len() == ENROLLMENT_SHOT_COUNT
    }

    pub fn to_request(&self) -> EnrollRequest<'_> {
        EnrollRequest {
            name: self.display_name.trim(),
            id: self.external_id.trim(),
            dept: self.department.trim(),
            images: self.images.iter().map(EncodedImage::data_uri).collect(),
        }
    }
}

/// Body of `POST /api/enroll`.
#[derive(Serialize, Debug, PartialEq)]
pub struct EnrollRequest<'a> {
    pub name: &'a str,
    pub id: &'a str,
    pub dept: &'a str,
    pub images: Vec<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(n: u8) -> EncodedImage {
        EncodedImage::from_jpeg(&[0xFF, 0xD8, n, 0xFF, 0xD9], 640, 480)
    }

    fn filled() -> EnrollmentSession {
        let mut session = EnrollmentSession::new();
        session.set_display_name("Alice Nguyen");
        session.set_external_id("E042");
        session.set_department("R&D");
        session
    }

    #[test]
    fn test_never_holds_more_than_five_images() {
        let mut session = filled();
        for n in 0..5 {
            assert!(session.push_image(shot(n)));
        }
        assert!(!session.push_image(shot(9)));
        assert_eq!(session.shot_count(), 5);
        assert_eq!(session.images()[4], shot(4));
    }

    #[test]
    fn test_missing_fields_treats_whitespace_as_blank() {
        let mut session = EnrollmentSession::new();
        session.set_display_name("Alice");
        session.set_department("   ");
        assert_eq!(session.missing_fields(), vec!["id", "dept"]);
    }

    #[test]
    fn test_complete_needs_exactly_five_shots() {
        let mut session = filled();
        for n in 0..4 {
            session.push_image(shot(n));
        }
        assert!(!session.is_complete());
        session.push_image(shot(4));
        assert!(session.is_complete());
        session.clear_images();
        assert!(!session.is_complete());
    }

    #[test]
    fn test_request_serializes_wire_fields_in_order() {
        let mut session = filled();
        session.set_external_id("  E042 ");
        session.push_image(shot(1));
        session.push_image(shot(2));
        let json = serde_json::to_value(session.to_request()).unwrap();
        assert_eq!(json["name"], "Alice Nguyen");
        assert_eq!(json["id"], "E042");
        assert_eq!(json["dept"], "R&D");
        assert_eq!(json["images"][0], shot(1).data_uri());
        assert_eq!(json["images"][1], shot(2).data_uri());
    }
}
