use std::fmt;

use unicode_normalization::UnicodeNormalization;

use crate::recognition::domain::recognition_result::{
    BoundingBox, RecognitionResult, SubjectKind,
};
use crate::shared::constants::SCANNING_LABEL;

/// Which way the recognizer's coordinates face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceOrientation {
    /// Boxes are measured on the raw camera image.
    #[default]
    Unmirrored,
    /// Boxes are measured on an already flipped image.
    Mirrored,
}

/// Rectangle in percent of the displayed video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeTone {
    Recognized,
    Unknown,
    /// Liveness alert.
    Spoof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelBadge {
    pub label: String,
    pub tone: BadgeTone,
    pub match_text: String,
    pub attendance_status: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub rect: DisplayRect,
    pub badge: LabelBadge,
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tone = match self.badge.tone {
            BadgeTone::Recognized => "recognized",
            BadgeTone::Unknown => "unknown",
            BadgeTone::Spoof => "ALERT",
        };
        write!(
            f,
            "[{tone}] {} {} @ left {:.1}% top {:.1}% size {:.1}x{:.1}%",
            self.badge.label,
            self.badge.match_text,
            self.rect.left,
            self.rect.top,
            self.rect.width,
            self.rect.height
        )?;
        if let Some(status) = &self.badge.attendance_status {
            write!(f, " ({status})")?;
        }
        Ok(())
    }
}

/// Maps recognizer boxes onto the (usually mirrored) preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecognitionOverlayMapper {
    display_mirrored: bool,
    source: SourceOrientation,
}

impl Default for RecognitionOverlayMapper {
    fn default() -> Self {
        Self::new(true, SourceOrientation::Unmirrored)
    }
}

impl RecognitionOverlayMapper {
    pub fn new(display_mirrored: bool, source: SourceOrientation) -> Self {
        Self {
            display_mirrored,
            source,
        }
    }

    /// No result, or a result without a box, yields no overlay.
    pub fn map(&self, result: Option<&RecognitionResult>) -> Option<Overlay> {
        let result = result?;
        let bbox = result.bounding_box?;
        Some(Overlay {
            rect: self.map_box(&bbox),
            badge: badge_for(result),
        })
    }

    pub fn map_box(&self, bbox: &BoundingBox) -> DisplayRect {
        let flip = self.display_mirrored != (self.source == SourceOrientation::Mirrored);
        let left = if flip { 100.0 - bbox.x - bbox.w } else { bbox.x };
        DisplayRect {
            left,
            top: bbox.y,
            width: bbox.w,
            height: bbox.h,
        }
    }
}

fn badge_for(result: &RecognitionResult) -> LabelBadge {
    let tone = match result.subject_kind() {
        SubjectKind::Identified => BadgeTone::Recognized,
        SubjectKind::Unknown => BadgeTone::Unknown,
        SubjectKind::Spoof => BadgeTone::Spoof,
    };
    LabelBadge {
        label: display_name(&result.subject_label),
        tone,
        match_text: format!("MATCH: {}%", (result.confidence * 100.0).round() as u32),
        attendance_status: result.attendance_status.clone(),
    }
}

/// Uppercase ASCII-friendly badge text: accents stripped, `đ` folded to `d`.
fn display_name(label: &str) -> String {
    if label.trim().is_empty() {
        return SCANNING_LABEL.to_string();
    }
    label
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect::<String>()
        .to_uppercase()
}
