use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use thiserror::Error;

use crate::camera::domain::camera_device::FrameSource;
use crate::shared::constants::{ENROLLMENT_JPEG_QUALITY, LIVE_JPEG_QUALITY};
use crate::shared::encoded_image::EncodedImage;
use crate::shared::frame::{Frame, Resolution};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleErrorKind {
    NotReady,
    Encoding,
}

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("frame source is not producing frames")]
    NotReady,
    #[error("frame buffer does not match {width}x{height}x{channels}")]
    InvalidFrame { width: u32, height: u32, channels: u8 },
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

impl SampleError {
    pub fn kind(&self) -> SampleErrorKind {
        match self {
            SampleError::NotReady => SampleErrorKind::NotReady,
            SampleError::InvalidFrame { .. } | SampleError::Encode(_) => SampleErrorKind::Encoding,
        }
    }
}

/// Output geometry of a sampled still.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureSize {
    /// Keep the frame's own dimensions.
    Native,
    /// Stretch to exactly these dimensions.
    Fixed(Resolution),
}

/// Grabs the current frame of a live source and JPEG-encodes it.
///
/// Never touches the device lifecycle and never retries; a source that is
/// not producing frames yields [`SampleError::NotReady`].
#[derive(Clone, Debug)]
pub struct FrameSampler {
    quality: u8,
}

impl FrameSampler {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// Sampler tuned for recognizer traffic.
    pub fn live() -> Self {
        Self::new(LIVE_JPEG_QUALITY)
    }

    /// Sampler tuned for enrollment shots.
    pub fn enrollment() -> Self {
        Self::new(ENROLLMENT_JPEG_QUALITY)
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn capture(
        &self,
        source: &dyn FrameSource,
        size: CaptureSize,
    ) -> Result<EncodedImage, SampleError> {
        if !source.is_live() {
            return Err(SampleError::NotReady);
        }
        let frame = source.current_frame().ok_or(SampleError::NotReady)?;
        self.encode(frame, size)
    }

    pub fn encode(&self, frame: Frame, size: CaptureSize) -> Result<EncodedImage, SampleError> {
        let (width, height, channels) = (frame.width(), frame.height(), frame.channels());
        if channels != 3 {
            return Err(SampleError::InvalidFrame {
                width,
                height,
                channels,
            });
        }
        let img = image::RgbImage::from_raw(width, height, frame.into_data()).ok_or(
            SampleError::InvalidFrame {
                width,
                height,
                channels,
            },
        )?;

        let img = match size {
            CaptureSize::Fixed(target) if target != Resolution::new(width, height) => {
                image::imageops::resize(&img, target.width, target.height, FilterType::Triangle)
            }
            _ => img,
        };

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode_image(&img)?;
        Ok(EncodedImage::from_jpeg(&bytes, img.width(), img.height()))
    }
}
