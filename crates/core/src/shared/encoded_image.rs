use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// A lossy-encoded still, carried as a `data:image/jpeg;base64,` URI.
///
/// This is the payload format both backend endpoints accept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    data_uri: String,
    width: u32,
    height: u32,
}

impl EncodedImage {
    pub fn from_jpeg(bytes: &[u8], width: u32, height: u32) -> Self {
        let mut data_uri = String::with_capacity(JPEG_DATA_URI_PREFIX.len() + bytes.len() * 4 / 3 + 4);
        data_uri.push_str(JPEG_DATA_URI_PREFIX);
        STANDARD.encode_string(bytes, &mut data_uri);
        Self {
            data_uri,
            width,
            height,
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Decodes the base64 payload back into raw JPEG bytes.
    pub fn jpeg_bytes(&self) -> Option<Vec<u8>> {
        let payload = self.data_uri.strip_prefix(JPEG_DATA_URI_PREFIX)?;
        STANDARD.decode(payload).ok()
    }

    /// Size of the URI as sent over the wire.
    pub fn encoded_len(&self) -> usize {
        self.data_uri.len()
    }
}
