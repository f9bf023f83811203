use crate::{Error, Result};
use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use tracing::debug;

// Browsers emit padded base64, hand-rolled clients often do not
const FRAME_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded frame: tightly packed 8-bit pixels in B, G, R order, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BgrFrame {
    /// Wraps a raw BGR buffer. The buffer length must match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(Error::decode(format!(
                "expected {} bytes for a {}x{} BGR frame, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the `[b, g, r]` triple at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        let px = self.data.get(offset..offset + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// ITU-R BT.601 luma of the pixel at `(x, y)`.
    pub fn luma(&self, x: u32, y: u32) -> Option<u8> {
        let [b, g, r] = self.pixel(x, y)?;
        let value = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
        Some(value.round().clamp(0.0, 255.0) as u8)
    }
}

/// Decodes a base64 (optionally data-URI prefixed) image payload into a BGR frame.
pub fn decode(payload: &str) -> Result<BgrFrame> {
    let encoded = strip_data_uri(payload);
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if compact.is_empty() {
        return Err(Error::decode("frame payload is empty"));
    }

    let bytes = FRAME_ENGINE
        .decode(compact.as_bytes())
        .map_err(|e| Error::decode(format!("invalid base64: {}", e)))?;

    let image = image::load_from_memory(&bytes)
        .map_err(|e| Error::decode(format!("invalid image: {}", e)))?;

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut data = rgb.into_raw();
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }

    debug!("Decoded {}x{} frame from {} bytes", width, height, bytes.len());

    BgrFrame::from_raw(width, height, data)
}

/// Drops everything up to and including the first comma, if there is one.
fn strip_data_uri(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, encoded)) => encoded,
        None => payload,
    }
}
