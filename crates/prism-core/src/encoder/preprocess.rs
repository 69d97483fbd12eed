//! Image normalization contract for CLIP ViT-B/32 image encoders.
//!
//! Decoding and resizing happen outside Prism. Whatever produces image
//! embeddings must feed the network:
//! - Input size: 224×224 pixels, bilinear resize
//! - Channel order: RGB
//! - Normalization: `(pixel / 255 - mean[c]) / std[c]` with the CLIP constants
//! - Tensor layout: NCHW [batch, channels, height, width]

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP per-channel normalization mean.
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP per-channel normalization std.
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// CLIP input edge length in pixels.
pub const CLIP_IMAGE_SIZE: u32 = 224;

/// Pixel normalization an image encoder expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageNormalization {
    pub size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for ImageNormalization {
    fn default() -> Self {
        Self::clip()
    }
}

impl ImageNormalization {
    /// The OpenAI CLIP contract.
    pub fn clip() -> Self {
        Self {
            size: CLIP_IMAGE_SIZE,
            mean: CLIP_MEAN,
            std: CLIP_STD,
        }
    }

    /// Normalize one 8-bit value; `channel` is always below [`CHANNELS`].
    fn normalize(&self, channel: usize, value: u8) -> f32 {
        (value as f32 / 255.0 - self.mean[channel]) / self.std[channel]
    }

    /// Lay out an already-resized RGB8 buffer as a normalized NCHW tensor.
    ///
    /// Returns `None` if `rgb` is not exactly `size × size × 3` bytes.
    pub fn to_tensor(&self, rgb: &[u8]) -> Option<Vec<f32>> {
        let size = self.size as usize;
        let plane = size * size;
        if rgb.len() != plane * CHANNELS {
            return None;
        }

        let mut tensor = vec![0.0f32; plane * CHANNELS];
        for (i, pixel) in rgb.chunks_exact(CHANNELS).enumerate() {
            for (c, &val) in pixel.iter().enumerate() {
                // NCHW: offset = c * size * size + y * size + x, and i = y * size + x
                tensor[c * plane + i] = self.normalize(c, val);
            }
        }
        Some(tensor)
    }
}
