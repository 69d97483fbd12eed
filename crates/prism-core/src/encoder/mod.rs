//! The encoder boundary.
//!
//! Prism never runs a vision or text network itself. Text embeddings come from
//! a [`TextEncoder`] when the store is built or updated; image embeddings come
//! from an [`ImageEncoder`] (or precomputed files) at classification time.
//! Both outputs are normalized by Prism before use, whatever the encoder
//! promises.

mod command;
mod preprocess;

pub use command::CommandEncoder;
pub use preprocess::ImageNormalization;

use crate::error::EncoderError;

/// Turns prompt text into an embedding vector.
pub trait TextEncoder {
    /// Encode a single prompt.
    fn encode_text(&self, text: &str) -> Result<Vec<f32>, EncoderError>;

    /// Encode a batch of prompts, one vector per input in order.
    ///
    /// The default calls [`encode_text`](Self::encode_text) once per prompt.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        texts.iter().map(|t| self.encode_text(t)).collect()
    }
}

/// Turns an image into an embedding vector in the same space as the prompts.
pub trait ImageEncoder {
    /// Whatever pixel representation the encoder consumes.
    type Image: ?Sized;

    fn encode_image(&self, image: &Self::Image) -> Result<Vec<f32>, EncoderError>;
}

impl<T: TextEncoder + ?Sized> TextEncoder for &T {
    fn encode_text(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        (**self).encode_text(text)
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        (**self).encode_batch(texts)
    }
}
