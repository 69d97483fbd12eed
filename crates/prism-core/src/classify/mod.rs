//! Zero-shot classification over a prompt embedding store.
//!
//! ```text
//! image embedding → normalize → score groups (max over paraphrases) → decide
//! ```

mod decision;
mod scorer;

pub use decision::decide;
pub use scorer::{score_category, score_group};

use std::sync::Arc;

use crate::encoder::ImageEncoder;
use crate::error::{ClassifyError, ClassifyResult};
use crate::math::UnitVector;
use crate::schema::{Category, CategorySchema};
use crate::store::EmbeddingStore;
use crate::types::{ClassificationResult, ScoreVector};

/// A validated schema bound to the store that backs it.
///
/// Construction checks every prompt of every category, so classification
/// never meets a missing prompt. The classifier is read-only and can be
/// shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Classifier {
    schema: CategorySchema,
    store: Arc<EmbeddingStore>,
}

impl Classifier {
    pub fn new(schema: CategorySchema, store: Arc<EmbeddingStore>) -> ClassifyResult<Self> {
        schema.validate(&store)?;
        tracing::debug!(
            "Classifier ready: {} categories over {} prompts",
            schema.categories().len(),
            store.len()
        );
        Ok(Self { schema, store })
    }

    /// Classify an image embedding in one category.
    pub fn classify(&self, image: &[f32], category: &str) -> ClassifyResult<ClassificationResult> {
        let image = self.prepare(image)?;
        self.decide_one(&image, self.lookup(category)?)
    }

    /// Classify an image embedding in every category, in schema order.
    pub fn classify_all(&self, image: &[f32]) -> ClassifyResult<Vec<ClassificationResult>> {
        let image = self.prepare(image)?;
        self.schema
            .categories()
            .iter()
            .map(|c| self.decide_one(&image, c))
            .collect()
    }

    /// Classify in the named categories, in the order given.
    pub fn classify_many<S: AsRef<str>>(
        &self,
        image: &[f32],
        categories: &[S],
    ) -> ClassifyResult<Vec<ClassificationResult>> {
        let image = self.prepare(image)?;
        categories
            .iter()
            .map(|name| self.decide_one(&image, self.lookup(name.as_ref())?))
            .collect()
    }

    /// Classify and return the raw group scores alongside the decision.
    pub fn explain(
        &self,
        image: &[f32],
        category: &str,
    ) -> ClassifyResult<(ScoreVector, ClassificationResult)> {
        let image = self.prepare(image)?;
        let scores = score_category(&image, self.lookup(category)?, &self.store)?;
        let result = decide(&scores)?;
        Ok((scores, result))
    }

    /// Encode an image, then classify it.
    pub fn classify_image<E: ImageEncoder>(
        &self,
        encoder: &E,
        image: &E::Image,
        category: &str,
    ) -> ClassifyResult<ClassificationResult> {
        // Fail on an unknown category before paying for the encoder.
        let category = self.lookup(category)?;
        let embedding = encoder.encode_image(image)?;
        let embedding = self.prepare(&embedding)?;
        self.decide_one(&embedding, category)
    }

    pub fn schema(&self) -> &CategorySchema {
        &self.schema
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    fn lookup(&self, name: &str) -> ClassifyResult<&Category> {
        self.schema
            .category(name)
            .ok_or_else(|| ClassifyError::UnknownCategory(name.to_string()))
    }

    fn prepare(&self, image: &[f32]) -> ClassifyResult<UnitVector> {
        if let Some(expected) = self.store.dimension() {
            if image.len() != expected {
                return Err(ClassifyError::DimensionMismatch {
                    expected,
                    actual: image.len(),
                });
            }
        }
        UnitVector::normalize(image.to_vec()).ok_or(ClassifyError::DegenerateEmbedding)
    }

    fn decide_one(
        &self,
        image: &UnitVector,
        category: &Category,
    ) -> ClassifyResult<ClassificationResult> {
        decide(&score_category(image, category, &self.store)?)
    }
}
