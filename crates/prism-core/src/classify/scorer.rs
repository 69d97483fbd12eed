//! Cosine scoring of an image embedding against category groups.
//!
//! A group's score is the best match across its paraphrased prompts.

use crate::error::{ClassifyError, ClassifyResult};
use crate::math::UnitVector;
use crate::schema::{Category, Group};
use crate::store::EmbeddingStore;
use crate::types::{GroupScore, ScoreVector};

/// Score one group: the maximum similarity across its prompts.
///
/// Ties keep the first prompt in declaration order.
pub fn score_group(
    image: &UnitVector,
    group: &Group,
    category: &str,
    store: &EmbeddingStore,
) -> ClassifyResult<GroupScore> {
    let mut best: Option<(f32, &str)> = None;

    for text in &group.prompts {
        let prompt = store
            .get(text)
            .ok_or_else(|| ClassifyError::MissingPrompt {
                category: category.to_string(),
                label: group.label.clone(),
                text: text.clone(),
            })?;
        if prompt.dim() != image.dim() {
            return Err(ClassifyError::DimensionMismatch {
                expected: prompt.dim(),
                actual: image.dim(),
            });
        }

        let similarity = image.cosine(prompt);
        if best.map_or(true, |(s, _)| similarity > s) {
            best = Some((similarity, text));
        }
    }

    // Empty groups are rejected when the schema is built; a hand-built one
    // still must not produce a score.
    let (similarity, best_prompt) = best.ok_or_else(|| ClassifyError::EmptyScoreVector {
        category: category.to_string(),
    })?;

    Ok(GroupScore {
        label: group.label.clone(),
        similarity,
        best_prompt: best_prompt.to_string(),
    })
}

/// Score every group of a category.
///
/// All prompts are resolved before any similarity is computed, so a missing
/// prompt fails the call without partial work.
pub fn score_category(
    image: &UnitVector,
    category: &Category,
    store: &EmbeddingStore,
) -> ClassifyResult<ScoreVector> {
    category.validate(store)?;

    let score_all = |groups: &[Group]| -> ClassifyResult<Vec<GroupScore>> {
        groups
            .iter()
            .map(|g| score_group(image, g, &category.name, store))
            .collect()
    };

    Ok(ScoreVector {
        category: category.name.clone(),
        primary: score_all(&category.primary)?,
        overrides: score_all(&category.overrides)?,
    })
}
