//! Core data types produced by classification.

use serde::{Deserialize, Serialize};

/// Similarity of one image to one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupScore {
    /// Group label
    pub label: String,

    /// Cosine similarity in [-1, 1]: the best match across the group's prompts
    pub similarity: f32,

    /// The prompt that produced `similarity`
    pub best_prompt: String,
}

/// Per-group similarities for one image against one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    /// Category name
    pub category: String,

    /// Primary group scores, in declaration order
    pub primary: Vec<GroupScore>,

    /// Override group scores, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<GroupScore>,
}

/// The decision for one image in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Category name
    pub category: String,

    /// Winning label
    pub label: String,

    /// Similarity of the winning group
    pub score: f32,

    /// Second-best primary label (or the beaten primary winner when an override won)
    pub runner_up_label: Option<String>,

    /// Similarity of the runner-up
    pub runner_up_score: Option<f32>,

    /// Whether an override group won
    #[serde(default)]
    pub overridden: bool,
}

impl ClassificationResult {
    /// Gap between the winner and the runner-up, if there is one.
    pub fn margin(&self) -> Option<f32> {
        self.runner_up_score.map(|r| self.score - r)
    }
}

/// All category decisions for one input embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// Input identifier (file path, record id, or line number)
    pub id: String,

    /// One result per requested category, in request order
    pub results: Vec<ClassificationResult>,

    /// Raw group scores, included when explaining
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<ScoreVector>>,
}
