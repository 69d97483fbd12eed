//! Turning a score vector into one label.
//!
//! The highest primary group is the candidate. An override group replaces it
//! only when it scores strictly higher; among overrides the first declared
//! maximum is taken. An override that merely ties the best primary loses.

use crate::error::{ClassifyError, ClassifyResult};
use crate::types::{ClassificationResult, GroupScore, ScoreVector};

/// Decide the label for one category.
pub fn decide(scores: &ScoreVector) -> ClassifyResult<ClassificationResult> {
    let (best_idx, best) =
        argmax(&scores.primary).ok_or_else(|| ClassifyError::EmptyScoreVector {
            category: scores.category.clone(),
        })?;

    if let Some((_, over)) = argmax(&scores.overrides) {
        if over.similarity > best.similarity {
            return Ok(ClassificationResult {
                category: scores.category.clone(),
                label: over.label.clone(),
                score: over.similarity,
                runner_up_label: Some(best.label.clone()),
                runner_up_score: Some(best.similarity),
                overridden: true,
            });
        }
    }

    let runner_up = scores
        .primary
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != best_idx)
        .map(|(_, g)| g)
        .fold(None::<&GroupScore>, |acc, g| match acc {
            Some(a) if a.similarity >= g.similarity => Some(a),
            _ => Some(g),
        });

    Ok(ClassificationResult {
        category: scores.category.clone(),
        label: best.label.clone(),
        score: best.similarity,
        runner_up_label: runner_up.map(|g| g.label.clone()),
        runner_up_score: runner_up.map(|g| g.similarity),
        overridden: false,
    })
}

/// First index holding the maximum similarity.
fn argmax(scores: &[GroupScore]) -> Option<(usize, &GroupScore)> {
    scores
        .iter()
        .enumerate()
        .fold(None, |acc: Option<(usize, &GroupScore)>, (i, g)| match acc {
            Some((_, a)) if a.similarity >= g.similarity => acc,
            _ => Some((i, g)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(label: &str, similarity: f32) -> GroupScore {
        GroupScore {
            label: label.to_string(),
            similarity,
            best_prompt: format!("a photo of {label}"),
        }
    }

    fn scores(primary: &[(&str, f32)], overrides: &[(&str, f32)]) -> ScoreVector {
        ScoreVector {
            category: "clothing-season".to_string(),
            primary: primary.iter().map(|(l, s)| group(l, *s)).collect(),
            overrides: overrides.iter().map(|(l, s)| group(l, *s)).collect(),
        }
    }

    #[test]
    fn test_primary_argmax() {
        let result = decide(&scores(
            &[("winter", 0.21), ("autumn", 0.27), ("summer", 0.24)],
            &[],
        ))
        .unwrap();
        assert_eq!(result.label, "autumn");
        assert_eq!(result.runner_up_label.as_deref(), Some("summer"));
        assert!(!result.overridden);
    }

    #[test]
    fn test_override_wins_when_strictly_higher() {
        let result = decide(&scores(
            &[("winter", 0.90), ("summer", 0.20)],
            &[("no person", 0.91)],
        ))
        .unwrap();
        assert_eq!(result.label, "no person");
        assert!(result.overridden);
        assert_eq!(result.runner_up_label.as_deref(), Some("winter"));
        assert_eq!(result.runner_up_score, Some(0.90));
    }

    #[test]
    fn test_override_tie_goes_to_primary() {
        let result = decide(&scores(
            &[("winter", 0.30), ("summer", 0.20)],
            &[("no person", 0.30)],
        ))
        .unwrap();
        assert_eq!(result.label, "winter");
        assert!(!result.overridden);
    }

    #[test]
    fn test_first_declared_override_wins_tie_between_overrides() {
        let result = decide(&scores(
            &[("winter", 0.10)],
            &[("no person", 0.40), ("uniform", 0.40)],
        ))
        .unwrap();
        assert_eq!(result.label, "no person");
    }

    #[test]
    fn test_primary_tie_picks_first_declared() {
        let result = decide(&scores(
            &[("winter", 0.5), ("autumn", 0.5), ("summer", 0.1)],
            &[],
        ))
        .unwrap();
        assert_eq!(result.label, "winter");
        assert_eq!(result.runner_up_label.as_deref(), Some("autumn"));
        assert_eq!(result.margin(), Some(0.0));
    }

    #[test]
    fn test_single_primary_has_no_runner_up() {
        let result = decide(&scores(&[("sharp", 0.3)], &[])).unwrap();
        assert_eq!(result.label, "sharp");
        assert!(result.runner_up_label.is_none());
        assert!(result.runner_up_score.is_none());
    }

    #[test]
    fn test_negative_scores() {
        let result = decide(&scores(&[("a", -0.4), ("b", -0.2)], &[("c", -0.3)])).unwrap();
        assert_eq!(result.label, "b");
        assert_eq!(result.runner_up_label.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_primary_is_an_error() {
        let err = decide(&scores(&[], &[("no person", 0.9)])).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::EmptyScoreVector { category } if category == "clothing-season"
        ));
    }
}
