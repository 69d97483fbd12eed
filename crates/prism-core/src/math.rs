//! Vector math shared by the store and the scorer.

use serde::{Serialize, Serializer};

/// Allowed deviation of a stored vector's L2 norm from 1.0.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-4;

/// Norms at or below this are treated as zero.
const ZERO_NORM: f32 = 1e-12;

/// Euclidean (L2) norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Dot product of two equal-length vectors.
///
/// For unit vectors this is the cosine similarity.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// A vector with L2 norm 1 (within [`UNIT_NORM_TOLERANCE`]).
///
/// Both prompt embeddings and image embeddings pass through this type, so a
/// dot product between two `UnitVector`s is always a cosine similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitVector(Vec<f32>);

impl UnitVector {
    /// Normalize a raw encoder output to unit length.
    ///
    /// Returns `None` for empty, zero-norm, or non-finite input.
    pub fn normalize(mut raw: Vec<f32>) -> Option<Self> {
        if raw.is_empty() || raw.iter().any(|x| !x.is_finite()) {
            return None;
        }
        let norm = l2_norm(&raw);
        if !norm.is_finite() || norm <= ZERO_NORM {
            return None;
        }
        for x in raw.iter_mut() {
            *x /= norm;
        }
        Some(Self(raw))
    }

    /// Accept a vector that is already unit-normalized, without rescaling.
    ///
    /// Returns `None` if the vector is empty, non-finite, or its norm is off
    /// by more than [`UNIT_NORM_TOLERANCE`].
    pub fn from_normalized(raw: Vec<f32>) -> Option<Self> {
        if raw.is_empty() || raw.iter().any(|x| !x.is_finite()) {
            return None;
        }
        if (l2_norm(&raw) - 1.0).abs() > UNIT_NORM_TOLERANCE {
            return None;
        }
        Some(Self(raw))
    }

    /// Dimension of the vector.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity with another unit vector of the same dimension.
    pub fn cosine(&self, other: &UnitVector) -> f32 {
        dot(&self.0, &other.0)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl AsRef<[f32]> for UnitVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl Serialize for UnitVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let v = UnitVector::normalize(vec![3.0, 4.0]).unwrap();
        assert!((l2_norm(v.as_slice()) - 1.0).abs() < 1e-6);
        assert!((v.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((v.as_slice()[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_is_degenerate() {
        assert!(UnitVector::normalize(vec![0.0, 0.0, 0.0]).is_none());
        assert!(UnitVector::normalize(vec![]).is_none());
    }

    #[test]
    fn test_normalize_rejects_non_finite() {
        assert!(UnitVector::normalize(vec![f32::NAN, 1.0]).is_none());
        assert!(UnitVector::normalize(vec![f32::INFINITY, 1.0]).is_none());
    }

    #[test]
    fn test_from_normalized_checks_norm() {
        assert!(UnitVector::from_normalized(vec![0.6, 0.8]).is_some());
        assert!(UnitVector::from_normalized(vec![3.0, 4.0]).is_none());
        assert!(UnitVector::from_normalized(vec![0.6, 0.80005]).is_some());
    }

    #[test]
    fn test_self_similarity_is_one() {
        let v = UnitVector::normalize(vec![0.2, -0.7, 0.1, 0.4]).unwrap();
        assert!((v.cosine(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_similarity_is_zero() {
        let a = UnitVector::normalize(vec![1.0, 0.0]).unwrap();
        let b = UnitVector::normalize(vec![0.0, 2.0]).unwrap();
        assert_eq!(a.cosine(&b), 0.0);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let v = UnitVector::normalize(vec![1.0, 0.0]).unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1.0,0.0]");
    }
}
