// SPDX-License-Identifier: MIT OR Apache-2.0

//! Elementary vector operations over embedding vectors.

use crate::errors::RankError;

/// Computes cosine similarity between two equal-length vectors.
///
/// Returns `0.0` if either vector has zero norm. Mismatched lengths are an
/// error rather than a silent misscore.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, RankError> {
    if a.len() != b.len() {
        return Err(RankError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.3, -0.2, 0.9, 0.1];
        let score = cosine_similarity(&v, &v).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let v = vec![1.0, 2.0, -3.0];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        let score = cosine_similarity(&v, &neg).unwrap();
        assert!((score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);
    }

    #[test]
    fn zero_norm_returns_zero() {
        let zero = vec![0.0, 0.0, 0.0];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&v, &zero).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths_fail() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(
            cosine_similarity(&a, &b),
            Err(RankError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
    }
}
