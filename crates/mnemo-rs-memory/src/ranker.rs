//! Hybrid ranking: weighted blend of vector similarity and keyword rank.

use crate::model::{MemoryRecord, ScoredMemory};
use std::cmp::Ordering;

/// Default weight of the semantic signal.
pub const DEFAULT_VECTOR_WEIGHT: f32 = 0.7;
/// Default weight of the lexical signal.
pub const DEFAULT_KEYWORD_WEIGHT: f32 = 0.3;

/// Signal weights for the combined score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub vector: f32,
    pub keyword: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            vector: DEFAULT_VECTOR_WEIGHT,
            keyword: DEFAULT_KEYWORD_WEIGHT,
        }
    }
}

impl HybridWeights {
    /// Combine already-normalized signals.
    pub fn combine(&self, vector_score: f32, keyword_score: f32) -> f32 {
        self.vector * vector_score + self.keyword * keyword_score
    }
}

/// A record under consideration with its raw signals.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: MemoryRecord,
    /// Raw cosine similarity, absent when no usable vector exists.
    pub similarity: Option<f32>,
    /// Raw keyword rank (lower is better), absent when not a keyword match.
    pub keyword_rank: Option<f64>,
}

/// Cosine similarity of two vectors. `None` when the lengths differ.
///
/// Zero-magnitude inputs yield `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Some(0.0);
    }
    Some((dot / denominator) as f32)
}

/// Clamp similarity to `[0, 1]`; negative similarity is no evidence, not negative evidence.
pub fn clamp_similarity(similarity: f32) -> f32 {
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(0.0, 1.0)
}

/// Min-max normalize ranks across the batch, best (lowest) rank mapping to 1.
///
/// When all ranks tie every entry maps to 1.
pub fn normalize_keyword_ranks(ranks: &[f64]) -> Vec<f32> {
    let finite = ranks.iter().copied().filter(|rank| rank.is_finite());
    let Some(min) = finite.clone().reduce(f64::min) else {
        return vec![0.0; ranks.len()];
    };
    let max = finite.reduce(f64::max).unwrap_or(min);
    ranks
        .iter()
        .map(|rank| {
            if !rank.is_finite() {
                0.0
            } else if max == min {
                1.0
            } else {
                (1.0 - (rank - min) / (max - min)) as f32
            }
        })
        .collect()
}

/// Score and order candidates: score descending, id ascending on ties.
pub fn rank(candidates: Vec<Candidate>, weights: HybridWeights) -> Vec<ScoredMemory> {
    let present: Vec<f64> = candidates
        .iter()
        .filter_map(|candidate| candidate.keyword_rank)
        .collect();
    let mut normalized = normalize_keyword_ranks(&present).into_iter();

    let mut scored: Vec<ScoredMemory> = candidates
        .into_iter()
        .map(|candidate| {
            let vector_score = candidate.similarity.map(clamp_similarity).unwrap_or(0.0);
            let keyword_score = match candidate.keyword_rank {
                Some(_) => normalized.next().unwrap_or(0.0),
                None => 0.0,
            };
            let score = weights.combine(vector_score, keyword_score);
            ScoredMemory {
                record: candidate.record,
                score: if score.is_finite() { score } else { 0.0 },
                vector_score,
                keyword_score,
            }
        })
        .collect();

    scored.sort_by(compare_scored);
    scored
}

fn compare_scored(a: &ScoredMemory, b: &ScoredMemory) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.record.id.cmp(&b.record.id))
}

#[cfg(test)]
mod tests {
    use super::{
        Candidate, HybridWeights, clamp_similarity, cosine_similarity, normalize_keyword_ranks,
        rank,
    };
    use crate::model::{MemoryCategory, MemoryRecord};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn record(id: i64) -> MemoryRecord {
        let now = Utc::now();
        MemoryRecord {
            id,
            content: format!("memory {id}"),
            category: MemoryCategory::Fact,
            embedded: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn candidate(id: i64, similarity: Option<f32>, keyword_rank: Option<f64>) -> Candidate {
        Candidate {
            record: record(id),
            similarity,
            keyword_rank,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn cosine_uses_euclidean_norms() {
        let similarity = cosine_similarity(&[3.0, 4.0], &[6.0, 8.0]).expect("same length");
        assert!(approx(similarity, 1.0));
        let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]).expect("same length");
        assert!(approx(orthogonal, 0.0));
        let opposite = cosine_similarity(&[1.0, 1.0], &[-2.0, -2.0]).expect("same length");
        assert!(approx(opposite, -1.0));
    }

    #[test]
    fn cosine_guards_mismatch_and_zero_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), Some(0.0));
    }

    #[test]
    fn negative_similarity_clamps_to_zero() {
        assert_eq!(clamp_similarity(-0.4), 0.0);
        assert_eq!(clamp_similarity(0.25), 0.25);
        assert_eq!(clamp_similarity(f32::NAN), 0.0);
    }

    #[test]
    fn keyword_ranks_normalize_within_batch() {
        assert_eq!(normalize_keyword_ranks(&[-4.0, -2.0, 0.0]), vec![1.0, 0.5, 0.0]);
        assert_eq!(normalize_keyword_ranks(&[-1.5, -1.5]), vec![1.0, 1.0]);
        assert_eq!(normalize_keyword_ranks(&[]), Vec::<f32>::new());
    }

    #[test]
    fn combines_with_weights() {
        let ranked = rank(
            vec![
                candidate(1, Some(0.5), Some(-3.0)),
                candidate(2, Some(0.9), None),
                candidate(3, Some(-0.8), Some(-1.0)),
            ],
            HybridWeights::default(),
        );
        let ids: Vec<_> = ranked.iter().map(|hit| hit.record.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(approx(ranked[0].score, 0.7 * 0.5 + 0.3 * 1.0));
        assert!(approx(ranked[1].score, 0.7 * 0.9));
        assert!(approx(ranked[2].score, 0.0));
        assert_eq!(ranked[2].vector_score, 0.0);
    }

    #[test]
    fn ties_break_by_id() {
        let ranked = rank(
            vec![
                candidate(9, Some(0.4), None),
                candidate(2, Some(0.4), None),
                candidate(5, Some(0.4), None),
            ],
            HybridWeights::default(),
        );
        let ids: Vec<_> = ranked.iter().map(|hit| hit.record.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn custom_weights_change_ordering() {
        let keyword_heavy = HybridWeights {
            vector: 0.1,
            keyword: 0.9,
        };
        let ranked = rank(
            vec![
                candidate(1, Some(0.9), Some(-1.0)),
                candidate(2, Some(0.2), Some(-5.0)),
            ],
            keyword_heavy,
        );
        assert_eq!(ranked[0].record.id, 2);
    }
}
