use std::cmp::Ordering;
use std::collections::BinaryHeap;
use crate::engine::vocabulary::MoveVocabulary;
use crate::error::InferenceError;

#[derive(Clone, Copy, Debug)]
struct ScoredIndex {
    score: f32,
    index: usize,
}

impl Ord for ScoredIndex {
    /// Higher score first, NaN below every number, then lower index first.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_score = match (self.score.is_nan(), other.score.is_nan()) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (true, true) => Ordering::Equal,
            (false, false) => self.score.partial_cmp(&other.score).unwrap_or(Ordering::Equal),
        };
        by_score.then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for ScoredIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoredIndex {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredIndex {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankedMove<'a> {
    pub index: usize,
    pub mv: &'a str,
    pub score: f32,
}

/// Vocabulary moves in descending score order, produced on demand.
///
/// Building the heap is linear; each `next` costs one pop, so a consumer that
/// stops after a few moves never pays for a full sort.
pub struct RankedMoves<'a> {
    heap: BinaryHeap<ScoredIndex>,
    vocabulary: &'a MoveVocabulary,
}

impl<'a> Iterator for RankedMoves<'a> {
    type Item = RankedMove<'a>;

    fn next(&mut self) -> Option<RankedMove<'a>> {
        while let Some(ScoredIndex { score, index }) = self.heap.pop() {
            if let Some(mv) = self.vocabulary.move_at(index) {
                return Some(RankedMove { index, mv, score });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.heap.len()))
    }
}

/// Ranks the vocabulary by `scores`. The score vector must have exactly one
/// entry per vocabulary index.
pub fn decode<'a>(scores: &[f32], vocabulary: &'a MoveVocabulary) -> Result<RankedMoves<'a>, InferenceError> {
    if scores.len() != vocabulary.len() {
        return Err(InferenceError::OutputSize {
            expected: vocabulary.len(),
            actual: scores.len(),
        });
    }

    let scored: Vec<ScoredIndex> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| ScoredIndex { score, index })
        .collect();

    Ok(RankedMoves {
        heap: BinaryHeap::from(scored),
        vocabulary,
    })
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use super::*;

    fn vocabulary() -> MoveVocabulary {
        MoveVocabulary::from_moves(["a2a3", "b2b3", "c2c3", "d2d4", "e2e4"]).unwrap()
    }

    fn ranked(scores: &[f32], vocabulary: &MoveVocabulary) -> Vec<String> {
        decode(scores, vocabulary).unwrap().map(|ranked| ranked.mv.to_string()).collect()
    }

    #[test]
    fn test_descending_order() {
        let vocabulary = vocabulary();
        let order = ranked(&[0.1, 0.5, -2., 3., 0.2], &vocabulary);
        assert_eq!(order, ["d2d4", "b2b3", "e2e4", "a2a3", "c2c3"]);
    }

    #[test]
    fn test_ties_break_by_index() {
        let vocabulary = vocabulary();
        let order = ranked(&[1., 2., 1., 2., 1.], &vocabulary);
        assert_eq!(order, ["b2b3", "d2d4", "a2a3", "c2c3", "e2e4"]);

        let order = ranked(&[-0., 0., 0., -0., 0.], &vocabulary);
        assert_eq!(order, ["a2a3", "b2b3", "c2c3", "d2d4", "e2e4"]);
    }

    #[test]
    fn test_nan_ranks_last() {
        let vocabulary = vocabulary();
        let order = ranked(&[f32::NAN, f32::NEG_INFINITY, f32::NAN, 0., f32::INFINITY], &vocabulary);
        assert_eq!(order, ["e2e4", "d2d4", "b2b3", "a2a3", "c2c3"]);
    }

    #[test]
    fn test_wrong_length_is_inference_error() {
        let vocabulary = vocabulary();
        assert!(matches!(
            decode(&[1., 2.], &vocabulary),
            Err(InferenceError::OutputSize { expected: 5, actual: 2 })
        ));
        assert!(matches!(decode(&[], &vocabulary), Err(InferenceError::OutputSize { .. })));
    }

    #[test]
    fn test_ranked_move_carries_index_and_score() {
        let vocabulary = vocabulary();
        let first = decode(&[0., 0., 9., 0., 0.], &vocabulary).unwrap().next().unwrap();
        assert_eq!(first, RankedMove { index: 2, mv: "c2c3", score: 9. });
        assert_eq!(vocabulary.index_of(first.mv), Some(first.index));
    }

    #[test]
    fn test_decoding_is_deterministic_and_complete() {
        let vocabulary = MoveVocabulary::exhaustive();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            // coarse scores force plenty of ties
            let scores: Vec<f32> = (0..vocabulary.len()).map(|_| rng.gen_range(0..8) as f32).collect();
            let first: Vec<RankedMove> = decode(&scores, &vocabulary).unwrap().collect();
            let second: Vec<RankedMove> = decode(&scores, &vocabulary).unwrap().collect();
            assert_eq!(first, second);
            assert_eq!(first.len(), vocabulary.len());

            for pair in first.windows(2) {
                assert!(pair[0].score > pair[1].score || (pair[0].score == pair[1].score && pair[0].index < pair[1].index));
            }
            for ranked in &first {
                assert_eq!(vocabulary.move_at(ranked.index), Some(ranked.mv));
                assert_eq!(vocabulary.index_of(ranked.mv), Some(ranked.index));
            }
        }
    }

    #[test]
    fn test_lazy_prefix() {
        let vocabulary = MoveVocabulary::exhaustive();
        let mut scores = vec![0.; vocabulary.len()];
        let best = vocabulary.index_of("e2e4").unwrap();
        scores[best] = 1.;
        let mut ranked = decode(&scores, &vocabulary).unwrap();
        assert_eq!(ranked.next().map(|r| r.mv), Some("e2e4"));
        assert_eq!(ranked.next().map(|r| r.index), Some(0));
        assert_eq!(ranked.size_hint().1, Some(vocabulary.len() - 2));
    }
}
