use std::collections::BTreeSet;
use crate::engine::decode::RankedMove;
use crate::error::PredictError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveSource {
    /// `rank` is the 0-based position of the move in the ranked sequence
    Predicted { rank: usize },
    /// No ranked move was legal
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedMove {
    pub mv: String,
    pub source: MoveSource,
}

impl AsRef<str> for RankedMove<'_> {
    fn as_ref(&self) -> &str {
        self.mv
    }
}

/// Walks the ranked moves and keeps the first legal one. When none of them is
/// legal the lexicographically smallest legal move is returned, so the result
/// is reproducible. An empty legal set is an error, never a fallback.
pub fn select_move<I>(ranked: I, legal_moves: &BTreeSet<String>) -> Result<SelectedMove, PredictError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let fallback = match legal_moves.first() {
        Some(mv) => mv,
        None => return Err(PredictError::NoLegalMove("empty legal move set")),
    };

    for (rank, candidate) in ranked.into_iter().enumerate() {
        let candidate = candidate.as_ref();
        if legal_moves.contains(candidate) {
            return Ok(SelectedMove {
                mv: candidate.to_string(),
                source: MoveSource::Predicted { rank },
            });
        }
    }

    Ok(SelectedMove {
        mv: fallback.clone(),
        source: MoveSource::Fallback,
    })
}
