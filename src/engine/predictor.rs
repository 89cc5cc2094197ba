use chess::BoardStatus;
use tracing::{debug, warn};
use crate::engine::decode::decode;
use crate::engine::encode::position_to_tensor;
use crate::engine::scorer::MoveScorer;
use crate::engine::select::{select_move, MoveSource, SelectedMove};
use crate::engine::vocabulary::MoveVocabulary;
use crate::error::{InferenceError, PredictError};
use crate::position::Position;

/// Everything a request needs, built once at startup and read-only afterwards.
pub struct Predictor {
    vocabulary: MoveVocabulary,
    scorer: Box<dyn MoveScorer>,
}

impl Predictor {
    /// Pairs a vocabulary with a scorer and probes the scorer once, so a
    /// network whose output does not match the vocabulary is caught before
    /// any request is served.
    pub fn new<S: MoveScorer + 'static>(vocabulary: MoveVocabulary, scorer: S) -> Result<Predictor, InferenceError> {
        let predictor = Predictor {
            vocabulary,
            scorer: Box::new(scorer),
        };
        predictor.check_output_size()?;
        Ok(predictor)
    }

    pub fn check_output_size(&self) -> Result<(), InferenceError> {
        let probe = position_to_tensor(&Position::initial());
        let scores = self.scorer.score(&probe)?;
        if scores.len() != self.vocabulary.len() {
            return Err(InferenceError::OutputSize {
                expected: self.vocabulary.len(),
                actual: scores.len(),
            });
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> &MoveVocabulary {
        &self.vocabulary
    }

    pub fn scorer(&self) -> &dyn MoveScorer {
        self.scorer.as_ref()
    }

    pub fn predict(&self, fen: &str) -> Result<SelectedMove, PredictError> {
        let position = Position::from_fen(fen)?;
        self.predict_position(&position)
    }

    pub fn predict_position(&self, position: &Position) -> Result<SelectedMove, PredictError> {
        // Game over: nothing to encode, nothing to ask the network
        match position.status() {
            BoardStatus::Checkmate => return Err(PredictError::NoLegalMove("checkmate")),
            BoardStatus::Stalemate => return Err(PredictError::NoLegalMove("stalemate")),
            BoardStatus::Ongoing => {}
        }

        let input = position_to_tensor(position);
        let scores = self.scorer.score(&input)?;
        let ranked = decode(&scores, &self.vocabulary)?;
        let selected = select_move(ranked, &position.legal_move_set())?;

        match selected.source {
            MoveSource::Predicted { rank } => {
                debug!(fen = %position.fen(), mv = %selected.mv, rank, "predicted move");
            }
            MoveSource::Fallback => {
                warn!(fen = %position.fen(), mv = %selected.mv, "no ranked move was legal, falling back");
            }
        }
        Ok(selected)
    }
}
