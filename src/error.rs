//! Error types for the prediction pipeline.

use std::path::PathBuf;

/// Failures of the scoring backend, or a disagreement between its output
/// and the move vocabulary.
#[derive(thiserror::Error, Debug)]
pub enum InferenceError {
    /// The backend itself failed (model execution, device transfer, ...)
    #[error("Scoring backend failed: {0}")]
    Backend(String),

    /// The score vector does not line up with the vocabulary
    #[error("Score vector has {actual} entries, vocabulary has {expected}")]
    OutputSize { expected: usize, actual: usize },

    /// The backend returned a tensor of unexpected rank or batch size
    #[error("Unexpected output shape {0:?}")]
    OutputShape(Vec<i64>),
}

impl From<tch::TchError> for InferenceError {
    fn from(e: tch::TchError) -> Self {
        InferenceError::Backend(e.to_string())
    }
}

/// The three ways a single prediction request can fail.
#[derive(thiserror::Error, Debug)]
pub enum PredictError {
    /// FEN text does not parse, or describes an impossible position
    #[error("Invalid FEN: {0}")]
    InvalidPosition(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Valid position, but the game is already over
    #[error("No legal moves in this position ({0})")]
    NoLegalMove(&'static str),
}

impl PredictError {
    /// Stable machine-readable name, used in HTTP error bodies.
    pub const fn kind(&self) -> &'static str {
        match self {
            PredictError::InvalidPosition(_) => "invalid_position",
            PredictError::Inference(_) => "inference",
            PredictError::NoLegalMove(_) => "no_legal_move",
        }
    }
}

/// Problems found while loading or validating a move vocabulary.
#[derive(thiserror::Error, Debug)]
pub enum VocabularyError {
    #[error("Failed to read vocabulary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON vocabulary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed bincode vocabulary: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Malformed pickle vocabulary: {0}")]
    Pickle(#[from] serde_pickle::Error),

    #[error("Vocabulary is empty")]
    Empty,

    /// Indices must cover 0..len exactly
    #[error("Index {index} of move {mv} is out of range for a vocabulary of {len} moves")]
    IndexOutOfRange { mv: String, index: u32, len: usize },

    #[error("Index {index} is used by both {first} and {second}")]
    DuplicateIndex { index: u32, first: String, second: String },

    #[error("Move {0} appears more than once")]
    DuplicateMove(String),

    #[error("Not a UCI move: {0:?}")]
    InvalidMove(String),
}

/// Result type for vocabulary operations
pub type VocabularyResult<T> = Result<T, VocabularyError>;
