use crate::engine::encode::BoardTensor;
use crate::error::InferenceError;

/// The network, seen from the pipeline: one input tensor in, one score per
/// vocabulary index out.
pub trait MoveScorer: Send + Sync {
    fn score(&self, input: &BoardTensor) -> Result<Vec<f32>, InferenceError>;

    /// Short human-readable description, reported by `GET /health`.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

impl<S: MoveScorer + ?Sized> MoveScorer for Box<S> {
    fn score(&self, input: &BoardTensor) -> Result<Vec<f32>, InferenceError> {
        (**self).score(input)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
