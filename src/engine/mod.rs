pub mod constants;
pub mod encode;
pub mod vocabulary;
pub mod decode;
pub mod select;
pub mod scorer;
pub mod torch_scorer;
mod predictor;

pub use predictor::*;
