use std::path::Path;
use std::sync::Mutex;
use lazy_static::lazy_static;
use tch::{CModule, Device, IValue, Kind, Tensor};
use crate::engine::constants::{BOARD_SIZE, NUM_POSITION_BITS};
use crate::engine::encode::BoardTensor;
use crate::engine::scorer::MoveScorer;
use crate::error::InferenceError;

lazy_static! {
    pub static ref DEVICE: Device = Device::cuda_if_available();
}

/// Lifts the planes into a `[1, 13, 8, 8]` float tensor on `device`.
pub fn board_tensor_to_tch(input: &BoardTensor, device: Device) -> Tensor {
    Tensor::from_slice(input.as_slice())
        .view([1, NUM_POSITION_BITS as i64, BOARD_SIZE as i64, BOARD_SIZE as i64])
        .to_device(device)
}

/// Takes the policy logits out of whatever the module returned. Modules with
/// a policy and a value head return a tuple; the policy comes first.
fn policy_output(output: IValue) -> Result<Tensor, InferenceError> {
    match output {
        IValue::Tensor(tensor) => Ok(tensor),
        IValue::Tuple(values) | IValue::GenericList(values) => match values.into_iter().next() {
            Some(IValue::Tensor(tensor)) => Ok(tensor),
            _ => Err(InferenceError::Backend("first module output is not a tensor".to_string())),
        },
        other => Err(InferenceError::Backend(format!("unsupported module output {:?}", other))),
    }
}

/// Flattens a `[1, N]` or `[N]` output to host floats.
pub fn scores_from_tch(output: &Tensor) -> Result<Vec<f32>, InferenceError> {
    let size = output.size();
    match size.as_slice() {
        [1, _] | [_] => {}
        _ => return Err(InferenceError::OutputShape(size)),
    }
    let flat = output.flatten(0, -1).to_kind(Kind::Float).to_device(Device::Cpu);
    Ok(Vec::<f32>::try_from(&flat)?)
}

/// A TorchScript policy network.
pub struct TorchScorer {
    module: Mutex<CModule>,
    device: Device,
}

impl TorchScorer {
    pub fn load(path: impl AsRef<Path>) -> Result<TorchScorer, InferenceError> {
        TorchScorer::load_on_device(path, *DEVICE)
    }

    pub fn load_on_device(path: impl AsRef<Path>, device: Device) -> Result<TorchScorer, InferenceError> {
        let mut module = CModule::load_on_device(path.as_ref(), device)?;
        module.set_eval();
        Ok(TorchScorer {
            module: Mutex::new(module),
            device,
        })
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

impl MoveScorer for TorchScorer {
    fn score(&self, input: &BoardTensor) -> Result<Vec<f32>, InferenceError> {
        let input = board_tensor_to_tch(input, self.device);
        let output = {
            let module = self.module
                .lock()
                .map_err(|_| InferenceError::Backend("model lock poisoned".to_string()))?;
            tch::no_grad(|| module.forward_is(&[IValue::Tensor(input)]))?
        };
        scores_from_tch(&policy_output(output)?)
    }

    fn describe(&self) -> String {
        format!("TorchScript module on {:?}", self.device)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::encode::position_to_tensor;
    use crate::position::Position;
    use super::*;

    #[test]
    fn test_board_tensor_to_tch() {
        let planes = position_to_tensor(&Position::initial());
        let tensor = board_tensor_to_tch(&planes, Device::Cpu);

        // check tensor shape
        assert_eq!(tensor.size(), vec![1, 13, 8, 8]);
        assert_eq!(tensor.kind(), Kind::Float);

        // channel 0: white pawns on the second rank
        assert_eq!(tensor.get(0).get(0).sum(Kind::Float).double_value(&[]), 8.);
        assert_eq!(tensor.get(0).get(0).get(1).sum(Kind::Float).double_value(&[]), 8.);

        // channel 5: white king on e1
        assert_eq!(tensor.double_value(&[0, 5, 0, 4]), 1.);

        // channel 11: black king on e8
        assert_eq!(tensor.double_value(&[0, 11, 7, 4]), 1.);

        // channel 12: legal destinations
        assert_eq!(tensor.get(0).get(12).sum(Kind::Float).double_value(&[]), 16.);

        assert_eq!(tensor.sum(Kind::Float).double_value(&[]), 48.);
    }

    #[test]
    fn test_scores_from_tch() {
        let output = Tensor::from_slice(&[0.5f32, -1., 2.]).view([1, 3]);
        assert_eq!(scores_from_tch(&output).unwrap(), vec![0.5, -1., 2.]);

        let output = Tensor::from_slice(&[1f64, 2.]);
        assert_eq!(scores_from_tch(&output).unwrap(), vec![1., 2.]);

        let output = Tensor::zeros([2, 3], (Kind::Float, Device::Cpu));
        assert!(matches!(scores_from_tch(&output), Err(InferenceError::OutputShape(_))));
    }

    #[test]
    fn test_policy_output_takes_first_head() {
        let policy = Tensor::from_slice(&[1f32, 2.]);
        let value = Tensor::from_slice(&[0f32]);
        let output = IValue::Tuple(vec![IValue::Tensor(policy), IValue::Tensor(value)]);
        let scores = scores_from_tch(&policy_output(output).unwrap()).unwrap();
        assert_eq!(scores, vec![1., 2.]);

        assert!(policy_output(IValue::Int(3)).is_err());
    }

    #[test]
    fn test_missing_model_file() {
        let result = TorchScorer::load_on_device("does/not/exist.pt", Device::Cpu);
        assert!(matches!(result, Err(InferenceError::Backend(_))));
    }
}
