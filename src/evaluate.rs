use log::info;

use crate::{
  internal::*,
  metrics,
  scalar::Real,
  tensor::Tensor,
  model::Model,
  loss::Loss,
  data::NUM_CLASSES,
  train::check_inputs,
  error::Result,
};


/// Number of rows run through the model at once.
pub const EVAL_BATCH_SIZE: usize = 32;


/// Mean loss and classification accuracy over a held-out set.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation<R: Real> {
  pub loss: R,
  pub accuracy: R,
}

impl<R: Real> From<Evaluation<R>> for (R, R) {
  fn from(evaluation: Evaluation<R>) -> Self {
    (evaluation.loss, evaluation.accuracy)
  }
}


/// Evaluate `model` on `features` against ten-class `labels`, reporting
/// categorical cross-entropy and accuracy. The model is left untouched.

pub fn evaluate<R: Real>(features: &Tensor<R>, labels: &[u8], model: &Model<R>) -> Result<Evaluation<R>> {
  evaluate_with(features, labels, model, Loss::CategoricalCrossEntropy, NUM_CLASSES)
}

pub fn evaluate_with<R: Real>(
  features: &Tensor<R>,
  labels: &[u8],
  model: &Model<R>,
  loss: Loss,
  num_classes: usize,
) -> Result<Evaluation<R>> {
  check_inputs(features, labels, model, num_classes)?;
  let targets = Tensor::one_hot(labels, num_classes)?;

  let mut total_loss = R::zero();
  let mut predicted = Vec::with_capacity(labels.len());
  for start in (0..labels.len()).step_by(EVAL_BATCH_SIZE) {
    let end = (start + EVAL_BATCH_SIZE).min(labels.len());
    let output = model.predict(&features.range(start..end))?;
    total_loss += loss.compute(&output, &targets.range(start..end)) * cast((end - start) as f64);
    predicted.extend(output.argmax_rows());
  }

  let evaluation = Evaluation {
    loss: total_loss / cast(labels.len() as f64),
    accuracy: metrics::accuracy(&predicted, labels),
  };
  info!("Evaluated {} examples: loss {:.4}, accuracy {:.4}", labels.len(), evaluation.loss, evaluation.accuracy);
  Ok(evaluation)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ Activation, Dense, error::Error };

  // Output layer that copies its inputs through a steep sigmoid
  fn identity_model() -> Model<f64> {
    let mut weights = Tensor::zeros(10, 10);
    for i in 0..10 {
      weights.raw_mut()[i * 10 + i] = 20.0;
    }
    let mut model = Model::new(10).unwrap();
    model.push_layer(Dense::from_parts(weights, Tensor::fill(1, 10, -10.0), Activation::Sigmoid)).unwrap();
    model
  }

  #[test]
  fn accuracy_of_fixed_model() {
    let model = identity_model();
    let labels: Vec<u8> = (0..40).map(|i| (i % 10) as u8 ).collect();
    let mut features = Tensor::<f64>::one_hot(&labels, 10).unwrap();
    // Corrupt the last ten rows so they point at the next class
    for i in 30..40 {
      let row = &mut features.raw_mut()[i * 10 .. (i + 1) * 10];
      row.rotate_right(1);
    }
    let before = model.clone();
    let evaluation = evaluate(&features, &labels, &model).unwrap();
    assert_eq!(evaluation.accuracy, 0.75);
    assert!(evaluation.loss > 0.0);
    assert_eq!(model, before);
  }

  #[test]
  fn batching_doesnt_change_loss() {
    let model = identity_model();
    let labels: Vec<u8> = (0..70).map(|i| (i * 3 % 10) as u8 ).collect();
    let features = Tensor::<f64>::one_hot(&labels, 10).unwrap().map(|a| a * 0.3 + 0.1 );
    let batched = evaluate(&features, &labels, &model).unwrap();
    let output = model.predict(&features).unwrap();
    let whole = Loss::CategoricalCrossEntropy.compute(&output, &Tensor::one_hot(&labels, 10).unwrap());
    assert!((batched.loss - whole).abs() < 1e-12);
  }

  #[test]
  fn shape_mismatch() {
    let model = identity_model();
    let result = evaluate(&Tensor::zeros(5, 10), &[1, 2, 3], &model);
    assert!(matches!(result, Err(Error::ShapeMismatch(_))));
    let result = evaluate(&Tensor::zeros(0, 10), &[], &model);
    assert!(matches!(result, Err(Error::ShapeMismatch(_))));
  }
}
