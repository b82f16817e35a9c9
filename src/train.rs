use log::{ debug, info };
use rand::seq::SliceRandom;

use crate::{
  internal::*,
  metrics,
  scalar::Real,
  tensor::Tensor,
  model::Model,
  config::TrainingConfig,
  optimize::{ Optimizer, OptimizerKind, Strategy, SGD, Momentum, Adam },
  error::{ Error, Result },
};


/// Mean training loss and accuracy after every epoch.

#[derive(Debug, Clone, PartialEq)]
pub struct History<R: Real> {
  pub loss: Vec<R>,
  pub accuracy: Vec<R>,
}

impl<R: Real> History<R> {
  pub fn new() -> Self {
    Self { loss: vec![], accuracy: vec![] }
  }

  pub fn epochs(&self) -> usize {
    self.loss.len()
  }

  pub fn last(&self) -> Option<(R, R)> {
    self.loss.last().copied().zip(self.accuracy.last().copied())
  }
}

impl<R: Real> Default for History<R> {
  fn default() -> Self {
    Self::new()
  }
}


/// Train `model` with Adam and categorical cross-entropy for `epochs` passes
/// over `features`, updating parameters after every `batch_size` examples.
///
/// Labels are class indices and get one-hot encoded against ten classes.
/// Inputs are validated before the model is touched.

pub fn fit<R: Real>(
  features: &Tensor<R>,
  labels: &[u8],
  model: &mut Model<R>,
  epochs: usize,
  batch_size: usize,
) -> Result<History<R>> {
  fit_with(features, labels, model, &TrainingConfig::new(epochs, batch_size))
}

/// Train `model` with explicit hyperparameters.

pub fn fit_with<R: Real>(
  features: &Tensor<R>,
  labels: &[u8],
  model: &mut Model<R>,
  config: &TrainingConfig,
) -> Result<History<R>> {
  config.validate()?;
  check_inputs(features, labels, model, config.num_classes)?;
  let targets = Tensor::one_hot(labels, config.num_classes)?;

  info!("Training {} parameters on {} examples: {} epochs, batch size {}, {:?} at rate {}",
    model.parameter_count(), labels.len(), config.epochs, config.batch_size, config.optimizer, config.learning_rate);

  let rate = cast::<R>(config.learning_rate);
  let history = match config.optimizer {
    OptimizerKind::Sgd => train(features, labels, &targets, model, config, Optimizer::new(rate, SGD)),
    OptimizerKind::Momentum => train(features, labels, &targets, model, config, Optimizer::new(rate, Momentum::default())),
    OptimizerKind::Adam => train(features, labels, &targets, model, config, Optimizer::new(rate, Adam::default())),
  };
  Ok(history)
}

fn train<R: Real, S: Strategy<R>>(
  features: &Tensor<R>,
  labels: &[u8],
  targets: &Tensor<R>,
  model: &mut Model<R>,
  config: &TrainingConfig,
  mut optimizer: Optimizer<R, S>,
) -> History<R> {
  let mut history = History::new();
  let mut indices: Vec<usize> = (0..labels.len()).collect();
  let mut rng = rand::thread_rng();

  for epoch in 1..=config.epochs {
    if config.shuffle {
      indices.shuffle(&mut rng);
    }
    let mut total_loss = R::zero();
    let mut hits = 0;

    for (i, batch) in indices.chunks(config.batch_size).enumerate() {
      let input = features.select(batch);
      let target = targets.select(batch);
      let traces = model.run_traced(&input);
      let output = traces.last().map(|t| &t.output ).unwrap_or(&input);

      let loss = config.loss.compute(output, &target);
      total_loss += loss * cast(batch.len() as f64);
      let batch_labels: Vec<u8> = batch.iter().map(|&j| labels[j] ).collect();
      hits += metrics::correct(&output.argmax_rows(), &batch_labels);
      debug!("Epoch {epoch} batch {i}: loss {loss}");

      let grads = model.backward(&traces, &config.loss.gradient(output, &target));
      optimizer.minimize(model.parameters_mut().into_iter().zip(grads.iter()));
    }

    let count = cast::<R>(labels.len() as f64);
    let loss = total_loss / count;
    let accuracy = cast::<R>(hits as f64) / count;
    info!("Epoch {epoch}/{}: loss {loss:.4}, accuracy {accuracy:.4}", config.epochs);
    history.loss.push(loss);
    history.accuracy.push(accuracy);
  }

  history
}

/// Validate feature rows and labels against each other and against the model.

pub(crate) fn check_inputs<R: Real>(
  features: &Tensor<R>,
  labels: &[u8],
  model: &Model<R>,
  num_classes: usize,
) -> Result<()> {
  if features.rows() != labels.len() {
    return Err(Error::shape(format!("{} feature rows for {} labels", features.rows(), labels.len())))
  }
  if labels.is_empty() {
    return Err(Error::shape("no examples"))
  }
  model.check_input(features)?;
  if model.output_width() != num_classes {
    return Err(Error::shape(format!(
      "model produces {} outputs for {num_classes} classes", model.output_width())))
  }
  if let Some(label) = labels.iter().find(|&&label| label as usize >= num_classes ) {
    return Err(Error::shape(format!("label {label} is outside [0, {}]", num_classes.saturating_sub(1))))
  }
  Ok(())
}
