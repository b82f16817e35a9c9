use std::fs;
use std::path::Path;

use serde::{ Serialize, Deserialize };

use crate::{
  loss::Loss,
  optimize::OptimizerKind,
  data::NUM_CLASSES,
  error::{ Error, Result },
};


/// Default number of passes over the training set.
pub const DEFAULT_EPOCHS: usize = 2;

/// Default number of examples per parameter update.
pub const DEFAULT_BATCH_SIZE: usize = 2;

pub const DEFAULT_LEARNING_RATE: f64 = 0.001;


/// Hyperparameters of a training run.
///
/// Missing fields take their default when deserialized, so a JSON file
/// only needs to name what it changes:
///
/// ```
/// let config: microdense::TrainingConfig = serde_json::from_str(r#"{ "epochs": 5 }"#).unwrap();
/// assert_eq!(config.epochs, 5);
/// assert_eq!(config.batch_size, 2);
/// ```

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
  pub epochs: usize,
  pub batch_size: usize,
  pub learning_rate: f64,
  pub optimizer: OptimizerKind,
  pub loss: Loss,
  /// Reorder examples randomly before every epoch.
  pub shuffle: bool,
  pub num_classes: usize,
}

impl Default for TrainingConfig {
  fn default() -> Self {
    Self {
      epochs: DEFAULT_EPOCHS,
      batch_size: DEFAULT_BATCH_SIZE,
      learning_rate: DEFAULT_LEARNING_RATE,
      optimizer: OptimizerKind::Adam,
      loss: Loss::CategoricalCrossEntropy,
      shuffle: true,
      num_classes: NUM_CLASSES,
    }
  }
}

impl TrainingConfig {
  pub fn new(epochs: usize, batch_size: usize) -> Self {
    Self { epochs, batch_size, ..Self::default() }
  }

  pub fn with_epochs(mut self, epochs: usize) -> Self {
    self.epochs = epochs;
    self
  }

  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size;
    self
  }

  pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
    self.learning_rate = learning_rate;
    self
  }

  pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
    self.optimizer = optimizer;
    self
  }

  pub fn with_loss(mut self, loss: Loss) -> Self {
    self.loss = loss;
    self
  }

  pub fn with_shuffle(mut self, shuffle: bool) -> Self {
    self.shuffle = shuffle;
    self
  }

  pub fn with_num_classes(mut self, num_classes: usize) -> Self {
    self.num_classes = num_classes;
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.epochs == 0 {
      return Err(Error::hyperparameter("epochs", self.epochs))
    }
    if self.batch_size == 0 {
      return Err(Error::hyperparameter("batch_size", self.batch_size))
    }
    if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
      return Err(Error::hyperparameter("learning_rate", self.learning_rate))
    }
    if self.num_classes == 0 {
      return Err(Error::hyperparameter("num_classes", self.num_classes))
    }
    Ok(())
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(self)?)?;
    Ok(())
  }
}
