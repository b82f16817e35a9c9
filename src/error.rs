use thiserror::Error;


/// Errors raised while building, training or evaluating models.

#[derive(Error, Debug)]
pub enum Error {
  /// An activation function name that doesn't map to any [Activation](crate::Activation).
  #[error("unsupported activation function `{0}`")]
  UnsupportedActivation(String),

  /// Feature rows, labels and model dimensions don't line up.
  #[error("shape mismatch: {0}")]
  ShapeMismatch(String),

  /// A size, epoch count, batch size or rate that must be positive wasn't.
  #[error("invalid hyperparameter `{name}`: {value}")]
  InvalidHyperparameter { name: &'static str, value: String },

  /// Malformed dataset file.
  #[error("invalid dataset file {path}: {reason}")]
  Format { path: String, reason: String },

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("model encoding error: {0}")]
  Postcard(#[from] postcard::Error),

  #[error("config encoding error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn shape(message: impl Into<String>) -> Self {
    Self::ShapeMismatch(message.into())
  }

  pub(crate) fn hyperparameter(name: &'static str, value: impl ToString) -> Self {
    Self::InvalidHyperparameter { name, value: value.to_string() }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
