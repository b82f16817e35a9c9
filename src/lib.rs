//! Small dense neural networks for MNIST digit classification.
//! CPU only. Few dependencies.
//!
//! # Features
//!
//! - **Model factories** — [single_layer] and [layered] build the two classic
//! MNIST baselines from a handful of declarative parameters. Activations can be
//! given as [Activation] values or by name and get validated at construction time.
//!
//! - **Explicit ownership** — There is no global session. A [Model] is a plain value,
//! mutated through `&mut` by [fit] and read through `&` by [evaluate].
//!
//! - **Arbitrary inner types** — Models and tensors are generic over [scalar::Real],
//! implemented for `f32` and `f64`.
//!
//! - **Optimization** — Includes standard optimizers such as ADAM and SGD with momentum.
//!
//! - **Persistence** — Models save to compact binary files, training configurations to JSON.
//!
//! # Examples
//!
//! The full pipeline, with the MNIST IDX files in `$MNIST_DIR` (or `data/mnist`):
//! ```no_run
//! use microdense::{ data, single_layer, fit, evaluate, Model };
//!
//! fn main() -> microdense::Result<()> {
//!   let ((x_train, y_train), (x_test, y_test)) = data::load::<f32>()?.into_parts();
//!
//!   let mut model: Model<f32> = single_layer(784, "sigmoid", 10)?;
//!   fit(&x_train, &y_train, &mut model, 1, 32)?;
//!
//!   let (loss, accuracy) = evaluate(&x_test, &y_test, &model)?.into();
//!   println!("loss {loss:.4}, accuracy {accuracy:.4}");
//!   Ok(())
//! }
//! ```
//!
//! Training on in-memory data with custom hyperparameters:
//! ```
//! use microdense::{ layered, fit_with, evaluate, Tensor, TrainingConfig, OptimizerKind };
//!
//! let features = Tensor::from_rows(&[[0.0, 1.0], [1.0, 0.0]]).unwrap();
//! let labels = [4, 2];
//!
//! let mut model = layered(2, ["relu", "softmax"], 16, 10).unwrap();
//! let config = TrainingConfig::new(5, 2)
//!   .with_optimizer(OptimizerKind::Adam)
//!   .with_learning_rate(0.01);
//!
//! let history = fit_with(&features, &labels, &mut model, &config).unwrap();
//! assert_eq!(history.epochs(), 5);
//!
//! let evaluation = evaluate::<f64>(&features, &labels, &model).unwrap();
//! assert!(evaluation.loss >= 0.0);
//! ```
//!
//! # Optional features
//!
//! Some features can be toggled in your `Cargo.toml`.
//!
//! - `unsafe` *(default)* — Accelerated matrix math using [matrixmultiply] crate.
//! - `rayon` — Element-wise operations run in parallel.

mod internal;
mod tensor;
mod layer;
mod model;
mod train;
mod evaluate;

pub mod scalar;
pub mod activation;
pub mod loss;
pub mod optimize;
pub mod metrics;
pub mod data;
pub mod config;
pub mod error;

pub use tensor::Tensor;
pub use layer::{ Dense, Trace, Gradients };
pub use activation::{ Activation, AsActivation };
pub use model::{
  Model, single_layer, layered,
  DEFAULT_ACTIVATION, DEFAULT_ACTIVATIONS, DEFAULT_HIDDEN_SIZE, DEFAULT_OUTPUT_LENGTH,
};
pub use loss::Loss;
pub use optimize::{ Optimizer, OptimizerKind };
pub use config::TrainingConfig;
pub use train::{ fit, fit_with, History };
pub use evaluate::{ evaluate, evaluate_with, Evaluation };
pub use error::{ Error, Result };
