use std::fs;
use std::path::Path;

use itertools::Itertools;
use serde::{ Serialize, Deserialize };

use crate::{
  scalar::Real,
  tensor::Tensor,
  layer::{ Dense, Trace, Gradients },
  activation::{ Activation, AsActivation },
  error::{ Error, Result },
};


/// Default activation of [single_layer].
pub const DEFAULT_ACTIVATION: Activation = Activation::Sigmoid;

/// Default hidden and output activations of [layered].
pub const DEFAULT_ACTIVATIONS: [Activation; 2] = [Activation::Relu, Activation::Sigmoid];

/// Default hidden layer width of [layered].
pub const DEFAULT_HIDDEN_SIZE: usize = 10;

/// Default output width of both factories.
pub const DEFAULT_OUTPUT_LENGTH: usize = 1;


/// Build a model with a single dense layer mapping `input_length` inputs
/// to `output_length` outputs through `activation`.
///
/// ```
/// use microdense::{ Model, single_layer };
///
/// let model: Model<f32> = single_layer(784, "sigmoid", 10).unwrap();
/// assert_eq!(model.layers().len(), 1);
/// assert_eq!(model.output_width(), 10);
/// ```

pub fn single_layer<R: Real>(
  input_length: usize,
  activation: impl AsActivation,
  output_length: usize,
) -> Result<Model<R>> {
  let mut model = Model::new(input_length)?;
  model.push_sized("output_length", output_length, activation)?;
  Ok(model)
}


/// Build a model with a hidden layer of `hidden_size` units using
/// `activations[0]`, followed by an output layer of `output_length`
/// units using `activations[1]`.

pub fn layered<R: Real, A: AsActivation>(
  input_length: usize,
  activations: [A; 2],
  hidden_size: usize,
  output_length: usize,
) -> Result<Model<R>> {
  let [hidden, output] = activations;
  let (hidden, output) = (hidden.as_activation()?, output.as_activation()?);
  let mut model = Model::new(input_length)?;
  model.push_sized("hidden_size", hidden_size, hidden)?;
  model.push_sized("output_length", output_length, output)?;
  Ok(model)
}


/// Feed-forward stack of [Dense] layers.
///
/// Layers chain: each layer's input size equals the previous layer's size,
/// the first layer's input size is the model's input width.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Model<R: Real> {
  input_width: usize,
  layers: Vec<Dense<R>>,
}

impl<R: Real> Model<R> {
  pub fn new(input_width: usize) -> Result<Self> {
    if input_width == 0 {
      return Err(Error::hyperparameter("input_length", input_width))
    }
    Ok(Self { input_width, layers: vec![] })
  }

  /// Append a freshly initialized layer of `size` units.

  pub fn push(&mut self, size: usize, activation: impl AsActivation) -> Result<&mut Self> {
    self.push_sized("size", size, activation)
  }

  // `name` is the caller's parameter, reported when `size` is zero
  fn push_sized(&mut self, name: &'static str, size: usize, activation: impl AsActivation) -> Result<&mut Self> {
    let activation = activation.as_activation()?;
    if size == 0 {
      return Err(Error::hyperparameter(name, size))
    }
    let input_size = self.output_width();
    self.layers.push(Dense::new(input_size, size, activation));
    Ok(self)
  }

  /// Append an existing layer, which has to accept this model's current output.

  pub fn push_layer(&mut self, layer: Dense<R>) -> Result<&mut Self> {
    if layer.input_size() != self.output_width() {
      return Err(Error::shape(format!(
        "layer expects {} inputs, model produces {}", layer.input_size(), self.output_width())))
    }
    self.layers.push(layer);
    Ok(self)
  }

  pub fn layers(&self) -> &[Dense<R>] {
    &self.layers
  }

  pub fn input_width(&self) -> usize {
    self.input_width
  }

  pub fn output_width(&self) -> usize {
    self.layers.last().map(|layer| layer.size() ).unwrap_or(self.input_width)
  }

  pub fn parameter_count(&self) -> usize {
    self.layers.iter().map(|layer| layer.parameter_count() ).sum()
  }

  /// Weights and biases of all layers, from input to output.

  pub fn parameters_mut(&mut self) -> Vec<&mut Tensor<R>> {
    self.layers.iter_mut().flat_map(|layer| layer.parameters_mut() ).collect()
  }

  /// Run the model over a batch of feature rows.

  pub fn predict(&self, input: &Tensor<R>) -> Result<Tensor<R>> {
    self.check_input(input)?;
    Ok(self.layers.iter().fold(input.clone(), |x, layer| layer.run(&x) ))
  }

  /// Run the model, recording what back-propagation needs.

  pub(crate) fn run_traced(&self, input: &Tensor<R>) -> Vec<Trace<R>> {
    let mut traces: Vec<Trace<R>> = Vec::with_capacity(self.layers.len());
    for layer in &self.layers {
      let trace = layer.run_traced(traces.last().map(|t| &t.output ).unwrap_or(input));
      traces.push(trace);
    }
    traces
  }

  /// Back-propagate the loss gradient with respect to the model output.
  /// Gradients come out in the order of [parameters_mut](Self::parameters_mut).

  pub(crate) fn backward(&self, traces: &[Trace<R>], grad: &Tensor<R>) -> Vec<Tensor<R>> {
    let mut grad = grad.clone();
    let mut gradients: Vec<Gradients<R>> = Vec::with_capacity(self.layers.len());
    for (layer, trace) in self.layers.iter().zip(traces).rev() {
      let (layer_grads, input_grad) = layer.backward(trace, &grad);
      gradients.push(layer_grads);
      grad = input_grad;
    }
    gradients
      .into_iter()
      .rev()
      .flat_map(|grads| [grads.weights, grads.bias] )
      .collect()
  }

  pub(crate) fn check_input(&self, input: &Tensor<R>) -> Result<()> {
    if input.cols() != self.input_width {
      return Err(Error::shape(format!(
        "features have {} columns, model expects {}", input.cols(), self.input_width)))
    }
    Ok(())
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let bytes = postcard::to_allocvec(self)?;
    fs::write(path, bytes)?;
    Ok(())
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let bytes = fs::read(path)?;
    let model: Self = postcard::from_bytes(&bytes)?;
    model.validate()?;
    Ok(model)
  }

  fn validate(&self) -> Result<()> {
    let mut width = self.input_width;
    for (i, layer) in self.layers.iter().enumerate() {
      layer.validate()?;
      if layer.input_size() != width {
        return Err(Error::shape(format!(
          "layer {i} expects {} inputs, previous layer produces {width}", layer.input_size())))
      }
      width = layer.size();
    }
    Ok(())
  }
}

impl<R: Real> std::fmt::Display for Model<R> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let widths = std::iter::once(self.input_width)
      .chain(self.layers.iter().map(|layer| layer.size() ))
      .join(" -> ");
    writeln!(f, "Model {widths} ({} parameters)", self.parameter_count())?;
    for (i, layer) in self.layers.iter().enumerate() {
      writeln!(f, "  {i}: Dense {} -> {} ({})", layer.input_size(), layer.size(), layer.activation())?;
    }
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::loss::Loss;

  #[test]
  fn single_layer_widths() {
    for (input, output) in [(1, 1), (784, 10), (3, 7)] {
      let model: Model<f32> = single_layer(input, Activation::Sigmoid, output).unwrap();
      assert_eq!(model.input_width(), input);
      assert_eq!(model.output_width(), output);
      assert_eq!(model.layers().len(), 1);
    }
  }

  #[test]
  fn layered_structure() {
    let model: Model<f32> = layered(784, ["tanh", "softmax"], 32, 10).unwrap();
    let layers = model.layers();
    assert_eq!(layers.len(), 2);
    assert_eq!((layers[0].input_size(), layers[0].size()), (784, 32));
    assert_eq!((layers[1].input_size(), layers[1].size()), (32, 10));
    assert_eq!(layers[0].activation(), Activation::Tanh);
    assert_eq!(layers[1].activation(), Activation::Softmax);
    assert_eq!(model.parameter_count(), 784 * 32 + 32 + 32 * 10 + 10);
  }

  #[test]
  fn defaults() {
    let model: Model<f64> = layered(4, DEFAULT_ACTIVATIONS, DEFAULT_HIDDEN_SIZE, DEFAULT_OUTPUT_LENGTH).unwrap();
    assert_eq!(model.layers()[0].activation(), Activation::Relu);
    assert_eq!(model.layers()[1].activation(), Activation::Sigmoid);
    assert_eq!(model.layers()[0].size(), 10);
    assert_eq!(model.output_width(), 1);
  }

  #[test]
  fn unsupported_activation() {
    let result: Result<Model<f32>> = layered(784, ["not_a_function", "sigmoid"], 10, 1);
    assert!(matches!(result, Err(Error::UnsupportedActivation(_))));
    let result: Result<Model<f32>> = single_layer(784, "swish", 10);
    assert!(matches!(result, Err(Error::UnsupportedActivation(_))));
  }

  #[test]
  fn invalid_sizes() {
    let result: Result<Model<f32>> = single_layer(0, DEFAULT_ACTIVATION, 10);
    assert!(matches!(result, Err(Error::InvalidHyperparameter { name: "input_length", .. })));
    let result: Result<Model<f32>> = layered(784, DEFAULT_ACTIVATIONS, 0, 10);
    assert!(matches!(result, Err(Error::InvalidHyperparameter { name: "hidden_size", .. })));
    let result: Result<Model<f32>> = layered(784, DEFAULT_ACTIVATIONS, 10, 0);
    assert!(matches!(result, Err(Error::InvalidHyperparameter { name: "output_length", .. })));
    let mut model: Model<f32> = Model::new(3).unwrap();
    assert!(matches!(model.push(0, "relu"), Err(Error::InvalidHyperparameter { name: "size", .. })));
    let result: Result<Model<f32>> = single_layer(784, DEFAULT_ACTIVATION, 0);
    assert!(matches!(result, Err(Error::InvalidHyperparameter { name: "output_length", .. })));
  }

  #[test]
  fn predict_checks_width() {
    let model: Model<f32> = single_layer(4, "sigmoid", 2).unwrap();
    assert_eq!(model.predict(&Tensor::zeros(3, 4)).unwrap().shape(), (3, 2));
    assert!(matches!(model.predict(&Tensor::zeros(3, 5)), Err(Error::ShapeMismatch(_))));
  }

  #[test]
  fn push_layer_checks_chain() {
    let mut model: Model<f64> = Model::new(3).unwrap();
    assert!(model.push_layer(Dense::new(4, 2, Activation::Linear)).is_err());
    model.push_layer(Dense::new(3, 2, Activation::Linear)).unwrap();
    model.push(5, "relu").unwrap().push(1, Activation::Sigmoid).unwrap();
    assert_eq!(model.layers().len(), 3);
    assert_eq!(model.output_width(), 1);
  }

  #[test]
  fn backward_matches_finite_differences() {
    let model: Model<f64> = layered(3, ["tanh", "sigmoid"], 4, 2).unwrap();
    let x = Tensor::new(2, 3, vec![0.5, -1.0, 0.25, 1.5, 0.3, -0.7]);
    let target = Tensor::one_hot(&[1, 0], 2).unwrap();
    let loss = Loss::CategoricalCrossEntropy;

    let traces = model.run_traced(&x);
    let output = &traces.last().unwrap().output;
    let grads = model.backward(&traces, &loss.gradient(output, &target));

    let eps = 1e-6;
    let mut probe = model.clone();
    for (p, grad) in grads.iter().enumerate() {
      for i in 0..grad.size() {
        let original = probe.parameters_mut()[p].raw()[i];
        probe.parameters_mut()[p].raw_mut()[i] = original + eps;
        let plus = loss.compute(&probe.predict(&x).unwrap(), &target);
        probe.parameters_mut()[p].raw_mut()[i] = original - eps;
        let minus = loss.compute(&probe.predict(&x).unwrap(), &target);
        probe.parameters_mut()[p].raw_mut()[i] = original;
        let numeric = (plus - minus) / (2.0 * eps);
        assert!((numeric - grad.raw()[i]).abs() < 1e-6,
          "parameter {p}[{i}]: {numeric} vs {}", grad.raw()[i]);
      }
    }
  }

  #[test]
  fn display_summary() {
    let model: Model<f32> = layered(784, DEFAULT_ACTIVATIONS, 16, 10).unwrap();
    let summary = model.to_string();
    assert!(summary.starts_with("Model 784 -> 16 -> 10 (12730 parameters)"));
    assert!(summary.contains("1: Dense 16 -> 10 (sigmoid)"));
  }

  #[test]
  fn save_and_load() {
    let model: Model<f32> = layered(6, ["relu", "softmax"], 5, 3).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    model.save(&path).unwrap();
    let loaded = Model::<f32>::load(&path).unwrap();
    assert_eq!(loaded, model);
    let x = Tensor::fill(2, 6, 0.5);
    assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
  }

  #[test]
  fn load_rejects_corrupted_tensors() {
    let model: Model<f32> = single_layer(2, "linear", 1).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    model.save(&path).unwrap();

    // Header bytes: input width, layer count, weight rows, weight cols
    let mut bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &[2, 1, 2, 1]);
    bytes[3] = 2;
    std::fs::write(&path, &bytes).unwrap();
    assert!(matches!(Model::<f32>::load(&path), Err(Error::ShapeMismatch(_))));

    bytes[3] = 1;
    bytes.truncate(bytes.len() - 2);
    std::fs::write(&path, &bytes).unwrap();
    assert!(Model::<f32>::load(&path).is_err());
  }
}
