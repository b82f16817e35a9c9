use serde::{ Serialize, Deserialize };

use crate::{
  scalar::Real,
  tensor::Tensor,
  activation::Activation,
  error::{ Error, Result },
};


/// Fully connected layer computing `activation(input * weights + bias)`.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Dense<R: Real> {
  weights: Tensor<R>,
  bias: Tensor<R>,
  activation: Activation,
}

/// Values recorded during a forward pass, needed to back-propagate through a layer.

#[derive(Debug, Clone)]
pub struct Trace<R: Real> {
  pub input: Tensor<R>,
  pub linear: Tensor<R>,
  pub output: Tensor<R>,
}

/// Gradients of the loss with respect to a layer's parameters.

#[derive(Debug, Clone)]
pub struct Gradients<R: Real> {
  pub weights: Tensor<R>,
  pub bias: Tensor<R>,
}

impl<R: Real> Dense<R> {
  /// Glorot-uniform weights, zero bias.

  pub fn new(input_size: usize, size: usize, activation: Activation) -> Self {
    Self {
      weights: Tensor::glorot_uniform(input_size, size),
      bias: Tensor::zeros(1, size),
      activation,
    }
  }

  pub fn from_parts(weights: Tensor<R>, bias: Tensor<R>, activation: Activation) -> Self {
    assert!(bias.rows() == 1 && bias.cols() == weights.cols(),
      "{:?} bias doesn't fit {:?} weights", bias.shape(), weights.shape());
    Self { weights, bias, activation }
  }

  pub fn input_size(&self) -> usize {
    self.weights.rows()
  }

  pub fn size(&self) -> usize {
    self.weights.cols()
  }

  pub fn activation(&self) -> Activation {
    self.activation
  }

  pub fn weights(&self) -> &Tensor<R> {
    &self.weights
  }

  pub fn bias(&self) -> &Tensor<R> {
    &self.bias
  }

  pub fn parameter_count(&self) -> usize {
    self.weights.size() + self.bias.size()
  }

  pub fn parameters_mut(&mut self) -> [&mut Tensor<R>; 2] {
    [&mut self.weights, &mut self.bias]
  }

  pub fn run(&self, input: &Tensor<R>) -> Tensor<R> {
    self.activation.run(&self.linear(input))
  }

  pub fn run_traced(&self, input: &Tensor<R>) -> Trace<R> {
    let linear = self.linear(input);
    let output = self.activation.run(&linear);
    Trace { input: input.clone(), linear, output }
  }

  /// Given the gradient with respect to this layer's output, compute
  /// parameter gradients and the gradient with respect to its input.

  pub fn backward(&self, trace: &Trace<R>, grad: &Tensor<R>) -> (Gradients<R>, Tensor<R>) {
    let grad = self.activation.derive(&trace.linear, &trace.output, grad);
    let gradients = Gradients {
      weights: trace.input.t_mm(&grad),
      bias: grad.sum_rows(),
    };
    (gradients, grad.mm_t(&self.weights))
  }

  /// Check parameters read from outside, which skip the constructors' assertions.

  pub fn validate(&self) -> Result<()> {
    self.weights.check()?;
    self.bias.check()?;
    if self.bias.rows() != 1 || self.bias.cols() != self.weights.cols() {
      return Err(Error::shape(format!(
        "{:?} bias doesn't fit {:?} weights", self.bias.shape(), self.weights.shape())))
    }
    Ok(())
  }

  fn linear(&self, input: &Tensor<R>) -> Tensor<R> {
    input.mm(&self.weights).add_row(&self.bias)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn forward() {
    let layer = Dense::from_parts(
      Tensor::new(2, 2, vec![1.0, -1.0, 2.0, 0.5]),
      Tensor::vec(&[0.5, 0.0]),
      Activation::Relu,
    );
    let x = Tensor::new(2, 2, vec![1.0, 1.0, 0.0, 2.0]);
    // [1, 1] -> [3.5, -0.5] -> [3.5, 0]; [0, 2] -> [4.5, 1] -> [4.5, 1]
    assert_eq!(layer.run(&x), Tensor::new(2, 2, vec![3.5, 0.0, 4.5, 1.0]));
    assert_eq!(layer.input_size(), 2);
    assert_eq!(layer.size(), 2);
    assert_eq!(layer.parameter_count(), 6);
  }

  #[test]
  fn validate_parts() {
    let layer = Dense::<f64>::new(3, 2, Activation::Tanh);
    assert!(layer.validate().is_ok());
    let skewed = Dense { bias: Tensor::zeros(1, 3), ..layer.clone() };
    assert!(matches!(skewed.validate(), Err(Error::ShapeMismatch(_))));
  }

  #[test]
  fn shapes() {
    let layer = Dense::<f32>::new(784, 10, Activation::Sigmoid);
    assert_eq!(layer.weights().shape(), (784, 10));
    assert_eq!(layer.bias(), &Tensor::zeros(1, 10));
    let trace = layer.run_traced(&Tensor::zeros(3, 784));
    assert_eq!(trace.output.shape(), (3, 10));
    let (grads, input_grad) = layer.backward(&trace, &Tensor::fill(3, 10, 1.0));
    assert_eq!(grads.weights.shape(), (784, 10));
    assert_eq!(grads.bias.shape(), (1, 10));
    assert_eq!(input_grad.shape(), (3, 784));
  }
}
