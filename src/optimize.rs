use std::collections::HashMap;

use serde::{ Serialize, Deserialize };

use crate::{
  internal::*,
  scalar::Real,
  tensor::Tensor,
};


/// An optimization strategy to be used with [Optimizer].
///
/// Strategies may keep per-parameter state, keyed by the parameter's
/// position in the list handed to [Optimizer::minimize].

pub trait Strategy<R: Real> {
  fn update(&mut self, id: usize, grad: &Tensor<R>, rate: R, step: usize) -> Tensor<R>;
}


/// Generic optimizer that allows for several optimization [strategies](Strategy) to be used.

#[derive(Debug)]
pub struct Optimizer<R: Real, S: Strategy<R>> {
  strategy: S,
  pub learning_rate: R,
  step: usize,
}

impl<R: Real, S: Strategy<R>> Optimizer<R, S> {
  pub fn new(learning_rate: R, strategy: S) -> Self {
    Self { strategy, learning_rate, step: 1 }
  }

  pub fn step(&self) -> usize {
    self.step
  }

  /// Apply one update to every parameter, given its gradient.

  pub fn minimize<'a, I>(&mut self, params: I)
  where
    I: IntoIterator<Item = (&'a mut Tensor<R>, &'a Tensor<R>)>,
  {
    for (id, (param, grad)) in params.into_iter().enumerate() {
      let change = self.strategy.update(id, grad, self.learning_rate, self.step);
      *param += &change;
    }
    self.step += 1;
  }
}


/// Named optimization strategies, selectable from a configuration.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
  Sgd,
  Momentum,
  #[default]
  Adam,
}


/// Stochastic Gradient Descent strategy

#[derive(Debug, Clone, Default)]
pub struct SGD;

impl<R: Real> Strategy<R> for SGD {
  fn update(&mut self, _id: usize, grad: &Tensor<R>, rate: R, _step: usize) -> Tensor<R> {
    grad.scale(-rate)
  }
}


/// Stochastic Gradient Descent with momentum

#[derive(Debug, Clone)]
pub struct Momentum<R: Real> {
  pub momentum: R,
  v: HashMap<usize, Tensor<R>>,
}

impl<R: Real> Momentum<R> {
  pub fn new(momentum: R) -> Self {
    Self {
      momentum,
      v: HashMap::new(),
    }
  }
}

impl<R: Real> Default for Momentum<R> {
  fn default() -> Self {
    Self::new(cast(0.9))
  }
}

impl<R: Real> Strategy<R> for Momentum<R> {
  fn update(&mut self, id: usize, grad: &Tensor<R>, rate: R, _step: usize) -> Tensor<R> {
    let momentum = self.momentum;
    let v = self.v.entry(id).or_insert_with(|| Tensor::zeros_like(grad) );
    *v = v.zip(grad, |v, g| v * momentum - g * rate );
    v.clone()
  }
}


/// Adaptive Moment Estimation strategy (ADAM)

#[derive(Debug, Clone)]
pub struct Adam<R: Real> {
  pub beta1: R,
  pub beta2: R,
  pub epsilon: R,
  m: HashMap<usize, Tensor<R>>,
  v: HashMap<usize, Tensor<R>>,
}

impl<R: Real> Adam<R> {
  pub fn new(beta1: R, beta2: R, epsilon: R) -> Self {
    Self {
      beta1,
      beta2,
      epsilon,
      m: HashMap::new(),
      v: HashMap::new(),
    }
  }
}

impl<R: Real> Default for Adam<R> {
  fn default() -> Self {
    Self::new(cast(0.9), cast(0.999), cast(1e-7))
  }
}

impl<R: Real> Strategy<R> for Adam<R> {
  fn update(&mut self, id: usize, grad: &Tensor<R>, rate: R, step: usize) -> Tensor<R> {
    let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
    let m = self.m.entry(id).or_insert_with(|| Tensor::zeros_like(grad) );
    *m = m.zip(grad, |m, g| m * beta1 + g * (R::one() - beta1) );
    let v = self.v.entry(id).or_insert_with(|| Tensor::zeros_like(grad) );
    *v = v.zip(grad, |v, g| v * beta2 + g * g * (R::one() - beta2) );
    let step = cast::<R>(step as f64);
    let correction1 = R::one() - beta1.powf(step);
    let correction2 = R::one() - beta2.powf(step);
    m.zip(v, |m, v| {
      let mt = m / correction1;
      let vt = v / correction2;
      -rate * mt / (vt.sqrt() + epsilon)
    })
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  // Minimize (x - 3)² for a single parameter
  fn descend<S: Strategy<f64>>(strategy: S, rate: f64, steps: usize) -> f64 {
    let mut optimizer = Optimizer::new(rate, strategy);
    let mut x = Tensor::vec(&[0.0]);
    for _ in 0..steps {
      let grad = x.map(|x| 2.0 * (x - 3.0) );
      optimizer.minimize([(&mut x, &grad)]);
    }
    assert_eq!(optimizer.step(), steps + 1);
    x.raw()[0]
  }

  #[test]
  fn sgd() {
    assert!((descend(SGD, 0.1, 200) - 3.0).abs() < 1e-6);
  }

  #[test]
  fn momentum() {
    assert!((descend(Momentum::default(), 0.01, 500) - 3.0).abs() < 1e-3);
  }

  #[test]
  fn adam() {
    assert!((descend(Adam::default(), 0.1, 1000) - 3.0).abs() < 5e-2);
  }

  #[test]
  fn adam_first_step_is_rate_sized() {
    let mut adam = Adam::<f64>::default();
    let change = adam.update(0, &Tensor::vec(&[4.0, -0.5]), 0.001, 1);
    assert!((change.raw()[0] + 0.001).abs() < 1e-9);
    assert!((change.raw()[1] - 0.001).abs() < 1e-9);
  }
}
