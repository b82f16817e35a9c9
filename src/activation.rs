use std::fmt;
use std::str::FromStr;

use serde::{ Serialize, Deserialize };

use crate::{
  internal::*,
  scalar::Real,
  tensor::Tensor,
  error::{ Error, Result },
};


/// Non-linear function applied to a layer's linear output.
///
/// Parsed from the names `linear`, `relu`, `sigmoid`, `tanh` and `softmax`.
/// All variants but [Softmax](Activation::Softmax) act element-wise;
/// softmax normalizes every row into a probability distribution.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
  Linear,
  Relu,
  Sigmoid,
  Tanh,
  Softmax,
}

impl Activation {
  pub const ALL: [Activation; 5] = [
    Activation::Linear,
    Activation::Relu,
    Activation::Sigmoid,
    Activation::Tanh,
    Activation::Softmax,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Self::Linear => "linear",
      Self::Relu => "relu",
      Self::Sigmoid => "sigmoid",
      Self::Tanh => "tanh",
      Self::Softmax => "softmax",
    }
  }

  pub fn run<R: Real>(&self, lhs: &Tensor<R>) -> Tensor<R> {
    match self {
      Self::Linear => lhs.clone(),
      Self::Relu => lhs.map(|a| a.max(R::zero()) ),
      Self::Sigmoid => lhs.map(sigmoid),
      Self::Tanh => lhs.map(|a| a.tanh() ),
      Self::Softmax => lhs.map_rows(softmax),
    }
  }

  /// Propagate `grad`, the gradient with respect to this activation's output,
  /// back to its input. `lhs` is the input and `output` the result of [run](Self::run).

  pub fn derive<R: Real>(&self, lhs: &Tensor<R>, output: &Tensor<R>, grad: &Tensor<R>) -> Tensor<R> {
    match self {
      Self::Linear => grad.clone(),
      Self::Relu => grad.zip(lhs, |g, a| if a > R::zero() { g } else { R::zero() } ),
      Self::Sigmoid => grad.zip(output, |g, s| g * s * (R::one() - s) ),
      Self::Tanh => grad.zip(output, |g, t| g * (R::one() - t * t) ),
      Self::Softmax => {
        let data = grad.iter_rows()
          .zip(output.iter_rows())
          .flat_map(|(g, s)| {
            let dot: R = g.iter().zip(s).map(|(&g, &s)| g * s ).sum();
            g.iter().zip(s).map(move |(&g, &s)| s * (g - dot) )
          })
          .collect();
        Tensor::new(grad.rows(), grad.cols(), data)
      },
    }
  }
}

fn sigmoid<R: Real>(a: R) -> R {
  R::one() / (R::one() + (-a).exp())
}

fn softmax<R: Real>(row: &[R]) -> Vec<R> {
  let max = row.iter().copied().fold(R::neg_infinity(), R::max);
  let exp: Vec<R> = row.iter().map(|&a| (a - max).exp() ).collect();
  let sum: R = exp.iter().copied().sum();
  let sum = if sum > R::zero() { sum } else { cast(1.0) };
  exp.into_iter().map(|a| a / sum ).collect()
}

impl fmt::Display for Activation {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Activation {
  type Err = Error;

  fn from_str(name: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|activation| activation.name() == name.trim().to_ascii_lowercase() )
      .ok_or_else(|| Error::UnsupportedActivation(name.to_string()) )
  }
}


/// Anything that names an [Activation], validated when a model gets built.

pub trait AsActivation {
  fn as_activation(&self) -> Result<Activation>;
}

impl AsActivation for Activation {
  fn as_activation(&self) -> Result<Activation> {
    Ok(*self)
  }
}

impl AsActivation for &str {
  fn as_activation(&self) -> Result<Activation> {
    self.parse()
  }
}

impl AsActivation for String {
  fn as_activation(&self) -> Result<Activation> {
    self.parse()
  }
}
