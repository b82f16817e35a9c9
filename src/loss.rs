use serde::{ Serialize, Deserialize };

use crate::{
  internal::*,
  scalar::Real,
  tensor::Tensor,
};


/// Clipping bound applied to predicted probabilities.
pub const EPSILON: f64 = 1e-7;


/// Loss functions comparing a batch of model outputs with one-hot targets.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
  /// Cross-entropy over class probabilities. Output rows get normalized
  /// to sum to one and clipped to `[EPSILON, 1 - EPSILON]` first, so
  /// sigmoid outputs work as well as softmax outputs.
  #[default]
  CategoricalCrossEntropy,
  MeanSquaredError,
}

impl Loss {
  /// Mean loss over all rows.

  pub fn compute<R: Real>(&self, output: &Tensor<R>, target: &Tensor<R>) -> R {
    assert_eq!(output.shape(), target.shape(),
      "Output {:?} doesn't match target {:?}", output.shape(), target.shape());
    if output.is_empty() { return R::zero() }
    match self {
      Self::CategoricalCrossEntropy => {
        let eps = cast::<R>(EPSILON);
        let total: R = output.iter_rows()
          .zip(target.iter_rows())
          .map(|(y, t)| {
            let sum = row_sum(y);
            y.iter().zip(t).map(|(&y, &t)| {
              let p = (y / sum).max(eps).min(R::one() - eps);
              -t * p.ln()
            }).sum::<R>()
          })
          .sum();
        total / cast(output.rows() as f64)
      },
      Self::MeanSquaredError => {
        output.zip(target, |y, t| (y - t) * (y - t) ).mean()
      },
    }
  }

  /// Gradient of [compute](Self::compute) with respect to the output.

  pub fn gradient<R: Real>(&self, output: &Tensor<R>, target: &Tensor<R>) -> Tensor<R> {
    assert_eq!(output.shape(), target.shape(),
      "Output {:?} doesn't match target {:?}", output.shape(), target.shape());
    match self {
      Self::CategoricalCrossEntropy => {
        let eps = cast::<R>(EPSILON);
        let batch = cast::<R>(output.rows() as f64);
        let data = output.iter_rows()
          .zip(target.iter_rows())
          .flat_map(|(y, t)| {
            let sum = row_sum(y);
            // Clipped probabilities and a clamped sum are constant in the loss
            let open = move |y: R| y / sum > eps && y / sum < R::one() - eps;
            let mass: R = if sum > eps {
              y.iter().zip(t).filter(|&(&y, _)| open(y) ).map(|(_, &t)| t ).sum()
            } else {
              R::zero()
            };
            y.iter().zip(t).map(move |(&y, &t)| {
              let own = if open(y) { t / y } else { R::zero() };
              (mass / sum - own) / batch
            })
          })
          .collect();
        Tensor::new(output.rows(), output.cols(), data)
      },
      Self::MeanSquaredError => {
        let scale = cast::<R>(2.0 / output.size().max(1) as f64);
        output.zip(target, |y, t| (y - t) * scale )
      },
    }
  }
}

fn row_sum<R: Real>(row: &[R]) -> R {
  let sum: R = row.iter().copied().sum();
  sum.max(cast(EPSILON))
}
