use std::ops::Range;

use rand::Rng;
use serde::{ Serialize, Deserialize };

#[cfg(feature = "rayon")]
use rayon::prelude::*;

mod cops;

use crate::{
  internal::*,
  scalar::Real,
  error::{ Error, Result },
};


/// Row-major matrix of [Real] values.
///
/// Every batch of examples, every weight matrix and every bias vector is a
/// Tensor. Rows index examples (or input units for weights), columns index
/// features (or output units). Bias vectors are single-row tensors and get
/// broadcast over all rows with [add_row](Tensor::add_row).

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Tensor<R: Real> {
  rows: usize,
  cols: usize,
  data: Vec<R>,
}

impl<R: Real> Tensor<R> {
  pub fn new(rows: usize, cols: usize, data: Vec<R>) -> Self {
    assert_eq!(rows * cols, data.len(),
      "[{rows}, {cols}] doesn't match data length {}", data.len());
    Self { rows, cols, data }
  }

  /// Single-row tensor.

  pub fn vec(vec: &[R]) -> Self {
    Self::new(1, vec.len(), vec.to_vec())
  }

  /// Stack equally long rows into a tensor.

  pub fn from_rows<V: AsRef<[R]>>(rows: &[V]) -> Result<Self> {
    let cols = rows.first().map(|row| row.as_ref().len() ).unwrap_or(0);
    let mut data = Vec::with_capacity(rows.len() * cols);
    for (i, row) in rows.iter().enumerate() {
      let row = row.as_ref();
      if row.len() != cols {
        return Err(Error::shape(format!("row {i} has {} values, expected {cols}", row.len())))
      }
      data.extend_from_slice(row);
    }
    Ok(Self::new(rows.len(), cols, data))
  }

  pub fn fill(rows: usize, cols: usize, filler: R) -> Self {
    Self::new(rows, cols, vec![filler; rows * cols])
  }

  pub fn zeros(rows: usize, cols: usize) -> Self {
    Self::fill(rows, cols, R::zero())
  }

  pub fn zeros_like(other: &Self) -> Self {
    Self::zeros(other.rows, other.cols)
  }

  /// Uniform samples from `[-limit, limit)`, with the limit
  /// chosen from the tensor's fan-in (rows) and fan-out (cols).

  pub fn glorot_uniform(rows: usize, cols: usize) -> Self {
    let limit = glorot_limit::<R>(rows, cols);
    let mut rng = rand::thread_rng();
    let data = (0..rows * cols).map(|_| rng.gen_range(-limit, limit) ).collect();
    Self::new(rows, cols, data)
  }

  /// Encode integer class labels as one row per label, with a single
  /// one at the label's index.

  pub fn one_hot(labels: &[u8], classes: usize) -> Result<Self> {
    let mut data = vec![R::zero(); labels.len() * classes];
    for (i, &label) in labels.iter().enumerate() {
      let label = label as usize;
      if label >= classes {
        return Err(Error::shape(format!("label {label} at index {i} is outside [0, {}]", classes.saturating_sub(1))))
      }
      data[i * classes + label] = R::one();
    }
    Ok(Self::new(labels.len(), classes, data))
  }

  /// Verify that the stored data fills the declared shape,
  /// for tensors that didn't come through a constructor.

  pub fn check(&self) -> Result<()> {
    if self.rows * self.cols != self.data.len() {
      return Err(Error::shape(format!(
        "[{}, {}] tensor holds {} values", self.rows, self.cols, self.data.len())))
    }
    Ok(())
  }

  pub fn shape(&self) -> (usize, usize) {
    (self.rows, self.cols)
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn size(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn raw(&self) -> &[R] {
    &self.data
  }

  pub fn raw_mut(&mut self) -> &mut [R] {
    &mut self.data
  }

  pub fn row(&self, index: usize) -> &[R] {
    &self.data[index * self.cols .. (index + 1) * self.cols]
  }

  pub fn iter_rows(&self) -> impl Iterator<Item = &[R]> + '_ {
    (0..self.rows).map(move |i| self.row(i) )
  }

  /// Gather the given rows into a new tensor, in order.

  pub fn select(&self, indices: &[usize]) -> Self {
    let mut data = Vec::with_capacity(indices.len() * self.cols);
    for &i in indices {
      data.extend_from_slice(self.row(i));
    }
    Self::new(indices.len(), self.cols, data)
  }

  /// Contiguous range of rows.

  pub fn range(&self, rows: Range<usize>) -> Self {
    let data = self.data[rows.start * self.cols .. rows.end * self.cols].to_vec();
    Self::new(rows.len(), self.cols, data)
  }

  pub fn map<F>(&self, cb: F) -> Self
  where
    F: Fn(R) -> R + Send + Sync,
  {
    #[cfg(feature = "rayon")]
    let data = self.data.par_iter().map(|&a| cb(a) ).collect();
    #[cfg(not(feature = "rayon"))]
    let data = self.data.iter().map(|&a| cb(a) ).collect();
    Self::new(self.rows, self.cols, data)
  }

  pub fn zip<F>(&self, rhs: &Self, cb: F) -> Self
  where
    F: Fn(R, R) -> R,
  {
    assert_eq!(self.shape(), rhs.shape(),
      "Cannot zip {:?} tensor with {:?} tensor", self.shape(), rhs.shape());
    let data = self.data.iter()
      .zip(rhs.data.iter())
      .map(|(&a, &b)| cb(a, b) )
      .collect();
    Self::new(self.rows, self.cols, data)
  }

  /// Apply a function to every row, producing rows of equal width.

  pub fn map_rows<F>(&self, cb: F) -> Self
  where
    F: Fn(&[R]) -> Vec<R>,
  {
    let data: Vec<R> = self.iter_rows().flat_map(cb).collect();
    Self::new(self.rows, self.cols, data)
  }

  /// Broadcast a single-row tensor over all rows and add it.

  pub fn add_row(&self, row: &Self) -> Self {
    assert!(row.rows == 1 && row.cols == self.cols,
      "Cannot broadcast {:?} row over {:?} tensor", row.shape(), self.shape());
    let mut out = self.clone();
    for chunk in out.data.chunks_mut(self.cols.max(1)) {
      for (a, &b) in chunk.iter_mut().zip(row.data.iter()) {
        *a += b;
      }
    }
    out
  }

  /// Sum over rows, producing a single row.

  pub fn sum_rows(&self) -> Self {
    let mut sums = vec![R::zero(); self.cols];
    for row in self.iter_rows() {
      for (sum, &a) in sums.iter_mut().zip(row) {
        *sum += a;
      }
    }
    Self::new(1, self.cols, sums)
  }

  pub fn sum(&self) -> R {
    self.data.iter().copied().sum()
  }

  pub fn mean(&self) -> R {
    self.sum() / cast(self.size() as f64)
  }

  pub fn scale(&self, factor: R) -> Self {
    self.map(|a| a * factor )
  }

  /// Index of the greatest value in every row. Ties resolve to the lowest index.

  pub fn argmax_rows(&self) -> Vec<usize> {
    self.iter_rows()
      .map(|row| {
        let mut index = 0;
        for (i, &value) in row.iter().enumerate() {
          if value > row[index] {
            index = i;
          }
        }
        index
      })
      .collect()
  }
}

impl<R: Real> std::ops::AddAssign<&Tensor<R>> for Tensor<R> {
  fn add_assign(&mut self, rhs: &Tensor<R>) {
    assert_eq!(self.shape(), rhs.shape(),
      "Cannot add {:?} tensor to {:?} tensor", rhs.shape(), self.shape());
    for (a, &b) in self.data.iter_mut().zip(rhs.data.iter()) {
      *a += b;
    }
  }
}

impl<R: Real> std::fmt::Display for Tensor<R> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor[{}, {}] ", self.rows, self.cols)?;
    if self.rows == 1 {
      return writeln!(f, "{:?}", self.data)
    }
    writeln!(f, "[")?;
    for row in self.iter_rows() {
      writeln!(f, "  {:?}", row)?;
    }
    writeln!(f, "]")
  }
}
