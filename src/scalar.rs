use std::fmt::{ Debug, Display };

use rand::distributions::uniform::SampleUniform;
use num_traits::{ Float, NumAssignOps };
use serde::{ Serialize, de::DeserializeOwned };


/// All continuous numeric types that may be stored in a [Tensor](crate::Tensor)
/// and used as network parameters.
///
/// Implemented for [f32] and [f64]. Matrix multiplication is dispatched
/// through [Real::gemm], which uses the [matrixmultiply] crate when the
/// `unsafe` feature is enabled.

pub trait Real:
  Float + NumAssignOps + SampleUniform + std::iter::Sum
  + Debug + Display + Send + Sync + Serialize + DeserializeOwned + 'static
{
  /// Compute `c = a * b` for an `m x k` matrix `a` and a `k x n` matrix `b`,
  /// both given with arbitrary row and column strides. `c` is written
  /// contiguously in row-major order.

  #[allow(clippy::too_many_arguments)]
  fn gemm(
    m: usize, k: usize, n: usize,
    a: &[Self], rsa: isize, csa: isize,
    b: &[Self], rsb: isize, csb: isize,
    c: &mut [Self],
  ) {
    gemm_naive(m, k, n, a, rsa, csa, b, rsb, csb, c)
  }
}

impl Real for f32 {
  #[cfg(feature = "unsafe")]
  fn gemm(
    m: usize, k: usize, n: usize,
    a: &[Self], rsa: isize, csa: isize,
    b: &[Self], rsb: isize, csb: isize,
    c: &mut [Self],
  ) {
    check_bounds(m, k, n, a.len(), b.len(), c.len());
    unsafe {
      matrixmultiply::sgemm(
        m, k, n,
        1.0,
        a.as_ptr(), rsa, csa,
        b.as_ptr(), rsb, csb,
        0.0,
        c.as_mut_ptr(), n as isize, 1,
      );
    }
  }
}

impl Real for f64 {
  #[cfg(feature = "unsafe")]
  fn gemm(
    m: usize, k: usize, n: usize,
    a: &[Self], rsa: isize, csa: isize,
    b: &[Self], rsb: isize, csb: isize,
    c: &mut [Self],
  ) {
    check_bounds(m, k, n, a.len(), b.len(), c.len());
    unsafe {
      matrixmultiply::dgemm(
        m, k, n,
        1.0,
        a.as_ptr(), rsa, csa,
        b.as_ptr(), rsb, csb,
        0.0,
        c.as_mut_ptr(), n as isize, 1,
      );
    }
  }
}

#[cfg(feature = "unsafe")]
fn check_bounds(m: usize, k: usize, n: usize, a: usize, b: usize, c: usize) {
  assert!(a == m * k && b == k * n && c == m * n,
    "Buffer sizes {a}, {b}, {c} don't fit a {m}x{k} * {k}x{n} product");
}

#[allow(clippy::too_many_arguments)]
fn gemm_naive<R: Real>(
  m: usize, k: usize, n: usize,
  a: &[R], rsa: isize, csa: isize,
  b: &[R], rsb: isize, csb: isize,
  c: &mut [R],
) {
  let at = |i: usize, j: usize| a[(i as isize * rsa + j as isize * csa) as usize];
  let bt = |i: usize, j: usize| b[(i as isize * rsb + j as isize * csb) as usize];
  for i in 0..m {
    for j in 0..n {
      let mut acc = R::zero();
      for l in 0..k {
        acc += at(i, l) * bt(l, j);
      }
      c[i * n + j] = acc;
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn naive_matches_kernel() {
    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let mut fast = [0.0f64; 4];
    let mut slow = [0.0f64; 4];
    f64::gemm(2, 3, 2, &a, 3, 1, &b, 2, 1, &mut fast);
    gemm_naive(2, 3, 2, &a, 3, 1, &b, 2, 1, &mut slow);
    assert_eq!(fast, [22.0, 28.0, 49.0, 64.0]);
    assert_eq!(fast, slow);
  }

  #[test]
  fn strided_transpose() {
    // a is stored as 3x2 and read transposed as 2x3
    let a = [1.0f32, 4.0, 2.0, 5.0, 3.0, 6.0];
    let b = [1.0f32, 2.0, 3.0];
    let mut c = [0.0f32; 2];
    f32::gemm(2, 3, 1, &a, 1, 2, &b, 1, 1, &mut c);
    assert_eq!(c, [14.0, 32.0]);
  }
}
