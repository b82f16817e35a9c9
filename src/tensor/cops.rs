use crate::{
  tensor::Tensor,
  scalar::Real,
};


impl<R: Real> Tensor<R> {
  /// Matrix product `self * rhs`.

  pub fn mm(&self, rhs: &Self) -> Self {
    self.product(rhs, false, false)
  }

  /// Matrix product with the left operand transposed, `selfᵀ * rhs`.

  pub fn t_mm(&self, rhs: &Self) -> Self {
    self.product(rhs, true, false)
  }

  /// Matrix product with the right operand transposed, `self * rhsᵀ`.

  pub fn mm_t(&self, rhs: &Self) -> Self {
    self.product(rhs, false, true)
  }

  // Transposition only swaps strides, no data gets copied
  fn product(&self, rhs: &Self, transpose_l: bool, transpose_r: bool) -> Self {
    let (m, k, rsa, csa) = if transpose_l {
      (self.cols(), self.rows(), 1, self.cols() as isize)
    } else {
      (self.rows(), self.cols(), self.cols() as isize, 1)
    };
    let (k_r, n, rsb, csb) = if transpose_r {
      (rhs.cols(), rhs.rows(), 1, rhs.cols() as isize)
    } else {
      (rhs.rows(), rhs.cols(), rhs.cols() as isize, 1)
    };
    assert_eq!(k, k_r,
      "Cannot multiply [{m}, {k}] matrix with [{k_r}, {n}] matrix");

    let mut data = vec![R::zero(); m * n];
    if m * n > 0 && k > 0 {
      R::gemm(m, k, n, self.raw(), rsa, csa, rhs.raw(), rsb, csb, &mut data);
    }
    Tensor::new(m, n, data)
  }
}
