use num_traits::NumCast;

use crate::scalar::Real;


/// Convert a literal into the inner float type.

#[inline]
pub fn cast<R: Real>(value: f64) -> R {
  <R as NumCast>::from(value).unwrap_or_else(R::nan)
}


/// Bound of the Glorot (Xavier) uniform distribution for a layer
/// with the given fan-in and fan-out.

pub fn glorot_limit<R: Real>(fan_in: usize, fan_out: usize) -> R {
  cast::<R>(6.0 / (fan_in + fan_out) as f64).sqrt()
}
