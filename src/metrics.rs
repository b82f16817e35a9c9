use crate::{
  internal::*,
  scalar::Real,
};


/// Fraction of predictions equal to their label.
/// Empty inputs have an accuracy of zero.

pub fn accuracy<R: Real>(predicted: &[usize], labels: &[u8]) -> R {
  assert_eq!(predicted.len(), labels.len(),
    "{} predictions for {} labels", predicted.len(), labels.len());
  if labels.is_empty() { return R::zero() }
  cast::<R>(correct(predicted, labels) as f64) / cast(labels.len() as f64)
}

/// Number of predictions equal to their label.

pub fn correct(predicted: &[usize], labels: &[u8]) -> usize {
  predicted.iter()
    .zip(labels)
    .filter(|&(&pred, &label)| pred == label as usize )
    .count()
}

/// Confusion matrix indexed by `[true label][predicted class]`.

pub fn confusion(predicted: &[usize], labels: &[u8], classes: usize) -> Vec<Vec<usize>> {
  let mut matrix = vec![vec![0; classes]; classes];
  for (&pred, &label) in predicted.iter().zip(labels) {
    if pred < classes && (label as usize) < classes {
      matrix[label as usize][pred] += 1;
    }
  }
  matrix
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accuracy_fraction() {
    assert_eq!(accuracy::<f32>(&[1, 2, 3, 4], &[1, 2, 0, 0]), 0.5);
    assert_eq!(accuracy::<f64>(&[], &[]), 0.0);
  }

  #[test]
  fn confusion_counts() {
    let matrix = confusion(&[0, 1, 1, 2], &[0, 1, 2, 2], 3);
    assert_eq!(matrix, vec![
      vec![1, 0, 0],
      vec![0, 1, 0],
      vec![0, 1, 1],
    ]);
  }
}
