// This example fits a tiny hidden layer network to the XOR function
// without any dataset on disk, then saves and reloads it.

use microdense::{ layered, fit_with, evaluate_with, Loss, Model, Tensor, TrainingConfig, OptimizerKind };

fn main() -> microdense::Result<()> {
  env_logger::init();

  let features = Tensor::from_rows(&[
    [0.0, 0.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
  ])?;
  let labels = [0, 1, 1, 0];

  // Two classes only, so the output layer has two units
  let mut model: Model<f64> = layered(2, ["tanh", "softmax"], 8, 2)?;
  let config = TrainingConfig::new(500, 4)
    .with_optimizer(OptimizerKind::Adam)
    .with_learning_rate(0.05)
    .with_num_classes(2);

  print!("{model}");
  let history = fit_with(&features, &labels, &mut model, &config)?;
  if let Some((loss, accuracy)) = history.last() {
    println!("Trained: loss {loss:.4}, accuracy {accuracy:.2}");
  }

  let filename = "xor.model";
  model.save(filename)?;
  let model = Model::<f64>::load(filename)?;

  let evaluation = evaluate_with(&features, &labels, &model, Loss::CategoricalCrossEntropy, 2)?;
  println!("Reloaded: loss {:.4}, accuracy {:.2}", evaluation.loss, evaluation.accuracy);
  println!("{}", model.predict(&features)?);

  Ok(())
}
