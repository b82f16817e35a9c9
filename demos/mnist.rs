// This example trains the two classic MNIST baselines end to end.
// Put the four IDX files (raw or .gz) into data/mnist, or point
// MNIST_DIR at the directory holding them.

// Run with RUST_LOG=info to see per-epoch progress.

use microdense::{ data, single_layer, layered, fit, fit_with, evaluate, Model, TrainingConfig };

fn main() -> microdense::Result<()> {
  env_logger::init();

  let ((x_train, y_train), (x_test, y_test)) = data::load::<f32>()?.into_parts();

  // A single sigmoid layer straight from pixels to digits
  let mut model: Model<f32> = single_layer(784, "sigmoid", 10)?;
  println!("{model}");
  fit(&x_train, &y_train, &mut model, 1, 32)?;
  let (loss, accuracy) = evaluate(&x_test, &y_test, &model)?.into();
  println!("Single layer: loss {loss:.4}, accuracy {accuracy:.4}");

  // One hidden layer of 128 units, with hyperparameters from a config
  let config = TrainingConfig::new(3, 64).with_learning_rate(0.002);
  let mut model: Model<f32> = layered(784, ["relu", "softmax"], 128, 10)?;
  println!("{model}");
  let history = fit_with(&x_train, &y_train, &mut model, &config)?;
  if let Some((loss, accuracy)) = history.last() {
    println!("Last epoch: loss {loss:.4}, accuracy {accuracy:.4}");
  }
  let (loss, accuracy) = evaluate(&x_test, &y_test, &model)?.into();
  println!("Hidden layer: loss {loss:.4}, accuracy {accuracy:.4}");

  // Keep the trained network and the settings that produced it
  model.save("mnist.model")?;
  config.save("mnist.json")?;

  Ok(())
}
