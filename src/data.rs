//! MNIST handwritten digits, read from the four standard IDX files.
//!
//! Files may be stored raw (`train-images-idx3-ubyte`) or gzip-compressed
//! (`train-images-idx3-ubyte.gz`). Pixels get scaled to `[0, 1]` and every
//! 28x28 image is flattened into a row of 784 features.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{ Cursor, Read };
use std::path::{ Path, PathBuf };

use byteorder::{ BigEndian, ReadBytesExt };
use flate2::read::GzDecoder;
use log::info;

use crate::{
  internal::*,
  scalar::Real,
  tensor::Tensor,
  error::{ Error, Result },
};


pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const IMAGE_SIZE: usize = WIDTH * HEIGHT;
pub const NUM_CLASSES: usize = 10;

/// Environment variable pointing at the directory holding the IDX files.
pub const DIR_VAR: &str = "MNIST_DIR";
pub const DEFAULT_DIR: &str = "data/mnist";

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;


/// Feature rows and their index-aligned class labels.

#[derive(Debug, Clone, PartialEq)]
pub struct Split<R: Real> {
  pub features: Tensor<R>,
  pub labels: Vec<u8>,
}

impl<R: Real> Split<R> {
  pub fn new(features: Tensor<R>, labels: Vec<u8>) -> Result<Self> {
    if features.rows() != labels.len() {
      return Err(Error::shape(format!(
        "{} feature rows for {} labels", features.rows(), labels.len())))
    }
    Ok(Self { features, labels })
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  /// The first `n` examples.

  pub fn take(&self, n: usize) -> Self {
    let n = n.min(self.len());
    Self {
      features: self.features.range(0..n),
      labels: self.labels[..n].to_vec(),
    }
  }
}


/// Training and test split of the MNIST dataset.

#[derive(Debug, Clone, PartialEq)]
pub struct Mnist<R: Real> {
  pub train: Split<R>,
  pub test: Split<R>,
}

impl<R: Real> Mnist<R> {
  pub fn into_parts(self) -> ((Tensor<R>, Vec<u8>), (Tensor<R>, Vec<u8>)) {
    ((self.train.features, self.train.labels), (self.test.features, self.test.labels))
  }
}


/// Load MNIST from the directory named by `MNIST_DIR`, or `data/mnist`.

pub fn load<R: Real>() -> Result<Mnist<R>> {
  load_from(dataset_dir(env::var_os(DIR_VAR)))
}

fn dataset_dir(configured: Option<OsString>) -> PathBuf {
  configured
    .filter(|dir| !dir.is_empty() )
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR))
}

/// Load MNIST from the given directory.

pub fn load_from<R: Real>(dir: impl AsRef<Path>) -> Result<Mnist<R>> {
  let dir = dir.as_ref();
  let train = load_split(dir, TRAIN_IMAGES, TRAIN_LABELS)?;
  let test = load_split(dir, TEST_IMAGES, TEST_LABELS)?;
  info!("Loaded MNIST from {}: {} training, {} test examples", dir.display(), train.len(), test.len());
  Ok(Mnist { train, test })
}

fn load_split<R: Real>(dir: &Path, images: &str, labels: &str) -> Result<Split<R>> {
  let (images_path, image_bytes) = read_file(dir, images)?;
  let (labels_path, label_bytes) = read_file(dir, labels)?;
  let pixels = parse_images(&image_bytes).map_err(|reason| format_error(&images_path, reason) )?;
  let labels = parse_labels(&label_bytes).map_err(|reason| format_error(&labels_path, reason) )?;

  let count = pixels.len() / IMAGE_SIZE;
  if count != labels.len() {
    return Err(format_error(&labels_path, format!("{} labels for {count} images", labels.len())))
  }
  if let Some(label) = labels.iter().find(|&&label| label as usize >= NUM_CLASSES ) {
    return Err(format_error(&labels_path, format!("label {label} is not a digit")))
  }

  Split::new(normalize(count, &pixels), labels)
}

/// Scale raw pixel intensities into `[0, 1]`, one image per row.

pub fn normalize<R: Real>(count: usize, pixels: &[u8]) -> Tensor<R> {
  let max = cast::<R>(255.0);
  let data = pixels.iter().map(|&p| cast::<R>(p as f64) / max ).collect();
  Tensor::new(count, IMAGE_SIZE, data)
}

/// Encode a single label as a vector of `class_count` values with a one at the label's index.

pub fn one_hot<R: Real>(label: usize, class_count: usize) -> Result<Vec<R>> {
  if label >= class_count {
    return Err(Error::shape(format!("label {label} is outside [0, {}]", class_count.saturating_sub(1))))
  }
  let mut hot = vec![R::zero(); class_count];
  hot[label] = R::one();
  Ok(hot)
}

fn read_file(dir: &Path, name: &str) -> Result<(PathBuf, Vec<u8>)> {
  let raw = dir.join(name);
  let mut bytes = vec![];
  if raw.exists() {
    File::open(&raw)?.read_to_end(&mut bytes)?;
    return Ok((raw, bytes))
  }
  let gz = dir.join(format!("{name}.gz"));
  GzDecoder::new(File::open(&gz)?).read_to_end(&mut bytes)?;
  Ok((gz, bytes))
}

fn format_error(path: &Path, reason: String) -> Error {
  Error::Format { path: path.display().to_string(), reason }
}

fn parse_images(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
  let mut reader = Cursor::new(bytes);
  let header = |reader: &mut Cursor<&[u8]>| reader.read_u32::<BigEndian>()
    .map_err(|_| "truncated header".to_string() );
  let magic = header(&mut reader)?;
  if magic != IMAGES_MAGIC {
    return Err(format!("bad magic number {magic}, expected {IMAGES_MAGIC}"))
  }
  let count = header(&mut reader)? as usize;
  let (rows, cols) = (header(&mut reader)? as usize, header(&mut reader)? as usize);
  if (rows, cols) != (HEIGHT, WIDTH) {
    return Err(format!("images are {rows}x{cols}, expected {HEIGHT}x{WIDTH}"))
  }
  let data = &bytes[reader.position() as usize..];
  if data.len() < count * IMAGE_SIZE {
    return Err(format!("{} bytes of pixel data for {count} images", data.len()))
  }
  Ok(data[..count * IMAGE_SIZE].to_vec())
}

fn parse_labels(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
  let mut reader = Cursor::new(bytes);
  let magic = reader.read_u32::<BigEndian>().map_err(|_| "truncated header".to_string() )?;
  if magic != LABELS_MAGIC {
    return Err(format!("bad magic number {magic}, expected {LABELS_MAGIC}"))
  }
  let count = reader.read_u32::<BigEndian>().map_err(|_| "truncated header".to_string() )? as usize;
  let data = &bytes[reader.position() as usize..];
  if data.len() < count {
    return Err(format!("{} bytes of label data for {count} labels", data.len()))
  }
  Ok(data[..count].to_vec())
}


#[cfg(test)]
mod tests {
  use super::*;

  fn images_file(count: u32, rows: u32, pixels: &[u8]) -> Vec<u8> {
    let mut bytes = vec![];
    for value in [IMAGES_MAGIC, count, rows, WIDTH as u32] {
      bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes.extend_from_slice(pixels);
    bytes
  }

  #[test]
  fn parse_valid_images() {
    let pixels: Vec<u8> = (0..2 * IMAGE_SIZE).map(|i| (i % 256) as u8 ).collect();
    let parsed = parse_images(&images_file(2, 28, &pixels)).unwrap();
    assert_eq!(parsed, pixels);
  }

  #[test]
  fn reject_bad_images() {
    let pixels = vec![0u8; IMAGE_SIZE];
    assert!(parse_images(&images_file(2, 28, &pixels)).is_err());
    assert!(parse_images(&images_file(1, 27, &pixels)).is_err());
    assert!(parse_images(&[0, 0, 8, 3]).is_err());
    assert!(parse_images(&[]).is_err());
  }

  #[test]
  fn parse_label_file() {
    let mut bytes = LABELS_MAGIC.to_be_bytes().to_vec();
    bytes.extend_from_slice(&3u32.to_be_bytes());
    bytes.extend_from_slice(&[7, 0, 9]);
    assert_eq!(parse_labels(&bytes).unwrap(), vec![7, 0, 9]);
    bytes[3] = 0x03;
    assert!(parse_labels(&bytes).is_err());
  }

  #[test]
  fn normalized_range() {
    let pixels: Vec<u8> = (0..2 * IMAGE_SIZE).map(|i| [0, 128, 255][i % 3] ).collect();
    let features = normalize::<f32>(2, &pixels);
    assert_eq!(features.shape(), (2, IMAGE_SIZE));
    assert!(features.raw().iter().all(|&p| (0.0..=1.0).contains(&p) ));
    assert_eq!(features.raw()[2], 1.0);
    assert_eq!(features.raw()[0], 0.0);
  }

  #[test]
  fn one_hot_vectors() {
    for label in 0..NUM_CLASSES {
      let hot = one_hot::<f64>(label, NUM_CLASSES).unwrap();
      assert_eq!(hot.len(), NUM_CLASSES);
      assert_eq!(hot.iter().sum::<f64>(), 1.0);
      let decoded = Tensor::vec(&hot).argmax_rows()[0];
      assert_eq!(decoded, label);
    }
    assert!(matches!(one_hot::<f64>(10, NUM_CLASSES), Err(Error::ShapeMismatch(_))));
  }

  #[test]
  fn split_alignment() {
    assert!(Split::new(Tensor::<f32>::zeros(3, 4), vec![1, 2]).is_err());
    let split = Split::new(Tensor::<f32>::zeros(3, 4), vec![1, 2, 3]).unwrap();
    assert_eq!(split.take(2).len(), 2);
    assert_eq!(split.take(5).features.rows(), 3);
  }

  #[test]
  fn directory_resolution() {
    assert_eq!(dataset_dir(None), PathBuf::from(DEFAULT_DIR));
    assert_eq!(dataset_dir(Some(OsString::new())), PathBuf::from(DEFAULT_DIR));
    assert_eq!(dataset_dir(Some("/srv/mnist".into())), PathBuf::from("/srv/mnist"));
  }
}
