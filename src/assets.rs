use tracing::warn;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::AssetMissingError;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Which pre-rendered word cloud an image shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCloudKind {
  Positive,
  Negative,
  AllWords,
}

impl WordCloudKind {
  pub const ALL: [WordCloudKind; 3] = [WordCloudKind::Positive, WordCloudKind::Negative, WordCloudKind::AllWords];

  pub fn file_name(&self) -> &'static str {
    match self {
      WordCloudKind::Positive => "positif.png",
      WordCloudKind::Negative => "negatif.png",
      WordCloudKind::AllWords => "seluruh kata.png",
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      WordCloudKind::Positive => "😊 Word Cloud Positif",
      WordCloudKind::Negative => "😞 Word Cloud Negatif",
      WordCloudKind::AllWords => "😐 Word Cloud Keseluruhan",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordCloud {
  pub kind: WordCloudKind,
  pub path: PathBuf,
  pub width: u32,
  pub height: u32,
  pub bytes: usize,
}

impl WordCloud {
  /// Reads one image and checks it is a PNG, taking its size from the IHDR chunk
  pub fn load(kind: WordCloudKind, dir: &Path) -> Result<Self, AssetMissingError> {
    let path: PathBuf = dir.join(kind.file_name());
    let data: Vec<u8> = std::fs::read(&path).map_err(|source| match source.kind() {
      ErrorKind::NotFound => AssetMissingError::Missing { path: path.clone() },
      _ => AssetMissingError::Io { path: path.clone(), source },
    })?;

    // signature, chunk length, "IHDR", then big-endian width and height
    if data.len() < 24 || data[..8] != PNG_SIGNATURE || &data[12..16] != b"IHDR" {
      return Err(AssetMissingError::NotPng { path });
    }
    let width: u32 = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height: u32 = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);

    Ok(Self { kind, path, width, height, bytes: data.len() })
  }
}

/// Word Cloud Set
/// The three word-cloud images, each loaded on its own so one missing file only hides that image
#[derive(Debug)]
pub struct WordCloudSet {
  pub dir: PathBuf,
  pub images: Vec<Result<WordCloud, AssetMissingError>>,
}

impl WordCloudSet {
  pub fn load(dir: &Path) -> Self {
    let images: Vec<Result<WordCloud, AssetMissingError>> = WordCloudKind::ALL
      .iter()
      .map(|&kind| {
        let image: Result<WordCloud, AssetMissingError> = WordCloud::load(kind, dir);
        if let Err(e) = &image {
          warn!(error = %e, "word cloud unavailable");
        }
        image
      })
      .collect();
    Self { dir: dir.to_path_buf(), images }
  }

  pub fn is_complete(&self) -> bool {
    self.images.iter().all(Result::is_ok)
  }

  /// File names the images directory is expected to hold
  pub fn expected_files() -> Vec<&'static str> {
    WordCloudKind::ALL.iter().map(WordCloudKind::file_name).collect()
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_reads_png_dimensions() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("positif.png"), fixtures::png_header(640, 320)).unwrap();

    let image: WordCloud = WordCloud::load(WordCloudKind::Positive, dir.path()).unwrap();
    assert_eq!((image.width, image.height), (640, 320));
  }

  #[test]
  fn it_loads_each_image_independently() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("negatif.png"), fixtures::png_header(10, 10)).unwrap();
    std::fs::write(dir.path().join("seluruh kata.png"), b"GIF89a not a png at all").unwrap();

    let set: WordCloudSet = WordCloudSet::load(dir.path());
    assert!(!set.is_complete());
    assert!(matches!(set.images[0], Err(AssetMissingError::Missing { .. })));
    assert!(set.images[1].is_ok());
    assert!(matches!(set.images[2], Err(AssetMissingError::NotPng { .. })));
  }

  #[test]
  fn it_names_the_expected_files() {
    assert_eq!(WordCloudSet::expected_files(), vec!["positif.png", "negatif.png", "seluruh kata.png"]);
  }

  #[test]
  fn it_is_complete_when_all_images_exist() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    fixtures::write_all(dir.path());
    assert!(WordCloudSet::load(dir.path()).is_complete());
  }
}
