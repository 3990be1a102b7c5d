use csv::{Reader, ReaderBuilder, Writer, WriterBuilder};
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use ndarray_csv::{Array2Reader, Array2Writer};
use tracing::info;

use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{DatasetLoadError, ExportError};
use crate::preprocessing::parse_token_list;

pub const LABEL_COLUMN: &str = "label";
pub const STEMMING_COLUMN: &str = "stemming";

/// One sentiment label with its share of the whole table
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStat {
  pub label: String,
  pub count: usize,
  pub percentage: f64,
}

/// Dataset
/// The pre-processed review table, read once and only ever viewed or exported
#[derive(Debug, Clone)]
pub struct Dataset {
  pub path: PathBuf,
  headers: Vec<String>,
  rows: Array2<String>,
}

impl Dataset {
  /// Load
  /// Reads the CSV and turns stored `stemming` token lists into space-joined text
  pub fn load(path: &Path) -> Result<Self, DatasetLoadError> {
    let file: File = File::open(path).map_err(|source| match source.kind() {
      ErrorKind::NotFound => DatasetLoadError::Missing { path: path.to_path_buf() },
      _ => DatasetLoadError::Io { path: path.to_path_buf(), source },
    })?;
    let parse_error = |message: String| DatasetLoadError::Parse { path: path.to_path_buf(), message };

    let mut reader: Reader<File> = ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers: Vec<String> = reader
      .headers()
      .map_err(|e| parse_error(e.to_string()))?
      .iter()
      .map(str::to_string)
      .collect();
    let rows: Array2<String> = reader.deserialize_array2_dynamic().map_err(|e| parse_error(e.to_string()))?;

    let rows: Array2<String> = if rows.nrows() == 0 {
      Array2::from_elem((0, headers.len()), String::new())
    } else if rows.ncols() != headers.len() {
      return Err(parse_error(format!("{} header columns but rows have {}", headers.len(), rows.ncols())));
    } else {
      rows
    };

    let mut dataset: Dataset = Self { path: path.to_path_buf(), headers, rows };
    dataset.decode_stemming()?;

    info!(
      path = %path.display(),
      rows = dataset.row_count(),
      columns = dataset.column_count(),
      "loaded dataset"
    );
    Ok(dataset)
  }

  fn decode_stemming(&mut self) -> Result<(), DatasetLoadError> {
    let Some(column) = self.column_index(STEMMING_COLUMN) else {
      return Ok(());
    };
    for (row, cell) in self.rows.column_mut(column).iter_mut().enumerate() {
      if cell.trim().is_empty() {
        continue;
      }
      let tokens: Vec<String> =
        parse_token_list(cell).map_err(|message| DatasetLoadError::MalformedTokens { row: row + 1, message })?;
      *cell = tokens.join(" ");
    }
    Ok(())
  }

  pub fn headers(&self) -> &[String] {
    &self.headers
  }

  pub fn row_count(&self) -> usize {
    self.rows.nrows()
  }

  pub fn column_count(&self) -> usize {
    self.headers.len()
  }

  fn column_index(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == name)
  }

  pub fn column(&self, name: &str) -> Option<ArrayView1<String>> {
    self.column_index(name).map(|i| self.rows.column(i))
  }

  pub fn has_labels(&self) -> bool {
    self.column_index(LABEL_COLUMN).is_some()
  }

  /// First `n` rows, or the whole table when it is shorter
  pub fn head(&self, n: usize) -> ArrayView2<String> {
    let n: usize = n.min(self.row_count());
    self.rows.slice(s![..n, ..])
  }

  /// Preview sizes offered to the user; the last one shows every row
  pub fn row_options(&self) -> [usize; 5] {
    [10, 20, 50, 100, self.row_count()]
  }

  /// Non-empty labels with their counts, in order of first appearance
  fn counts_in_order(&self) -> Vec<(String, usize)> {
    let Some(labels) = self.column(LABEL_COLUMN) else {
      return vec!();
    };
    let mut counts: Vec<(String, usize)> = vec!();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for label in labels.iter().filter(|l| !l.trim().is_empty()) {
      match index.get(label.as_str()) {
        Some(&i) => counts[i].1 += 1,
        None => {
          index.insert(label.as_str(), counts.len());
          counts.push((label.clone(), 1));
        }
      }
    }
    counts
  }

  /// Label Counts
  /// Most frequent label first; ties keep first-appearance order
  pub fn label_counts(&self) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = self.counts_in_order();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
  }

  /// Per-label count and percentage of all rows, in order of first appearance
  pub fn label_statistics(&self) -> Vec<LabelStat> {
    let total: usize = self.row_count();
    self
      .counts_in_order()
      .into_iter()
      .map(|(label, count)| LabelStat { label, count, percentage: count as f64 / total as f64 * 100.0 })
      .collect()
  }

  /// Writes the full table, header first
  pub fn write_csv<W: Write>(&self, out: W) -> Result<(), csv::Error> {
    // header goes out by hand; serialize_array2 must not try to infer one from its row iterator
    let mut writer: Writer<W> = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(&self.headers)?;
    writer.serialize_array2(&self.rows)?;
    writer.flush()?;
    Ok(())
  }

  /// Export
  /// Saves the full table as a delimited text file and returns the number of data rows written
  pub fn export(&self, path: &Path) -> Result<usize, ExportError> {
    let file: File = File::create(path).map_err(|source| ExportError::Io { path: path.to_path_buf(), source })?;
    self.write_csv(file)?;
    info!(path = %path.display(), rows = self.row_count(), "exported dataset");
    Ok(self.row_count())
  }
}
