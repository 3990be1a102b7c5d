use tracing::warn;

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::artifacts::FsArtifactLoader;
use crate::assets::WordCloudSet;
use crate::charts::{bar_chart, share_chart};
use crate::config::AppConfig;
use crate::dataset::{Dataset, LabelStat};
use crate::error::{DatasetLoadError, ExportError, PredictError};
use crate::inference::{ArtifactLoader, InferenceService, Prediction};

const MAX_CELL_CHARS: usize = 40;

/// The four menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
  Dashboard,
  Dataset,
  ManualPrediction,
  Visualization,
}

impl View {
  pub const ALL: [View; 4] = [View::Dashboard, View::Dataset, View::ManualPrediction, View::Visualization];

  pub fn title(&self) -> &'static str {
    match self {
      View::Dashboard => "🏠 Dashboard",
      View::Dataset => "📄 Dataset",
      View::ManualPrediction => "🧠 Prediksi Manual",
      View::Visualization => "📈 Visualisasi Sentimen",
    }
  }

  /// Menu choice by 1-based number
  pub fn from_choice(choice: &str) -> Option<View> {
    let index: usize = choice.trim().parse().ok()?;
    index.checked_sub(1).and_then(|i| View::ALL.get(i).copied())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizationTab {
  Distribution,
  WordCloud,
  Detail,
}

impl VisualizationTab {
  pub const ALL: [VisualizationTab; 3] = [VisualizationTab::Distribution, VisualizationTab::WordCloud, VisualizationTab::Detail];
}

/// Python-style title case: a letter is capitalized when it follows a non-letter
fn title_case(label: &str) -> String {
  let mut out: String = String::with_capacity(label.len());
  let mut after_letter: bool = false;
  for c in label.chars() {
    if after_letter {
      out.extend(c.to_lowercase());
    } else {
      out.extend(c.to_uppercase());
    }
    after_letter = c.is_alphabetic();
  }
  out
}

fn truncate(cell: &str) -> String {
  if cell.chars().count() <= MAX_CELL_CHARS {
    return cell.to_string();
  }
  let mut short: String = cell.chars().take(MAX_CELL_CHARS - 1).collect();
  short.push('…');
  short
}

fn dataset_notice(e: &DatasetLoadError) -> String {
  match e {
    DatasetLoadError::Missing { .. } => format!("❌ Dataset tidak ditemukan. Pastikan file ada di folder 'data/' ({})\n", e),
    _ => format!("❌ Dataset tidak dapat dimuat: {}\n", e),
  }
}

const NO_LABEL_NOTICE: &str = "⚠️ Kolom `label` tidak ditemukan di dataset.\n";

/// Dashboard
/// Everything the user can look at. Each collaborator that fails to load is kept as its error,
/// so the views that depend on it show a notice while the rest keep working.
pub struct Dashboard<L: ArtifactLoader> {
  config: AppConfig,
  dataset: Result<Dataset, DatasetLoadError>,
  inference: InferenceService<L>,
  word_clouds: WordCloudSet,
}

impl Dashboard<FsArtifactLoader> {
  pub fn open(config: AppConfig) -> Self {
    let loader: FsArtifactLoader = FsArtifactLoader::from_paths(&config.artifacts);
    Self::with_loader(config, loader)
  }
}

impl<L: ArtifactLoader> Dashboard<L> {
  /// Loads the dataset, the artifacts and the images up front; never fails
  pub fn with_loader(config: AppConfig, loader: L) -> Self {
    let dataset: Result<Dataset, DatasetLoadError> = Dataset::load(&config.dataset_path);
    if let Err(e) = &dataset {
      warn!(error = %e, "dataset unavailable, dataset views disabled");
    }

    let inference: InferenceService<L> = InferenceService::new(loader);
    // a failure is memoized and reported by the prediction view
    let _ = inference.initialize();

    let word_clouds: WordCloudSet = WordCloudSet::load(&config.images_dir);
    Self { config, dataset, inference, word_clouds }
  }

  pub fn config(&self) -> &AppConfig {
    &self.config
  }

  pub fn dataset(&self) -> Result<&Dataset, &DatasetLoadError> {
    self.dataset.as_ref()
  }

  pub fn inference(&self) -> &InferenceService<L> {
    &self.inference
  }

  pub fn word_clouds(&self) -> &WordCloudSet {
    &self.word_clouds
  }

  pub fn predict(&self, text: &str) -> Result<Prediction, PredictError> {
    self.inference.classify(text)
  }

  /// Renders a view with its default settings; Manual Prediction shows its input prompt
  pub fn render(&self, view: View) -> String {
    match view {
      View::Dashboard => self.render_dashboard(),
      View::Dataset => self.render_dataset(self.config.preview_rows),
      View::ManualPrediction => self.render_prediction_form(),
      View::Visualization => VisualizationTab::ALL.iter().map(|&tab| self.render_visualization(tab)).collect(),
    }
  }

  pub fn render_dashboard(&self) -> String {
    let mut out: String = "### 📊 Distribusi Sentimen Cepat\n".to_string();
    match self.dataset() {
      Err(e) => out.push_str(&dataset_notice(e)),
      Ok(dataset) if !dataset.has_labels() => out.push_str(NO_LABEL_NOTICE),
      Ok(dataset) => out.push_str(&share_chart("Distribusi Sentimen Mobile JKN", &dataset.label_counts(), None)),
    }
    out
  }

  pub fn render_dataset(&self, rows: usize) -> String {
    let mut out: String = "## 📄 Dataset Mobile JKN\n".to_string();
    let dataset: &Dataset = match self.dataset() {
      Ok(dataset) => dataset,
      Err(e) => {
        out.push_str(&dataset_notice(e));
        return out;
      }
    };

    let _ = writeln!(out, "📊 Total baris: {} | 📈 Total kolom: {}", dataset.row_count(), dataset.column_count());
    let _ = writeln!(out, "🔍 Tampilkan baris: {:?}", dataset.row_options());
    let _ = writeln!(out, "### 📊 Data Preview ({} baris)", rows.min(dataset.row_count()));
    out.push_str(&render_table(dataset, rows));
    let _ = writeln!(out, "📥 Download Dataset: {}", self.config.export_file_name);
    out
  }

  /// Writes the whole table to `path`, or to the configured export file name
  pub fn export_dataset(&self, path: Option<&Path>) -> Result<(PathBuf, usize), ExportError> {
    let dataset: &Dataset = self.dataset().map_err(|e| ExportError::Unavailable(e.to_string()))?;
    let path: PathBuf = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(&self.config.export_file_name));
    let rows: usize = dataset.export(&path)?;
    Ok((path, rows))
  }

  fn unavailable_prediction_notice(&self) -> Option<String> {
    self.inference.load_error().map(|e| {
      format!("❌ Model atau vectorizer tidak ditemukan. Pastikan file ada di folder 'model/' ({})\n", e)
    })
  }

  pub fn render_prediction_form(&self) -> String {
    let mut out: String = "## 🧠 Prediksi Sentimen Manual\n".to_string();
    match self.unavailable_prediction_notice() {
      Some(notice) => out.push_str(&notice),
      None => {
        out.push_str("### ✍️ Masukkan Ulasan Anda\n");
        out.push_str("Tulis ulasan tentang aplikasi Mobile JKN:\n");
        out.push_str("💡 Tulis ulasan yang jelas dan lengkap untuk hasil prediksi yang lebih akurat!\n");
      }
    }
    out
  }

  /// Render Prediction
  /// Classifies one review and describes the outcome, including blank input and failures
  pub fn render_prediction(&self, text: &str) -> String {
    if let Some(notice) = self.unavailable_prediction_notice() {
      return notice;
    }
    match self.predict(text) {
      Ok(prediction) => {
        let category = prediction.category();
        format!(
          "{} Hasil Prediksi: {} [{}]\nTingkat kepercayaan: {:.2}\n",
          category.emoji(),
          prediction.label.to_uppercase(),
          category.color(),
          prediction.confidence
        )
      }
      Err(PredictError::EmptyInput) => "⚠️ Silakan masukkan teks ulasan terlebih dahulu!\n".to_string(),
      Err(PredictError::Classification(e)) => {
        warn!(error = %e, "prediction failed");
        format!("❌ Terjadi kesalahan dalam prediksi: {}\n", e)
      }
    }
  }

  pub fn render_visualization(&self, tab: VisualizationTab) -> String {
    match tab {
      VisualizationTab::Distribution => self.render_distribution(),
      VisualizationTab::WordCloud => self.render_word_clouds(),
      VisualizationTab::Detail => self.render_detail(),
    }
  }

  /// Dataset with a label column, or the notice to show instead
  fn labelled_dataset(&self) -> Result<&Dataset, String> {
    match self.dataset() {
      Err(e) => Err(dataset_notice(e)),
      Ok(dataset) if !dataset.has_labels() => Err(NO_LABEL_NOTICE.to_string()),
      Ok(dataset) => Ok(dataset),
    }
  }

  fn render_distribution(&self) -> String {
    let mut out: String = "### 📊 Distribusi Sentimen\n".to_string();
    match self.labelled_dataset() {
      Err(notice) => out.push_str(&notice),
      Ok(dataset) => {
        let counts: Vec<(String, usize)> = dataset.label_counts();
        out.push_str(&bar_chart("📊 Distribusi Sentimen (Bar Chart)", &counts));
        out.push_str(&share_chart("🥧 Distribusi Sentimen (Pie Chart)", &counts, None));
      }
    }
    out
  }

  fn render_word_clouds(&self) -> String {
    let mut out: String = "### ☁️ Word Cloud Analysis\n".to_string();
    for image in &self.word_clouds.images {
      match image {
        Ok(cloud) => {
          let _ = writeln!(
            out,
            "#### {}\n  {} ({}x{}, {} bytes)",
            cloud.kind.title(),
            cloud.path.display(),
            cloud.width,
            cloud.height,
            cloud.bytes
          );
        }
        Err(e) => {
          let _ = writeln!(out, "❌ {}", e);
        }
      }
    }
    if !self.word_clouds.is_complete() {
      let _ = writeln!(
        out,
        "📁 File yang dibutuhkan di '{}': {}",
        self.word_clouds.dir.display(),
        WordCloudSet::expected_files().join(", ")
      );
    }
    out
  }

  fn render_detail(&self) -> String {
    let mut out: String = "### 📈 Analisis Detail\n".to_string();
    let dataset: &Dataset = match self.labelled_dataset() {
      Ok(dataset) => dataset,
      Err(notice) => {
        out.push_str(&notice);
        return out;
      }
    };

    out.push_str("#### 📊 Statistik Sentimen\n");
    let stats: Vec<LabelStat> = dataset.label_statistics();
    for stat in &stats {
      let _ = writeln!(out, "  {}: {} ({:.1}%)", title_case(&stat.label), stat.count, stat.percentage);
    }
    out.push_str(&share_chart("🍩 Donut Chart Sentimen", &dataset.label_counts(), Some("Sentimen")));
    out
  }
}

fn render_table(dataset: &Dataset, rows: usize) -> String {
  let preview = dataset.head(rows);
  let widths: Vec<usize> = dataset
    .headers()
    .iter()
    .enumerate()
    .map(|(i, header)| {
      preview
        .column(i)
        .iter()
        .map(|cell| truncate(cell).chars().count())
        .chain(std::iter::once(header.chars().count()))
        .max()
        .unwrap_or(0)
    })
    .collect();

  let format_row = |cells: Vec<String>| -> String {
    let padded: Vec<String> = cells
      .iter()
      .zip(&widths)
      .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
      .collect();
    format!("| {} |\n", padded.join(" | "))
  };

  let mut out: String = format_row(dataset.headers().iter().map(|h| truncate(h)).collect());
  let rule: Vec<String> = widths.iter().map(|&width| "-".repeat(width)).collect();
  let _ = writeln!(out, "|-{}-|", rule.join("-|-"));
  for row in preview.rows() {
    out.push_str(&format_row(row.iter().map(|cell| truncate(cell)).collect()));
  }
  out
}
