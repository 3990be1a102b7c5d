use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::preprocessing::FeatureVector;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
  #[error("feature vector has {found} columns, model expects {expected}")]
  ShapeMismatch { expected: usize, found: usize },
}

/// Linear SVM
/// One-vs-rest linear classifier fitted elsewhere; binary models keep a single coefficient row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvm {
  pub classes: Vec<String>,
  pub coef: Array2<f64>,
  pub intercept: Array1<f64>,
}

impl LinearSvm {
  pub fn new(classes: Vec<String>, coef: Array2<f64>, intercept: Array1<f64>) -> Self {
    Self { classes, coef, intercept }
  }

  pub fn n_features(&self) -> usize {
    self.coef.ncols()
  }

  pub fn is_binary(&self) -> bool {
    self.coef.nrows() == 1
  }

  /// Rejects decoded artifacts whose shapes disagree
  pub fn validate(&self) -> Result<(), String> {
    let rows: usize = self.coef.nrows();
    if self.classes.len() < 2 {
      return Err(format!("need at least 2 classes, found {}", self.classes.len()));
    }
    if rows == 1 && self.classes.len() != 2 {
      return Err(format!("single coefficient row but {} classes", self.classes.len()));
    }
    if rows != 1 && rows != self.classes.len() {
      return Err(format!("{} coefficient rows for {} classes", rows, self.classes.len()));
    }
    if self.intercept.len() != rows {
      return Err(format!("{} intercepts for {} coefficient rows", self.intercept.len(), rows));
    }
    if self.n_features() == 0 {
      return Err("coefficient matrix has no feature columns".to_string());
    }
    Ok(())
  }

  /// Decision Function
  /// Signed distance of x from each class hyperplane, one value for binary models
  pub fn decision_function(&self, x: &FeatureVector) -> Result<Array1<f64>, ModelError> {
    if x.len() != self.n_features() {
      return Err(ModelError::ShapeMismatch { expected: self.n_features(), found: x.len() });
    }
    Ok(self.coef.dot(x) + &self.intercept)
  }

  /// Index into `classes` and the margin that picked it
  fn decide(&self, x: &FeatureVector) -> Result<(usize, f64), ModelError> {
    let margins: Array1<f64> = self.decision_function(x)?;
    if self.is_binary() {
      let margin: f64 = margins[0];
      let class: usize = if margin > 0.0 { 1 } else { 0 };
      return Ok((class, margin));
    }

    // first maximum wins on ties
    let (class, margin) = margins
      .iter()
      .enumerate()
      .fold((0, f64::NEG_INFINITY), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
    Ok((class, margin))
  }

  pub fn predict(&self, x: &FeatureVector) -> Result<String, ModelError> {
    let (class, _) = self.decide(x)?;
    Ok(self.classes[class].clone())
  }

  /// Margin of the predicted class; the raw decision value for binary models
  pub fn score(&self, x: &FeatureVector) -> Result<f64, ModelError> {
    let (_, margin) = self.decide(x)?;
    Ok(margin)
  }
}
