use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Dense TF-IDF weights for one review, one column per vocabulary term
pub type FeatureVector = Array1<f64>;

#[derive(Error, Debug)]
pub enum VectorizeError {
  #[error("tokenization failed: {0}")]
  Tokenization(String),
}

/// Row normalization applied after idf weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Norm {
  L1,
  L2,
  Raw,
}

/// TF-IDF Vectorizer
/// Fitted word-level text transformer, loaded from disk and never refit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
  pub vocabulary: HashMap<String, usize>,
  pub idf: Array1<f64>,
  pub lowercase: bool,
  pub ngram_range: (usize, usize),
  pub sublinear_tf: bool,
  pub norm: Norm,
}

impl TfidfVectorizer {
  /// Builds a unigram, lowercasing, l2-normalized vectorizer from fitted terms and idf weights
  pub fn new(vocabulary: HashMap<String, usize>, idf: Array1<f64>) -> Self {
    Self { vocabulary, idf, lowercase: true, ngram_range: (1, 1), sublinear_tf: false, norm: Norm::L2 }
  }

  /// Number of features every transformed vector carries
  pub fn dimension(&self) -> usize {
    self.idf.len()
  }

  /// Rejects decoded artifacts whose vocabulary and weights disagree
  pub fn validate(&self) -> Result<(), String> {
    let (min_n, max_n) = self.ngram_range;
    if min_n == 0 || min_n > max_n {
      return Err(format!("bad ngram range ({}, {})", min_n, max_n));
    }
    if self.vocabulary.len() != self.idf.len() {
      return Err(format!("{} vocabulary terms but {} idf weights", self.vocabulary.len(), self.idf.len()));
    }
    if let Some((term, column)) = self.vocabulary.iter().find(|&(_, &column)| column >= self.idf.len()) {
      return Err(format!("term `{}` maps to column {} out of {}", term, column, self.idf.len()));
    }
    Ok(())
  }

  /// Splits text into the word terms the vocabulary was built from
  fn tokenize(&self, text: &str) -> Result<Vec<String>, VectorizeError> {
    let text: String = if self.lowercase { text.to_lowercase() } else { text.to_string() };
    let mut pretokenized: PreTokenizedString = PreTokenizedString::from(text.as_str());
    Whitespace {}
      .pre_tokenize(&mut pretokenized)
      .map_err(|e| VectorizeError::Tokenization(e.to_string()))?;

    let words: Vec<String> = pretokenized
      .get_splits(OffsetReferential::Original, OffsetType::Byte)
      .into_iter()
      .map(|(word, _, _)| word)
      .filter(|word| is_term(word))
      .map(str::to_string)
      .collect();
    Ok(words)
  }

  /// Transform
  /// Converts raw review text into its feature vector
  pub fn transform(&self, text: &str) -> Result<FeatureVector, VectorizeError> {
    let words: Vec<String> = self.tokenize(text)?;
    let mut x: FeatureVector = Array1::zeros(self.dimension());

    let (min_n, max_n) = self.ngram_range;
    for n in min_n..=max_n {
      for gram in words.windows(n) {
        let term: String = gram.join(" ");
        if let Some(&column) = self.vocabulary.get(&term) {
          x[column] += 1.0;
        }
      }
    }

    if self.sublinear_tf {
      x.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
    }
    x *= &self.idf;

    match self.norm {
      Norm::L1 => {
        let total: f64 = x.iter().map(|v| v.abs()).sum();
        if total > 0.0 { x /= total; }
      }
      Norm::L2 => {
        let length: f64 = x.dot(&x).sqrt();
        if length > 0.0 { x /= length; }
      }
      Norm::Raw => {}
    }

    Ok(x)
  }
}

/// Terms are word runs of at least two characters, punctuation runs are dropped.
/// Splits never mix word and punctuation characters, so the first character decides;
/// combining marks inside a word stay part of it.
fn is_term(word: &str) -> bool {
  let starts_as_word: bool = word.chars().next().map_or(false, |c| c.is_alphanumeric() || c == '_');
  starts_as_word && word.chars().count() >= 2
}

/// Parse Token List
/// Decodes a stored list literal such as `['aplikasi', "bantu"]` into its tokens
pub fn parse_token_list(raw: &str) -> Result<Vec<String>, String> {
  let body: &str = raw.trim();
  let inner: &str = body
    .strip_prefix('[')
    .and_then(|rest| rest.strip_suffix(']'))
    .ok_or_else(|| format!("expected a bracketed list, got `{}`", body))?;

  let mut chars: Peekable<Chars> = inner.chars().peekable();
  let mut tokens: Vec<String> = vec!();

  loop {
    skip_whitespace(&mut chars);
    let quote: char = match chars.next() {
      None => break,
      Some(c @ ('\'' | '"')) => c,
      Some(c) => return Err(format!("expected a quoted token, found `{}`", c)),
    };
    tokens.push(read_quoted(&mut chars, quote)?);

    skip_whitespace(&mut chars);
    match chars.next() {
      None => break,
      Some(',') => continue,
      Some(c) => return Err(format!("expected `,` between tokens, found `{}`", c)),
    }
  }

  Ok(tokens)
}

fn skip_whitespace(chars: &mut Peekable<Chars>) {
  while chars.peek().map_or(false, |c| c.is_whitespace()) {
    chars.next();
  }
}

fn read_quoted(chars: &mut Peekable<Chars>, quote: char) -> Result<String, String> {
  let mut token: String = String::new();
  while let Some(c) = chars.next() {
    match c {
      '\\' => match chars.next() {
        Some('n') => token.push('\n'),
        Some('t') => token.push('\t'),
        Some('r') => token.push('\r'),
        Some(escaped) => token.push(escaped),
        None => break,
      },
      c if c == quote => return Ok(token),
      c => token.push(c),
    }
  }
  Err(format!("unterminated token `{}{}`", quote, token))
}
