//! Categorical encoding implementations

use super::vocabulary::ResolvedVocabulary;
use crate::data::string_column;
use crate::error::{Result, ScoreError};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Type of encoder to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncoderType {
    /// One indicator column per category
    OneHot,
    /// Category rank as a single numeric column
    Ordinal,
}

/// Categorical encoder.
///
/// Ordinal encoders take their categories from a [`ResolvedVocabulary`];
/// one-hot encoders learn the sorted distinct training values. Values outside
/// the known categories are rejected at fit and transform time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    encoder_type: EncoderType,
    preset: Option<ResolvedVocabulary>,
    // column name -> ordered categories, in fit order
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(encoder_type: EncoderType) -> Self {
        Self {
            encoder_type,
            preset: None,
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    /// Use fixed category orders instead of learning them
    pub fn with_categories(mut self, vocabulary: ResolvedVocabulary) -> Self {
        self.preset = Some(vocabulary);
        self
    }

    /// Categories per column, available after fitting
    pub fn categories(&self) -> &[(String, Vec<String>)] {
        &self.categories
    }

    /// Fit the encoder to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let mut categories = Vec::with_capacity(columns.len());
        for name in columns {
            let values = string_column(df, name)?;
            let cats = match &self.preset {
                Some(vocab) => {
                    let cats = vocab.get(name).ok_or_else(|| {
                        ScoreError::ConfigError(format!("no vocabulary resolved for column '{}'", name))
                    })?;
                    if let Some(unknown) = values
                        .iter()
                        .flatten()
                        .find(|v| !cats.contains(*v))
                    {
                        return Err(ScoreError::UnknownCategory {
                            column: name.clone(),
                            value: unknown.clone(),
                        });
                    }
                    cats.to_vec()
                }
                None => {
                    let set: BTreeSet<String> = values.into_iter().flatten().collect();
                    if set.is_empty() {
                        return Err(ScoreError::ValidationError(format!(
                            "column '{}' has no categories to learn",
                            name
                        )));
                    }
                    set.into_iter().collect()
                }
            };
            categories.push((name.clone(), cats));
        }

        self.categories = categories;
        self.is_fitted = true;
        Ok(self)
    }

    /// Encode the fitted columns into a dense matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ScoreError::ModelNotFitted);
        }

        let n_rows = df.height();
        let mut out = Array2::zeros((n_rows, self.n_output_columns()));
        let mut offset = 0;

        for (name, cats) in &self.categories {
            let index: HashMap<&str, usize> = cats
                .iter()
                .enumerate()
                .map(|(i, c)| (c.as_str(), i))
                .collect();

            for (row, value) in string_column(df, name)?.into_iter().enumerate() {
                let value = value.ok_or_else(|| {
                    ScoreError::DataError(format!(
                        "column '{}' has a missing value at row {}",
                        name, row
                    ))
                })?;
                let pos = *index.get(value.as_str()).ok_or_else(|| ScoreError::UnknownCategory {
                    column: name.clone(),
                    value: value.clone(),
                })?;
                match self.encoder_type {
                    EncoderType::Ordinal => out[[row, offset]] = pos as f64,
                    EncoderType::OneHot => out[[row, offset + pos]] = 1.0,
                }
            }

            offset += match self.encoder_type {
                EncoderType::Ordinal => 1,
                EncoderType::OneHot => cats.len(),
            };
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Names of the output columns
    pub fn feature_names(&self) -> Vec<String> {
        match self.encoder_type {
            EncoderType::Ordinal => self.categories.iter().map(|(c, _)| c.clone()).collect(),
            EncoderType::OneHot => self
                .categories
                .iter()
                .flat_map(|(c, cats)| cats.iter().map(move |v| format!("{}_{}", c, v)))
                .collect(),
        }
    }

    fn n_output_columns(&self) -> usize {
        match self.encoder_type {
            EncoderType::Ordinal => self.categories.len(),
            EncoderType::OneHot => self.categories.iter().map(|(_, c)| c.len()).sum(),
        }
    }
}
