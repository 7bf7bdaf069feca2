//! Column-group preprocessing
//!
//! [`PreprocessorSpec`] describes three column groups and how each is
//! imputed and transformed. Fitting it yields a [`FittedPreprocessor`]
//! holding the learned statistics; only the fitted value can transform data.
//! Output columns are the numeric group, then the ordinal group, then the
//! one-hot indicators.

use super::encoder::{Encoder, EncoderType};
use super::imputer::{ImputeStrategy, Imputer};
use super::scaler::StandardScaler;
use super::vocabulary::ResolvedVocabulary;
use crate::data::columns_to_array2;
use crate::error::{Result, ScoreError};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unfitted preprocessing specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorSpec {
    pub numeric_columns: Vec<String>,
    pub numeric_strategy: ImputeStrategy,
    pub missing_sentinel: Option<f64>,
    pub vocabulary: ResolvedVocabulary,
    pub nominal_columns: Vec<String>,
}

impl PreprocessorSpec {
    pub fn new(
        numeric_columns: Vec<String>,
        numeric_strategy: ImputeStrategy,
        missing_sentinel: Option<f64>,
        vocabulary: ResolvedVocabulary,
        nominal_columns: Vec<String>,
    ) -> Self {
        Self {
            numeric_columns,
            numeric_strategy,
            missing_sentinel,
            vocabulary,
            nominal_columns,
        }
    }

    /// Same specification with a different numeric imputation strategy
    pub fn with_numeric_strategy(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_strategy = strategy;
        self
    }

    pub fn ordinal_columns(&self) -> Vec<String> {
        self.vocabulary.columns()
    }

    /// All input columns the preprocessor reads
    pub fn input_columns(&self) -> Vec<String> {
        self.numeric_columns
            .iter()
            .cloned()
            .chain(self.ordinal_columns())
            .chain(self.nominal_columns.iter().cloned())
            .collect()
    }

    /// Learn every statistic from `df`
    pub fn fit(&self, df: &DataFrame) -> Result<FittedPreprocessor> {
        if self.numeric_columns.is_empty()
            && self.vocabulary.is_empty()
            && self.nominal_columns.is_empty()
        {
            return Err(ScoreError::ConfigError(
                "preprocessor has no input columns".to_string(),
            ));
        }
        if df.height() == 0 {
            return Err(ScoreError::ValidationError(
                "cannot fit preprocessor on an empty frame".to_string(),
            ));
        }

        let mut numeric_imputer = Imputer::new(self.numeric_strategy.clone());
        if let Some(sentinel) = self.missing_sentinel {
            numeric_imputer = numeric_imputer.with_missing_sentinel(sentinel);
        }
        let imputed = numeric_imputer.fit_transform(df, &self.numeric_columns)?;
        let mut scaler = StandardScaler::new();
        scaler.fit(&imputed, &self.numeric_columns)?;

        let ordinal_columns = self.ordinal_columns();
        let mut ordinal_imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let imputed = ordinal_imputer.fit_transform(df, &ordinal_columns)?;
        let mut ordinal_encoder =
            Encoder::new(EncoderType::Ordinal).with_categories(self.vocabulary.clone());
        ordinal_encoder.fit(&imputed, &ordinal_columns)?;

        let mut nominal_imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let imputed = nominal_imputer.fit_transform(df, &self.nominal_columns)?;
        let mut onehot_encoder = Encoder::new(EncoderType::OneHot);
        onehot_encoder.fit(&imputed, &self.nominal_columns)?;

        let fitted = FittedPreprocessor {
            numeric_columns: self.numeric_columns.clone(),
            numeric_imputer,
            scaler,
            ordinal_imputer,
            ordinal_encoder,
            nominal_imputer,
            onehot_encoder,
        };
        debug!(
            rows = df.height(),
            output_features = fitted.n_features(),
            "Fitted preprocessor"
        );
        Ok(fitted)
    }
}

/// Preprocessor with learned fill values, scaling statistics and encodings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    numeric_columns: Vec<String>,
    numeric_imputer: Imputer,
    scaler: StandardScaler,
    ordinal_imputer: Imputer,
    ordinal_encoder: Encoder,
    nominal_imputer: Imputer,
    onehot_encoder: Encoder,
}

impl FittedPreprocessor {
    /// Transform a frame into the model matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let numeric = self.scaler.transform(&self.numeric_imputer.transform(df)?)?;
        let numeric = columns_to_array2(&numeric, &self.numeric_columns)?;

        let ordinal = self
            .ordinal_encoder
            .transform(&self.ordinal_imputer.transform(df)?)?;
        let nominal = self
            .onehot_encoder
            .transform(&self.nominal_imputer.transform(df)?)?;

        Ok(concatenate(
            Axis(1),
            &[numeric.view(), ordinal.view(), nominal.view()],
        )?)
    }

    /// Output column names, in matrix order
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric_columns
            .iter()
            .cloned()
            .chain(self.ordinal_encoder.feature_names())
            .chain(self.onehot_encoder.feature_names())
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names().len()
    }

    pub fn numeric_imputer(&self) -> &Imputer {
        &self.numeric_imputer
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}
