//! Category vocabularies for ordinal encoding
//!
//! A [`CategoricalVocabulary`] keeps two groups apart: vocabularies declared
//! up front with a meaningful order, and columns whose categories are taken
//! from the training data in order of first appearance. Resolving against a
//! training frame yields a [`ResolvedVocabulary`] that the ordinal encoder
//! consumes.

use crate::data::DataLoader;
use crate::error::{Result, ScoreError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered category list known in advance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredVocabulary {
    pub column: String,
    pub categories: Vec<String>,
}

/// Declared and inferred vocabularies for the ordinal column group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoricalVocabulary {
    pub declared: Vec<DeclaredVocabulary>,
    pub inferred: Vec<String>,
}

impl CategoricalVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an ordered vocabulary for `column`
    pub fn declare(mut self, column: &str, categories: &[&str]) -> Self {
        self.declared.push(DeclaredVocabulary {
            column: column.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Infer the vocabulary of `column` from training data
    pub fn infer(mut self, column: &str) -> Self {
        self.inferred.push(column.to_string());
        self
    }

    /// Columns covered, declared ones first
    pub fn columns(&self) -> Vec<String> {
        self.declared
            .iter()
            .map(|d| d.column.clone())
            .chain(self.inferred.iter().cloned())
            .collect()
    }

    /// Check the declarations without looking at any data
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.columns() {
            if !seen.insert(name.clone()) {
                return Err(ScoreError::ConfigError(format!(
                    "column '{}' is listed more than once in the vocabulary",
                    name
                )));
            }
        }

        for decl in &self.declared {
            if decl.categories.is_empty() {
                return Err(ScoreError::ConfigError(format!(
                    "declared vocabulary for '{}' is empty",
                    decl.column
                )));
            }
            let mut cats = HashSet::new();
            for c in &decl.categories {
                if !cats.insert(c.as_str()) {
                    return Err(ScoreError::ConfigError(format!(
                        "declared vocabulary for '{}' repeats category '{}'",
                        decl.column, c
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate, then read inferred vocabularies from `train`
    pub fn resolve(&self, train: &DataFrame) -> Result<ResolvedVocabulary> {
        self.validate()?;

        let mut entries: Vec<(String, Vec<String>)> = self
            .declared
            .iter()
            .map(|d| (d.column.clone(), d.categories.clone()))
            .collect();

        for column in &self.inferred {
            let unique = DataLoader::unique_values(train, column)?;
            if unique.values.is_empty() {
                return Err(ScoreError::ValidationError(format!(
                    "cannot infer categories for '{}': column has no values",
                    column
                )));
            }
            entries.push((column.clone(), unique.values));
        }

        Ok(ResolvedVocabulary { entries })
    }
}

/// Column to ordered category list, ready for encoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVocabulary {
    entries: Vec<(String, Vec<String>)>,
}

impl ResolvedVocabulary {
    pub fn columns(&self) -> Vec<String> {
        self.entries.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn get(&self, column: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, cats)| cats.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(c, cats)| (c.as_str(), cats.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> CategoricalVocabulary {
        CategoricalVocabulary::new()
            .declare("gender", &["male", "female"])
            .infer("lunch")
    }

    #[test]
    fn test_resolve_orders_declared_first() {
        let train = df!(
            "gender" => &["female", "male", "male"],
            "lunch" => &[Some("standard"), None, Some("free/reduced")]
        )
        .unwrap();
        let resolved = vocab().resolve(&train).unwrap();
        assert_eq!(resolved.columns(), vec!["gender", "lunch"]);
        assert_eq!(resolved.get("gender").unwrap(), &["male", "female"]);
        assert_eq!(resolved.get("lunch").unwrap(), &["standard", "free/reduced"]);
    }

    #[test]
    fn test_validate_rejects_bad_declarations() {
        let dup_col = vocab().infer("gender");
        assert!(matches!(dup_col.validate(), Err(ScoreError::ConfigError(_))));

        let empty = CategoricalVocabulary::new().declare("gender", &[]);
        assert!(matches!(empty.validate(), Err(ScoreError::ConfigError(_))));

        let dup_cat = CategoricalVocabulary::new().declare("gender", &["male", "male"]);
        assert!(matches!(dup_cat.validate(), Err(ScoreError::ConfigError(_))));
    }

    #[test]
    fn test_inferred_column_missing_or_null() {
        let no_lunch = df!("gender" => &["male"]).unwrap();
        assert!(matches!(
            vocab().resolve(&no_lunch),
            Err(ScoreError::FeatureNotFound(_))
        ));

        let null_lunch = df!(
            "gender" => &["male"],
            "lunch" => &[None::<&str>]
        )
        .unwrap();
        assert!(matches!(
            vocab().resolve(&null_lunch),
            Err(ScoreError::ValidationError(_))
        ));
    }
}
