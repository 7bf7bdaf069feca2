//! Data preprocessing module
//!
//! Provides imputation, scaling and categorical encoding, combined per
//! column group by [`PreprocessorSpec`].

mod column_transformer;
mod encoder;
mod imputer;
mod scaler;
mod vocabulary;

pub use column_transformer::{FittedPreprocessor, PreprocessorSpec};
pub use encoder::{Encoder, EncoderType};
pub use imputer::{ImputeStrategy, ImputeValue, Imputer};
pub use scaler::{ScalerParams, StandardScaler};
pub use vocabulary::{CategoricalVocabulary, DeclaredVocabulary, ResolvedVocabulary};
