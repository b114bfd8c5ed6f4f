//! Feature matrix construction.
//!
//! - [`vocabulary`]: Fitted, versioned category lists and one-hot encoding
//! - [`builder`]: Numeric casting, indicator columns and the target vector

pub mod builder;
pub mod vocabulary;

pub use builder::{FeatureBuilder, FeatureMatrix, FeatureSet, TargetVector};
pub use vocabulary::{indicator_name, CategoricalColumn, CategoryVocabulary, MISSING_CATEGORY};
