//! Seams to the collaborators that feed the classifier.

use spendcat_core::{Label, Result};

use crate::datasets::Frame;

/// Supplies labelled transactions for training.
///
/// The frame must contain at least one text column and the target column;
/// numeric columns are optional.
pub trait TrainingSource {
    fn training_frame(&self) -> Result<Frame>;
}

impl TrainingSource for Frame {
    fn training_frame(&self) -> Result<Frame> {
        Ok(self.clone())
    }
}

/// Supplies the canonical list of selectable categories.
///
/// The list is taken as is; it is neither owned nor validated here.
pub trait CategoryVocabulary {
    fn categories(&self) -> Vec<Label>;
}

impl CategoryVocabulary for Vec<String> {
    fn categories(&self) -> Vec<Label> {
        self.clone()
    }
}

impl CategoryVocabulary for [String] {
    fn categories(&self) -> Vec<Label> {
        self.to_vec()
    }
}
