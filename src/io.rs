//! JSON adapter for fitted models.
//!
//! Where the bytes go is up to the caller; these functions only move a
//! [`NaiveBayes`] through a reader or writer.

use std::io::{Read, Write};

use spendcat_core::{Result, SpendcatError};
use spendcat_models::{NaiveBayes, SavedModel};
use tracing::debug;

/// Writes `model` (fitted or not) as JSON.
///
/// # Errors
///
/// - [`SpendcatError::Serialization`] if encoding or writing fails.
pub fn write_model<W: Write>(model: &NaiveBayes, writer: W) -> Result<()> {
    serde_json::to_writer(writer, model).map_err(|e| SpendcatError::Serialization(e.to_string()))?;
    debug!(fitted = model.is_fitted(), "model written");
    Ok(())
}

/// Reads a model written by [`write_model`].
///
/// A fitted model is checked through [`NaiveBayes::from_state`], so a
/// corrupted document is rejected instead of producing a broken model.
///
/// # Errors
///
/// - [`SpendcatError::Serialization`] if the input is not a valid model document.
/// - Any error of [`NaiveBayes::from_state`].
pub fn read_model<R: Read>(reader: R) -> Result<NaiveBayes> {
    let saved: SavedModel =
        serde_json::from_reader(reader).map_err(|e| SpendcatError::Serialization(e.to_string()))?;
    NaiveBayes::try_from(saved)
}
