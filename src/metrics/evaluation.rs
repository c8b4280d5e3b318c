use std::collections::BTreeMap;

use serde::Serialize;
use spendcat_core::stats::{percentile, weighted_mean};
use spendcat_core::{Float, Label, Ranking, Result, SpendcatError};
use tracing::warn;

/// Accuracy figures for one true class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStats {
    pub label: Label,
    /// Validation rows of this class that could be scored.
    pub count: usize,
    /// Median rank of the true label.
    pub place_q50: Float,
    /// Share of rows whose rank is within the tolerance.
    pub accuracy: Float,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Per-class accuracy averaged with per-class row counts as weights.
    /// `None` when no row could be scored.
    pub weighted_accuracy: Option<Float>,
    /// Sorted by `count` descending, then label.
    pub classes: Vec<ClassStats>,
    pub scored: usize,
    /// Rows whose true label did not appear in their prediction.
    pub dropped: usize,
}

/// Scores ranked predictions against the true labels.
///
/// For every row the rank of the true label within the prediction is looked
/// up; a row is a hit when `rank <= tolerance`. Rows whose true label is not
/// ranked at all (typically a class absent from training) are left out of
/// every statistic and only counted in [`Evaluation::dropped`].
///
/// The headline figure is row-weighted: classes with more validation rows
/// weigh more.
///
/// # Errors
///
/// - [`SpendcatError::ShapeMismatch`] if the slices differ in length.
pub fn evaluate(predictions: &[Ranking], truth: &[Label], tolerance: usize) -> Result<Evaluation> {
    if predictions.len() != truth.len() {
        return Err(SpendcatError::ShapeMismatch {
            expected: format!("{} true labels", predictions.len()),
            got: format!("{}", truth.len()),
        });
    }

    let mut ranks: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let mut dropped = 0;

    for (ranking, label) in predictions.iter().zip(truth) {
        match ranking.position(label) {
            Some(rank) => ranks.entry(label.as_str()).or_default().push(rank),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, "validation rows with labels unknown to the model were skipped");
    }

    let mut classes: Vec<ClassStats> = ranks
        .into_iter()
        .map(|(label, ranks)| {
            let places: Vec<Float> = ranks.iter().map(|&r| r as Float).collect();
            let hits = ranks.iter().filter(|&&r| r <= tolerance).count();
            ClassStats {
                label: label.to_string(),
                count: ranks.len(),
                place_q50: percentile(&places, 50.0).unwrap_or(0.0),
                accuracy: hits as Float / ranks.len() as Float,
            }
        })
        .collect();

    // labels arrive sorted from the BTreeMap, the stable sort keeps that for ties
    classes.sort_by(|a, b| b.count.cmp(&a.count));

    let accuracies: Vec<Float> = classes.iter().map(|c| c.accuracy).collect();
    let weights: Vec<Float> = classes.iter().map(|c| c.count as Float).collect();

    Ok(Evaluation {
        weighted_accuracy: weighted_mean(&accuracies, &weights),
        scored: classes.iter().map(|c| c.count).sum(),
        classes,
        dropped,
    })
}
