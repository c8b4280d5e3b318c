use serde::{Deserialize, Serialize};

pub type Float = f64;

/// Class label as it appears in the training data (e.g. `"groceries"`).
pub type Label = String;

/// Integer code assigned to a token or a label by a fitted dictionary.
pub type Code = i64;

/// Code used for tokens missing from the dictionary and for right padding.
pub const UNKNOWN_CODE: Code = -1;

pub type Matrix = nalgebra::DMatrix<Float>;
pub type TextMatrix = nalgebra::DMatrix<String>;
pub type CodeMatrix = nalgebra::DMatrix<Code>;

/// A list of `(name, score)` pairs sorted by descending score.
///
/// Returned by prediction (class label -> posterior score), by the prior table
/// (class label -> prior) and per class by the likelihood table
/// (token -> probability).
///
/// # Ordering
///
/// Entries are ordered by score, highest first. Equal scores keep the order in
/// which they were supplied to [`Ranking::from_scores`]; the models supply
/// entries in dictionary code order, so ties resolve alphabetically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    entries: Vec<(String, Float)>,
}

impl Ranking {
    /// Sorts `scores` descending with a stable sort and wraps them.
    ///
    /// `NaN` scores are ordered with [`f64::total_cmp`], which places positive
    /// `NaN` above every finite value.
    pub fn from_scores(mut scores: Vec<(String, Float)>) -> Self {
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { entries: scores }
    }

    /// Highest-scoring entry, or `None` for an empty ranking.
    pub fn top(&self) -> Option<(&str, Float)> {
        self.entries.first().map(|(name, score)| (name.as_str(), *score))
    }

    /// Zero-based rank of `name`, or `None` if it is not ranked.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<Float> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, score)| *score)
    }

    /// Sum of all scores.
    pub fn total(&self) -> Float {
        self.entries.iter().map(|(_, score)| score).sum()
    }

    /// Keeps only the `n` best entries.
    pub fn truncate(&mut self, n: usize) {
        self.entries.truncate(n);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Float)> {
        self.entries.iter().map(|(name, score)| (name.as_str(), *score))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_inner(self) -> Vec<(String, Float)> {
        self.entries
    }
}
