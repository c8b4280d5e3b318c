use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use spendcat_core::{
    Code, CodeMatrix, EncoderConfig, Float, Label, Matrix, Ranking, Result, SpendcatError,
    TextMatrix, UNKNOWN_CODE,
};
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::encoder::{TokenDictionary, encode_rows, merge_features, tokenize_rows};

/// Tolerance used when checking that restored priors sum to one.
const PRIOR_SUM_TOLERANCE: Float = 1e-6;

/// Everything a fitted [`NaiveBayes`] knows.
///
/// Class codes index `priors` and the outer `likelihoods` vector; token codes
/// index the inner vectors. Every class therefore holds a probability for every
/// token of the vocabulary, including tokens it never saw during training.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    /// Token dictionary over all training tokens (text and amount buckets).
    pub features: TokenDictionary,
    /// Dictionary over the distinct training labels.
    pub labels: TokenDictionary,
    /// Number of numeric columns seen during training.
    pub numeric_columns: usize,
    /// `priors[class]` = share of training rows with that class.
    pub priors: Vec<Float>,
    /// `likelihoods[class][token]` = smoothed P(token in row | class).
    pub likelihoods: Vec<Vec<Float>>,
}

impl ModelState {
    /// Likelihood of `code` under `class`; `None` for codes outside the
    /// vocabulary (unknown tokens and padding).
    fn likelihood(&self, class: usize, code: Code) -> Option<Float> {
        usize::try_from(code)
            .ok()
            .and_then(|token| self.likelihoods[class].get(token))
            .copied()
    }

    /// Un-normalized posterior score of every class for one encoded row.
    fn score_row(&self, row: &[Code]) -> Ranking {
        let scores = self
            .labels
            .tokens()
            .iter()
            .enumerate()
            .map(|(class, label)| {
                let log_likelihood: Float = row
                    .iter()
                    .filter_map(|&code| self.likelihood(class, code))
                    .map(Float::ln)
                    .sum();
                let log_posterior = log_likelihood + self.priors[class].ln();
                (label.clone(), log_posterior.exp())
            })
            .collect();

        Ranking::from_scores(scores)
    }

    fn validate(&self) -> Result<()> {
        if !self.features.is_consistent() || !self.labels.is_consistent() {
            return Err(SpendcatError::InvalidValue {
                message: "dictionary contains duplicate tokens".into(),
            });
        }

        let n_classes = self.labels.len();
        if n_classes == 0 {
            return Err(SpendcatError::InvalidValue {
                message: "model state has no classes".into(),
            });
        }

        if self.priors.len() != n_classes || self.likelihoods.len() != n_classes {
            return Err(SpendcatError::ShapeMismatch {
                expected: format!("{} classes", n_classes),
                got: format!(
                    "{} priors and {} likelihood tables",
                    self.priors.len(),
                    self.likelihoods.len()
                ),
            });
        }

        let vocabulary = self.features.len();
        if let Some(table) = self.likelihoods.iter().find(|t| t.len() != vocabulary) {
            return Err(SpendcatError::ShapeMismatch {
                expected: format!("{} likelihoods per class", vocabulary),
                got: format!("{}", table.len()),
            });
        }

        let in_unit_interval = |p: &Float| *p > 0.0 && *p <= 1.0;
        if !self.priors.iter().all(in_unit_interval)
            || !self.likelihoods.iter().flatten().all(in_unit_interval)
        {
            return Err(SpendcatError::InvalidValue {
                message: "probabilities must lie in (0, 1]".into(),
            });
        }

        let total: Float = self.priors.iter().sum();
        if (total - 1.0).abs() > PRIOR_SUM_TOLERANCE {
            return Err(SpendcatError::InvalidValue {
                message: format!("priors sum to {}, expected 1", total),
            });
        }

        Ok(())
    }
}

/// **Categorical Naive Bayes** over bags of tokens.
///
/// Each row is reduced to a bag of tokens: the words of its text columns plus
/// two synthetic tokens per numeric column (an amount bucket and a cash-flow
/// sign, see [`crate::encoder::bucketize`]). The model learns
///
/// ```text
/// P(class)                      = rows of class / rows
/// P(token present | class)      = (rows of class containing token + 1) / (rows of class + 1)
/// ```
///
/// and scores a new row as
///
/// ```text
/// score(class) = exp( ln P(class) + Σ_token ln P(token | class) )
/// ```
///
/// where the sum runs over every token occurrence in the row that is part of
/// the training vocabulary. Tokens never seen during training contribute no
/// factor. Scores are not normalized across classes.
///
/// # State
///
/// The model is either unfitted or fitted. [`fit`](NaiveBayes::fit) replaces
/// the whole state at once and leaves the model untouched when it fails.
/// Concurrent `fit` and `predict` calls on one instance are prevented by the
/// `&mut self` receiver of `fit`.
///
/// # Errors
///
/// - [`SpendcatError::ShapeMismatch`] if inputs disagree on the row count,
///   the label list is empty, or prediction input has a different number of
///   numeric columns than the training input.
/// - [`SpendcatError::InvalidValue`] if an amount is `NaN`.
/// - [`SpendcatError::NotFitted`] if the model is queried before fitting.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SavedModel"))]
#[derive(Debug, Clone, Default)]
pub struct NaiveBayes {
    /// Amount bucket boundaries, fixed for the lifetime of a fitted state.
    config: EncoderConfig,
    /// `None` until the first successful fit.
    state: Option<ModelState>,
}

impl NaiveBayes {
    /// Creates a new, unfitted model with the default amount buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, unfitted model with custom amount buckets.
    pub fn with_config(config: EncoderConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Restores a fitted model from a previously exported [`ModelState`]
    /// without recomputing anything.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::InvalidHyperparameter`] for invalid bucket bounds.
    /// - [`SpendcatError::ShapeMismatch`] if the tables do not match the dictionaries.
    /// - [`SpendcatError::InvalidValue`] for duplicate tokens, an empty label set,
    ///   probabilities outside `(0, 1]`, or priors that do not sum to one.
    pub fn from_state(config: EncoderConfig, state: ModelState) -> Result<Self> {
        config.validate()?;
        state.validate()?;

        Ok(Self {
            config,
            state: Some(state),
        })
    }

    /// Fits the model on string features, numeric features and labels.
    ///
    /// # Parameters
    ///
    /// - `text`: String features of shape `(n × t)`; `t` may be zero.
    /// - `numeric`: Numeric features of shape `(n × d)`; `d` may be zero.
    /// - `labels`: Class label of every row, length `n > 0`.
    ///
    /// # Algorithm
    ///
    /// 1. Validate shapes and values before touching any state.
    /// 2. Bucketize numeric columns and append them to the text columns.
    /// 3. Tokenize every row; build the feature dictionary from all tokens and
    ///    the label dictionary from the distinct labels.
    /// 4. Encode rows into a padded code matrix and labels into class codes.
    /// 5. Priors: `count(class) / n`.
    /// 6. Likelihoods: for every class and every vocabulary token,
    ///    `(rows of class containing token + 1) / (rows of class + 1)`.
    ///    A token repeated within a row counts once.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::ShapeMismatch`] if `labels` is empty or row counts differ.
    /// - [`SpendcatError::InvalidValue`] if `numeric` contains `NaN`.
    /// - [`SpendcatError::InvalidHyperparameter`] for invalid bucket bounds.
    ///
    /// # Complexity
    ///
    /// Let `n` = rows, `w` = tokens in the longest row, `k` = classes and
    /// `v` = vocabulary size:
    /// - Time: `O(n w + k v)`
    /// - Space: `O(n w + k v)`
    pub fn fit(&mut self, text: &TextMatrix, numeric: &Matrix, labels: &[Label]) -> Result<()> {
        let n = labels.len();

        if n == 0 {
            return Err(SpendcatError::ShapeMismatch {
                expected: "at least one labelled row".into(),
                got: "0 rows".into(),
            });
        }
        if text.nrows() != n {
            return Err(SpendcatError::ShapeMismatch {
                expected: format!("{} text rows", n),
                got: format!("{}", text.nrows()),
            });
        }
        if numeric.nrows() != n {
            return Err(SpendcatError::ShapeMismatch {
                expected: format!("{} numeric rows", n),
                got: format!("{}", numeric.nrows()),
            });
        }
        self.config.validate()?;

        let merged = merge_features(text, numeric, &self.config)?;
        let rows = tokenize_rows(&merged);

        let features = TokenDictionary::build(rows.iter().flatten());
        let label_dict = TokenDictionary::build(labels);

        let x = encode_rows(&rows, &features);
        let y: Vec<usize> = labels
            .iter()
            .map(|label| label_dict.encode(label) as usize)
            .collect();

        debug!(
            rows = n,
            width = x.ncols(),
            vocabulary = features.len(),
            classes = label_dict.len(),
            "encoded training data"
        );

        let priors = compute_priors(&y, label_dict.len());
        let likelihoods = compute_likelihoods(&x, &y, label_dict.len(), features.len());

        info!(
            rows = n,
            classes = label_dict.len(),
            vocabulary = features.len(),
            "fitted naive bayes model"
        );

        self.state = Some(ModelState {
            features,
            labels: label_dict,
            numeric_columns: numeric.ncols(),
            priors,
            likelihoods,
        });

        Ok(())
    }

    /// Scores every row against every class.
    ///
    /// Rows are encoded with the dictionaries of the fitted state. Tokens
    /// outside the vocabulary are ignored; repeated tokens contribute once per
    /// occurrence.
    ///
    /// # Returns
    ///
    /// One [`Ranking`] per row mapping every class label to its un-normalized
    /// posterior score, highest first. Equal scores are ordered by label.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::NotFitted`] if the model has not been fitted.
    /// - [`SpendcatError::ShapeMismatch`] if row counts differ or the number of
    ///   numeric columns differs from training.
    /// - [`SpendcatError::InvalidValue`] if `numeric` contains `NaN`.
    ///
    /// # Complexity
    ///
    /// - Time: `O(n w k)` for `n` rows of at most `w` tokens and `k` classes.
    pub fn predict(&self, text: &TextMatrix, numeric: &Matrix) -> Result<Vec<Ranking>> {
        let state = self.state.as_ref().ok_or(SpendcatError::NotFitted)?;

        if text.nrows() != numeric.nrows() {
            return Err(SpendcatError::ShapeMismatch {
                expected: format!("{} numeric rows", text.nrows()),
                got: format!("{}", numeric.nrows()),
            });
        }
        if text.nrows() == 0 {
            return Ok(Vec::new());
        }
        if numeric.ncols() != state.numeric_columns {
            return Err(SpendcatError::ShapeMismatch {
                expected: format!("{} numeric columns", state.numeric_columns),
                got: format!("{}", numeric.ncols()),
            });
        }

        let merged = merge_features(text, numeric, &self.config)?;
        let x = encode_rows(&tokenize_rows(&merged), &state.features);
        let rows: Vec<Vec<Code>> = x
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();

        #[cfg(feature = "parallel")]
        let rankings = rows.par_iter().map(|row| state.score_row(row)).collect();

        #[cfg(not(feature = "parallel"))]
        let rankings = rows.iter().map(|row| state.score_row(row)).collect();

        Ok(rankings)
    }

    /// Class priors, highest first.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::NotFitted`] if the model has not been fitted.
    pub fn get_priors(&self) -> Result<Ranking> {
        let state = self.state.as_ref().ok_or(SpendcatError::NotFitted)?;

        Ok(Ranking::from_scores(
            state
                .labels
                .tokens()
                .iter()
                .cloned()
                .zip(state.priors.iter().copied())
                .collect(),
        ))
    }

    /// Token likelihoods per class.
    ///
    /// Classes are listed in prior order; within a class tokens are sorted by
    /// probability, highest first. Without `top_n` every class lists the whole
    /// vocabulary.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::NotFitted`] if the model has not been fitted.
    pub fn get_likelihoods(&self, top_n: Option<usize>) -> Result<Vec<(Label, Ranking)>> {
        let state = self.state.as_ref().ok_or(SpendcatError::NotFitted)?;

        let tables = self
            .get_priors()?
            .names()
            .map(|label| {
                let class = state.labels.encode(label) as usize;
                let mut ranking = Ranking::from_scores(
                    state
                        .features
                        .tokens()
                        .iter()
                        .cloned()
                        .zip(state.likelihoods[class].iter().copied())
                        .collect(),
                );
                if let Some(n) = top_n {
                    ranking.truncate(n);
                }
                (label.to_string(), ranking)
            })
            .collect();

        Ok(tables)
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// The fitted state, for persistence.
    pub fn state(&self) -> Option<&ModelState> {
        self.state.as_ref()
    }

    /// Class labels in code order, or `None` before fitting.
    pub fn classes(&self) -> Option<&[String]> {
        self.state.as_ref().map(|s| s.labels.tokens())
    }

    pub fn encoder_config(&self) -> &EncoderConfig {
        &self.config
    }
}

/// Unchecked fields of a persisted [`NaiveBayes`].
///
/// Deserialized models always pass through [`NaiveBayes::try_from`], which
/// applies the same checks as [`NaiveBayes::from_state`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct SavedModel {
    pub config: EncoderConfig,
    pub state: Option<ModelState>,
}

impl TryFrom<SavedModel> for NaiveBayes {
    type Error = SpendcatError;

    fn try_from(saved: SavedModel) -> Result<Self> {
        match saved.state {
            Some(state) => Self::from_state(saved.config, state),
            None => {
                saved.config.validate()?;
                Ok(Self::with_config(saved.config))
            }
        }
    }
}

fn compute_priors(y: &[usize], n_classes: usize) -> Vec<Float> {
    let mut counts = vec![0usize; n_classes];
    for &class in y {
        counts[class] += 1;
    }

    let events = y.len() as Float;
    counts.into_iter().map(|c| c as Float / events).collect()
}

/// Counts, per class, the rows containing each token at least once and turns
/// the counts into Laplace-smoothed probabilities over the full vocabulary.
fn compute_likelihoods(
    x: &CodeMatrix,
    y: &[usize],
    n_classes: usize,
    vocabulary: usize,
) -> Vec<Vec<Float>> {
    let mut present = vec![vec![0usize; vocabulary]; n_classes];
    let mut events = vec![0usize; n_classes];
    let mut seen: HashSet<Code> = HashSet::new();

    for (row, &class) in x.row_iter().zip(y) {
        events[class] += 1;
        seen.clear();

        for &code in row.iter() {
            if code != UNKNOWN_CODE && seen.insert(code) {
                present[class][code as usize] += 1;
            }
        }
    }

    present
        .into_iter()
        .zip(events)
        .map(|(counts, events)| {
            let denominator = (events + 1) as Float;
            counts
                .into_iter()
                .map(|c| (c + 1) as Float / denominator)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendcat_core::utils::{numeric_matrix, text_matrix};

    fn labels(values: &[&str]) -> Vec<Label> {
        values.iter().map(|s| s.to_string()).collect()
    }

    /// Five transactions with class-specific receiver tokens.
    fn separable() -> (TextMatrix, Matrix, Vec<Label>) {
        let text = text_matrix(vec![
            vec!["Starbucks Coffee"],
            vec!["Coffee House"],
            vec!["Rent Payment"],
            vec!["Landlord Rent"],
            vec!["Salary ACME"],
        ])
        .unwrap();
        let numeric =
            numeric_matrix(vec![vec![4.5], vec![3.2], vec![-900.0], vec![-850.0], vec![3000.0]])
                .unwrap();
        let y = labels(&["cafe", "cafe", "housing", "housing", "income"]);
        (text, numeric, y)
    }

    fn fitted() -> NaiveBayes {
        let (text, numeric, y) = separable();
        let mut nb = NaiveBayes::new();
        nb.fit(&text, &numeric, &y).unwrap();
        nb
    }

    #[test]
    fn test_naive_bayes_new_is_unfitted() {
        let nb = NaiveBayes::new();
        assert!(!nb.is_fitted());
        assert!(nb.state().is_none());
        assert!(nb.classes().is_none());
    }

    #[test]
    fn test_predict_not_fitted() {
        let nb = NaiveBayes::new();
        let text = text_matrix(vec![vec!["anything"]]).unwrap();
        let numeric = numeric_matrix(vec![vec![1.0]]).unwrap();
        assert!(matches!(
            nb.predict(&text, &numeric),
            Err(SpendcatError::NotFitted)
        ));
        assert!(matches!(nb.get_priors(), Err(SpendcatError::NotFitted)));
        assert!(matches!(
            nb.get_likelihoods(None),
            Err(SpendcatError::NotFitted)
        ));
    }

    #[test]
    fn test_fit_empty_labels() {
        let mut nb = NaiveBayes::new();
        let text = text_matrix::<&str>(vec![]).unwrap();
        let numeric = numeric_matrix(vec![]).unwrap();
        let result = nb.fit(&text, &numeric, &[]);
        assert!(matches!(result, Err(SpendcatError::ShapeMismatch { .. })));
        assert!(!nb.is_fitted());
    }

    #[test]
    fn test_fit_row_count_mismatch() {
        let mut nb = NaiveBayes::new();
        let text = text_matrix(vec![vec!["a"], vec!["b"]]).unwrap();
        let numeric = numeric_matrix(vec![vec![1.0], vec![2.0]]).unwrap();
        let result = nb.fit(&text, &numeric, &labels(&["x"]));
        assert!(matches!(result, Err(SpendcatError::ShapeMismatch { .. })));

        let numeric = numeric_matrix(vec![vec![1.0]]).unwrap();
        let result = nb.fit(&text, &numeric, &labels(&["x", "y"]));
        assert!(matches!(result, Err(SpendcatError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_failed_fit_keeps_previous_state() {
        let mut nb = fitted();
        let before = nb.state().cloned();

        let text = text_matrix(vec![vec!["broken"]]).unwrap();
        let numeric = numeric_matrix(vec![vec![f64::NAN]]).unwrap();
        let result = nb.fit(&text, &numeric, &labels(&["x"]));

        assert!(matches!(result, Err(SpendcatError::InvalidValue { .. })));
        assert_eq!(nb.state().cloned(), before);
    }

    #[test]
    fn test_priors_sum_to_one() {
        let nb = fitted();
        let priors = nb.get_priors().unwrap();
        assert!((priors.total() - 1.0).abs() < 1e-12);
        assert_eq!(priors.top(), Some(("cafe", 0.4)));
        assert_eq!(priors.get("income"), Some(0.2));
    }

    #[test]
    fn test_priors_sorted_then_alphabetical() {
        let nb = fitted();
        let names: Vec<String> = nb
            .get_priors()
            .unwrap()
            .names()
            .map(str::to_string)
            .collect();
        assert_eq!(names, vec!["cafe", "housing", "income"]);
    }

    #[test]
    fn test_likelihoods_cover_full_vocabulary() {
        let nb = fitted();
        let vocabulary = nb.state().unwrap().features.tokens().to_vec();
        let tables = nb.get_likelihoods(None).unwrap();

        assert_eq!(tables.len(), 3);
        for (_, table) in &tables {
            assert_eq!(table.len(), vocabulary.len());
            for token in &vocabulary {
                assert!(table.get(token).is_some(), "missing {}", token);
            }
        }
    }

    #[test]
    fn test_likelihood_smoothing_values() {
        let nb = fitted();
        let tables = nb.get_likelihoods(None).unwrap();
        let cafe = &tables.iter().find(|(l, _)| l == "cafe").unwrap().1;

        // 2 cafe rows: "coffee" in both, "starbucks" in one, "rent" in none
        assert!((cafe.get("coffee").unwrap() - 1.0).abs() < 1e-12);
        assert!((cafe.get("starbucks").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cafe.get("rent").unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((cafe.get("smallamount").unwrap() - 1.0).abs() < 1e-12);
        assert!((cafe.get("negativecashflow").unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_token_counts_once_per_row() {
        let text = text_matrix(vec![vec!["coffee coffee coffee"], vec!["tea"]]).unwrap();
        let numeric = Matrix::zeros(2, 0);
        let mut nb = NaiveBayes::new();
        nb.fit(&text, &numeric, &labels(&["drinks", "drinks"])).unwrap();

        let tables = nb.get_likelihoods(None).unwrap();
        let drinks = &tables[0].1;
        assert!((drinks.get("coffee").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((drinks.get("tea").unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_likelihoods_top_n() {
        let nb = fitted();
        let tables = nb.get_likelihoods(Some(2)).unwrap();
        for (_, table) in &tables {
            assert_eq!(table.len(), 2);
            let scores: Vec<Float> = table.iter().map(|(_, s)| s).collect();
            assert!(scores[0] >= scores[1]);
        }
    }

    #[test]
    fn test_training_row_ranks_true_class_first() {
        let (text, numeric, y) = separable();
        let nb = fitted();
        let predictions = nb.predict(&text, &numeric).unwrap();

        assert_eq!(predictions.len(), y.len());
        for (ranking, label) in predictions.iter().zip(&y) {
            assert_eq!(ranking.position(label), Some(0));
            assert_eq!(ranking.len(), 3);
        }
    }

    #[test]
    fn test_predicted_scores_match_formula() {
        let nb = fitted();
        let text = text_matrix(vec![vec!["Starbucks Coffee"]]).unwrap();
        let numeric = numeric_matrix(vec![vec![4.5]]).unwrap();
        let ranking = &nb.predict(&text, &numeric).unwrap()[0];

        // starbucks 2/3, coffee 1, smallamount 1, positivecashflow 1, prior 2/5
        let expected_cafe = (2.0 / 3.0) * 0.4;
        assert!((ranking.get("cafe").unwrap() - expected_cafe).abs() < 1e-12);
        // income: 1/2 for each unseen token, positivecashflow 1, prior 1/5
        let expected_income = 0.5 * 0.5 * 0.5 * 1.0 * 0.2;
        assert!((ranking.get("income").unwrap() - expected_income).abs() < 1e-12);
    }

    #[test]
    #[cfg(feature = "parallel")]
    fn test_parallel_predict_matches_serial_scoring() {
        let nb = fitted();
        let receivers = ["Starbucks Coffee", "Landlord Rent", "Salary ACME", "zzz"];
        let amounts = [4.5, -900.0, 3000.0, 0.0];

        let text = text_matrix((0..512).map(|i| vec![receivers[i % 4]]).collect()).unwrap();
        let numeric = numeric_matrix((0..512).map(|i| vec![amounts[i % 4]]).collect()).unwrap();
        let predictions = nb.predict(&text, &numeric).unwrap();
        assert_eq!(predictions.len(), 512);

        let expected_cafe = (2.0 / 3.0) * 0.4;
        let expected_tops = ["cafe", "housing", "income"];
        let state = nb.state().unwrap();
        let merged = merge_features(&text, &numeric, nb.encoder_config()).unwrap();
        let x = encode_rows(&tokenize_rows(&merged), &state.features);

        for (i, ranking) in predictions.iter().enumerate() {
            let row: Vec<Code> = x.row(i).iter().copied().collect();
            assert_eq!(ranking, &state.score_row(&row));
            if i % 4 == 0 {
                assert!((ranking.get("cafe").unwrap() - expected_cafe).abs() < 1e-12);
            }
            if i % 4 < 3 {
                assert_eq!(ranking.top().unwrap().0, expected_tops[i % 4]);
            }
        }
    }

    #[test]
    fn test_unknown_tokens_are_skipped() {
        let nb = fitted();
        let text = text_matrix(vec![vec!["zzz qqq"]]).unwrap();
        let numeric = Matrix::zeros(1, 1);
        let ranking = &nb.predict(&text, &numeric).unwrap()[0];

        // only the amount tokens contribute: smallamount + positivecashflow
        let expected_housing = (1.0 / 3.0) * (1.0 / 3.0) * 0.4;
        assert!((ranking.get("housing").unwrap() - expected_housing).abs() < 1e-12);
    }

    #[test]
    fn test_predict_numeric_column_mismatch() {
        let nb = fitted();
        let text = text_matrix(vec![vec!["coffee"]]).unwrap();
        let numeric = numeric_matrix(vec![vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            nb.predict(&text, &numeric),
            Err(SpendcatError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_predict_zero_rows() {
        let nb = fitted();
        let text = text_matrix::<&str>(vec![]).unwrap();
        let numeric = Matrix::zeros(0, 1);
        assert!(nb.predict(&text, &numeric).unwrap().is_empty());
    }

    #[test]
    fn test_all_numeric_training_set() {
        let text = TextMatrix::from_element(4, 0, String::new());
        let numeric =
            numeric_matrix(vec![vec![-5.0], vec![-8.0], vec![2500.0], vec![3100.0]]).unwrap();
        let y = labels(&["snacks", "snacks", "salary", "salary"]);

        let mut nb = NaiveBayes::new();
        nb.fit(&text, &numeric, &y).unwrap();

        let query = TextMatrix::from_element(1, 0, String::new());
        let ranking = &nb
            .predict(&query, &numeric_matrix(vec![vec![4000.0]]).unwrap())
            .unwrap()[0];
        assert_eq!(ranking.top().unwrap().0, "salary");
    }

    #[test]
    fn test_tied_scores_ordered_by_label() {
        let text = text_matrix(vec![vec!["x"], vec!["x"]]).unwrap();
        let numeric = Matrix::zeros(2, 0);
        let mut nb = NaiveBayes::new();
        nb.fit(&text, &numeric, &labels(&["zeta", "alpha"])).unwrap();

        let ranking = &nb.predict(&text, &numeric).unwrap()[0];
        let names: Vec<&str> = ranking.names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_refit_replaces_state() {
        let mut nb = fitted();

        let text = text_matrix(vec![vec!["Gym Membership"], vec!["Cinema"]]).unwrap();
        let numeric = numeric_matrix(vec![vec![-30.0], vec![-12.0]]).unwrap();
        nb.fit(&text, &numeric, &labels(&["sports", "leisure"])).unwrap();

        let tables = nb.get_likelihoods(None).unwrap();
        let classes: Vec<&str> = tables.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(classes.len(), 2);
        assert!(!classes.contains(&"cafe"));

        for (_, table) in &tables {
            assert!(table.get("coffee").is_none());
            assert!(table.get("starbucks").is_none());
            assert!(table.get("gym").is_some());
        }
    }

    #[test]
    fn test_from_state_restores_predictions() {
        let nb = fitted();
        let state = nb.state().cloned().unwrap();
        let restored = NaiveBayes::from_state(*nb.encoder_config(), state).unwrap();

        let (text, numeric, _) = separable();
        assert_eq!(
            nb.predict(&text, &numeric).unwrap(),
            restored.predict(&text, &numeric).unwrap()
        );
    }

    #[test]
    fn test_from_state_rejects_inconsistent_tables() {
        let nb = fitted();

        let mut state = nb.state().cloned().unwrap();
        state.likelihoods[0].pop();
        assert!(matches!(
            NaiveBayes::from_state(EncoderConfig::default(), state),
            Err(SpendcatError::ShapeMismatch { .. })
        ));

        let mut state = nb.state().cloned().unwrap();
        state.priors[0] = 0.9;
        assert!(matches!(
            NaiveBayes::from_state(EncoderConfig::default(), state),
            Err(SpendcatError::InvalidValue { .. })
        ));
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_naive_bayes_serialize_deserialize_json() {
        let nb = fitted();

        let serialized = serde_json::to_string(&nb).expect("Failed to serialize");
        let deserialized: NaiveBayes =
            serde_json::from_str(&serialized).expect("Failed to deserialize");

        assert_eq!(nb.state(), deserialized.state());

        let (text, numeric, _) = separable();
        assert_eq!(
            nb.predict(&text, &numeric).unwrap(),
            deserialized.predict(&text, &numeric).unwrap()
        );
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_naive_bayes_deserialize_rejects_tampered_state() {
        let nb = fitted();

        let mut value = serde_json::to_value(&nb).unwrap();
        value["state"]["priors"] = serde_json::json!([1.0]);
        assert!(serde_json::from_value::<NaiveBayes>(value).is_err());

        let mut value = serde_json::to_value(&nb).unwrap();
        value["config"]["small_amount_below"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<NaiveBayes>(value).is_err());
    }

    #[test]
    fn test_try_from_saved_model() {
        let nb = fitted();
        let mut state = nb.state().cloned().unwrap();
        state.priors.truncate(1);

        let saved = SavedModel {
            config: EncoderConfig::default(),
            state: Some(state),
        };
        assert!(matches!(
            NaiveBayes::try_from(saved),
            Err(SpendcatError::ShapeMismatch { .. })
        ));

        let unfitted = NaiveBayes::try_from(SavedModel::default()).unwrap();
        assert!(!unfitted.is_fitted());
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_naive_bayes_serialize_unfitted() {
        let nb = NaiveBayes::new();
        let serialized = serde_json::to_string(&nb).expect("Failed to serialize");
        let deserialized: NaiveBayes =
            serde_json::from_str(&serialized).expect("Failed to deserialize");
        assert!(!deserialized.is_fitted());
    }
}
