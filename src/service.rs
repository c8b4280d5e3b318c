//! Category prediction on top of an optional fitted model.
//!
//! [`CategoryPredictor`] owns at most one [`NaiveBayes`] model and answers
//! every query even when none is loaded: predictions fall back to the
//! configured "not available" label with zero confidence, and the prior and
//! likelihood listings come back empty.

use serde::Serialize;
use spendcat_core::{Float, Label, Matrix, Ranking, Result, ServiceConfig, SpendcatError, TextMatrix};
use spendcat_models::NaiveBayes;
use tracing::{debug, info};

use crate::datasets::Frame;
use crate::metrics::{Evaluation, evaluate};
use crate::sources::{CategoryVocabulary, TrainingSource};

/// Top label and confidence for every predicted row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Prediction {
    pub labels: Vec<Label>,
    /// `top score / sum of scores` per row, see [`confidence`].
    pub confidences: Vec<Float>,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Float)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.confidences.iter().copied())
    }
}

/// Relative confidence of the best class in a ranking.
///
/// This is the top score divided by the sum of all class scores. The scores
/// are un-normalized Naive-Bayes products, so the result is a relative share
/// among the known classes, not a calibrated probability. An empty ranking or
/// one whose scores all underflow to zero yields `0.0`.
pub fn confidence(ranking: &Ranking) -> Float {
    let total = ranking.total();
    match ranking.top() {
        Some((_, top)) if total > 0.0 => top / total,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPredictor {
    model: Option<NaiveBayes>,
    config: ServiceConfig,
}

impl CategoryPredictor {
    /// Creates a predictor without a model.
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            model: None,
            config,
        }
    }

    pub fn with_model(config: ServiceConfig, model: NaiveBayes) -> Self {
        Self {
            model: Some(model),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// `true` if a fitted model is loaded. An installed but unfitted model
    /// counts as no model.
    pub fn has_model(&self) -> bool {
        self.model().is_some()
    }

    /// The loaded model, if it is fitted.
    pub fn model(&self) -> Option<&NaiveBayes> {
        self.model.as_ref().filter(|m| m.is_fitted())
    }

    /// Installs `model`, returning the previous one.
    pub fn set_model(&mut self, model: NaiveBayes) -> Option<NaiveBayes> {
        info!(classes = model.classes().map_or(0, <[String]>::len), "model installed");
        self.model.replace(model)
    }

    pub fn take_model(&mut self) -> Option<NaiveBayes> {
        self.model.take()
    }

    /// Predicts the most likely category of every row.
    ///
    /// Without a model every row gets the "not available" label and zero
    /// confidence; this never fails.
    ///
    /// # Errors
    ///
    /// With a model, any error of [`NaiveBayes::predict`].
    pub fn predict(&self, text: &TextMatrix, numeric: &Matrix) -> Result<Prediction> {
        let Some(model) = self.model() else {
            let n = text.nrows();
            return Ok(Prediction {
                labels: vec![self.config.not_available_label.clone(); n],
                confidences: vec![0.0; n],
            });
        };

        let rankings = model.predict(text, numeric)?;
        let mut prediction = Prediction::default();

        for ranking in &rankings {
            let label = ranking
                .top()
                .map_or_else(|| self.config.not_available_label.clone(), |(l, _)| l.to_string());
            prediction.labels.push(label);
            prediction.confidences.push(confidence(ranking));
        }

        debug!(rows = prediction.len(), "predicted categories");
        Ok(prediction)
    }

    /// Predicts every row of a frame, ignoring its date columns and the
    /// configured target column if present.
    pub fn predict_frame(&self, frame: &Frame) -> Result<Prediction> {
        if !self.has_model() {
            let n = frame.len();
            return Ok(Prediction {
                labels: vec![self.config.not_available_label.clone(); n],
                confidences: vec![0.0; n],
            });
        }

        let features = frame.features(&self.feature_exclusions(frame))?;
        self.predict(&features.text, &features.numeric)
    }

    /// Trains a new model on the labelled rows of `frame` and installs it.
    ///
    /// Rows without a category or with the "not available" label are
    /// ignored. The current model stays in place if training fails.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::InsufficientTrainingData`] if fewer than
    ///   `min_training_rows` labelled rows remain.
    /// - Any error of [`Frame::features`], [`Frame::labels`] or [`NaiveBayes::fit`].
    pub fn train(&mut self, frame: &Frame, mut model: NaiveBayes) -> Result<()> {
        let target = self.config.target_column.as_str();
        let labelled = frame.labelled(target, &self.config.not_available_label)?;

        if labelled.len() < self.config.min_training_rows {
            return Err(SpendcatError::InsufficientTrainingData {
                needed: self.config.min_training_rows,
                got: labelled.len(),
            });
        }

        let features = labelled.features(&[target])?;
        let labels = labelled.labels(target)?;

        model.fit(&features.text, &features.numeric, &labels)?;

        info!(
            rows = labelled.len(),
            skipped = frame.len() - labelled.len(),
            "trained category model"
        );
        self.model = Some(model);
        Ok(())
    }

    /// Pulls a frame from `source` and [`train`](Self::train)s on it.
    pub fn train_from<S: TrainingSource>(&mut self, source: &S, model: NaiveBayes) -> Result<()> {
        let frame = source.training_frame()?;
        self.train(&frame, model)
    }

    /// Class priors of the loaded model, or an empty ranking.
    pub fn priors(&self) -> Ranking {
        self.model()
            .and_then(|m| m.get_priors().ok())
            .unwrap_or_default()
    }

    /// The `top_n` most likely tokens per class (the configured default when
    /// `None`), or nothing without a model.
    pub fn likelihoods(&self, top_n: Option<usize>) -> Vec<(Label, Ranking)> {
        let n = top_n.unwrap_or(self.config.likelihood_top_n);
        self.model()
            .and_then(|m| m.get_likelihoods(Some(n)).ok())
            .unwrap_or_default()
    }

    /// Evaluates the loaded model on the labelled rows of `frame`.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::NotFitted`] without a model.
    /// - Any error of [`Frame::features`], [`Frame::labels`],
    ///   [`NaiveBayes::predict`] or [`evaluate`].
    pub fn validate(&self, frame: &Frame, tolerance: usize) -> Result<Evaluation> {
        let model = self.model().ok_or(SpendcatError::NotFitted)?;
        let target = self.config.target_column.as_str();

        let labelled = frame.labelled(target, &self.config.not_available_label)?;
        let features = labelled.features(&[target])?;
        let truth = labelled.labels(target)?;

        let rankings = model.predict(&features.text, &features.numeric)?;
        evaluate(&rankings, &truth, tolerance)
    }

    /// Labels to offer for manual categorization: the canonical list from
    /// `vocabulary`, followed by any label the model knows that is missing
    /// from it.
    pub fn label_choices<V: CategoryVocabulary + ?Sized>(&self, vocabulary: &V) -> Vec<Label> {
        let mut choices = vocabulary.categories();
        if let Some(classes) = self.model().and_then(NaiveBayes::classes) {
            for class in classes {
                if !choices.contains(class) {
                    choices.push(class.clone());
                }
            }
        }
        choices
    }

    fn feature_exclusions<'a>(&'a self, frame: &Frame) -> Vec<&'a str> {
        let target = self.config.target_column.as_str();
        if frame.columns().iter().any(|c| c == target) {
            vec![target]
        } else {
            Vec::new()
        }
    }
}
