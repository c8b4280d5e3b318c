pub mod datasets;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod preprocessors;
pub mod service;
pub mod sources;

// Re-export public API
pub use spendcat_core::*;
pub use spendcat_models::{ModelState, NaiveBayes, TokenDictionary, encoder, naive_bayes};

pub use datasets::{Frame, Value};
pub use metrics::{Evaluation, evaluate};
pub use preprocessors::FieldBag;
pub use service::{CategoryPredictor, Prediction};
