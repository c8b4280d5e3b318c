pub mod encoder;
pub mod naive_bayes;

pub use encoder::TokenDictionary;
pub use naive_bayes::{ModelState, NaiveBayes, SavedModel};
