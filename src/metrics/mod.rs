pub mod evaluation;

pub use evaluation::{ClassStats, Evaluation, evaluate};
