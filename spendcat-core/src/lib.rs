pub mod config;
pub mod error;
pub mod stats;
pub mod types;
pub mod utils;

pub use types::{
    Code, CodeMatrix, Float, Label, Matrix, Ranking, TextMatrix, UNKNOWN_CODE,
};

pub use error::{Result, SpendcatError};

pub use config::{Config, EncoderConfig, EvaluationConfig, ServiceConfig};
