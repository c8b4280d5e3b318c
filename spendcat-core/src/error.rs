use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpendcatError {
    /// IO-related failures (file not found, unreadable, etc.)
    #[error("io error: {0}")]
    Io(String),

    /// Configuration file could not be parsed
    #[error("config error: {0}")]
    Config(String),

    /// Shape or dimensionality mismatch
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// A column holds a value of the wrong semantic type
    #[error("type mismatch in column `{column}`: expected {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: String,
        got: String,
    },

    /// Model used before calling `fit`
    #[error("model used before calling `fit`")]
    NotFitted,

    /// Fewer training rows than the caller requires
    #[error("insufficient training data: need at least {needed} rows, got {got}")]
    InsufficientTrainingData { needed: usize, got: usize },

    /// Invalid Hyperparameter Value
    #[error("invalid hyperparameter `{name}` = {value}")]
    InvalidHyperparameter { name: String, value: String },

    /// Invalid value
    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    /// Model state could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for SpendcatError {
    fn from(err: std::io::Error) -> Self {
        SpendcatError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SpendcatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_shape_mismatch() {
        let err = SpendcatError::ShapeMismatch {
            expected: "3 rows".into(),
            got: "2 rows".into(),
        };
        assert_eq!(err.to_string(), "shape mismatch: expected 3 rows, got 2 rows");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SpendcatError = io.into();
        assert!(matches!(err, SpendcatError::Io(ref msg) if msg.contains("missing")));
    }
}
