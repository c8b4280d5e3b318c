use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use spendcat_core::{
    Code, CodeMatrix, EncoderConfig, Matrix, Result, SpendcatError, TextMatrix, UNKNOWN_CODE,
};

pub const SMALL_AMOUNT: &str = "smallAmount";
pub const MEDIUM_AMOUNT: &str = "mediumAmount";
pub const LARGE_AMOUNT: &str = "largeAmount";
pub const POSITIVE_CASHFLOW: &str = "positiveCashflow";
pub const NEGATIVE_CASHFLOW: &str = "negativeCashflow";

/// Runs of `.`, `;`, `,`, `_`, `*`, `-` and whitespace separate tokens.
static TOKEN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.;,_*\s-]+").expect("static regex"));

/// Magnitude bucket of a single amount.
pub fn magnitude_token(value: f64, config: &EncoderConfig) -> &'static str {
    let magnitude = value.abs();
    if magnitude >= config.large_amount_from {
        LARGE_AMOUNT
    } else if magnitude < config.small_amount_below {
        SMALL_AMOUNT
    } else {
        MEDIUM_AMOUNT
    }
}

/// Sign bucket of a single amount. Zero counts as positive.
pub fn sign_token(value: f64) -> &'static str {
    if value >= 0.0 {
        POSITIVE_CASHFLOW
    } else {
        NEGATIVE_CASHFLOW
    }
}

/// Turns every numeric column into two text columns of bucket tokens.
///
/// For an `(n × d)` input the output is `(n × 2d)`: the `d` magnitude
/// columns first, then the `d` sign columns.
///
/// # Errors
///
/// - [`SpendcatError::InvalidValue`] if a value is `NaN` (it has no bucket).
pub fn bucketize(numeric: &Matrix, config: &EncoderConfig) -> Result<TextMatrix> {
    let n = numeric.nrows();
    let d = numeric.ncols();

    if let Some((i, j)) = (0..n)
        .flat_map(|i| (0..d).map(move |j| (i, j)))
        .find(|&(i, j)| numeric[(i, j)].is_nan())
    {
        return Err(SpendcatError::InvalidValue {
            message: format!("NaN amount at row {}, column {}", i, j),
        });
    }

    Ok(TextMatrix::from_fn(n, 2 * d, |i, j| {
        if j < d {
            magnitude_token(numeric[(i, j)], config).to_string()
        } else {
            sign_token(numeric[(i, j - d)]).to_string()
        }
    }))
}

/// Appends the bucketized numeric columns to the text columns.
///
/// # Errors
///
/// - [`SpendcatError::ShapeMismatch`] if the row counts differ.
/// - [`SpendcatError::InvalidValue`] from [`bucketize`].
pub fn merge_features(
    text: &TextMatrix,
    numeric: &Matrix,
    config: &EncoderConfig,
) -> Result<TextMatrix> {
    if text.nrows() != numeric.nrows() {
        return Err(SpendcatError::ShapeMismatch {
            expected: format!("{} numeric rows", text.nrows()),
            got: format!("{} numeric rows", numeric.nrows()),
        });
    }

    let buckets = bucketize(numeric, config)?;
    let t = text.ncols();

    Ok(TextMatrix::from_fn(text.nrows(), t + buckets.ncols(), |i, j| {
        if j < t {
            text[(i, j)].clone()
        } else {
            buckets[(i, j - t)].clone()
        }
    }))
}

/// Splits the cells of one row into lower-case tokens.
///
/// Cells are joined with a single space, lower-cased and split on runs of
/// separator characters. Empty fragments and fragments made only of ASCII
/// digits are dropped (fractions such as `½` stay); the remaining tokens keep their left-to-right order.
///
/// ```rust
/// use spendcat_models::encoder::tokenize;
///
/// assert_eq!(
///     tokenize(["Coffee-Shop_123, Helsinki"]),
///     vec!["coffee", "shop", "helsinki"],
/// );
/// ```
pub fn tokenize<'a, I>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = cells.into_iter().collect::<Vec<_>>().join(" ").to_lowercase();

    TOKEN_SEPARATOR
        .split(&joined)
        .filter(|word| !word.is_empty() && !word.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

/// Tokenizes every row of a text matrix.
pub fn tokenize_rows(text: &TextMatrix) -> Vec<Vec<String>> {
    text.row_iter()
        .map(|row| tokenize(row.iter().map(String::as_str)))
        .collect()
}

/// Bijective mapping between tokens and integer codes `0..len`.
///
/// Codes are assigned in sorted token order, so building twice from the same
/// token set gives the same codes. Callers should still treat codes as opaque:
/// only the mapping of one dictionary instance is meaningful.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<String>", into = "Vec<String>"))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenDictionary {
    tokens: Vec<String>,
    index: HashMap<String, Code>,
}

impl TokenDictionary {
    /// Builds a dictionary over the distinct tokens of `tokens`.
    pub fn build<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect();
        Self::from(distinct.into_iter().collect::<Vec<_>>())
    }

    /// Code of `token`, or [`UNKNOWN_CODE`] if it was never seen.
    pub fn encode(&self, token: &str) -> Code {
        self.index.get(token).copied().unwrap_or(UNKNOWN_CODE)
    }

    pub fn decode(&self, code: Code) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.tokens.get(i))
            .map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in code order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// `true` if every token is distinct, i.e. the mapping is a bijection.
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.tokens.len()
    }
}

impl From<Vec<String>> for TokenDictionary {
    fn from(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as Code))
            .collect();
        Self { tokens, index }
    }
}

impl From<TokenDictionary> for Vec<String> {
    fn from(dict: TokenDictionary) -> Self {
        dict.tokens
    }
}

/// Encodes token rows into a rectangular code matrix.
///
/// Unknown tokens become [`UNKNOWN_CODE`]; shorter rows are padded on the
/// right with [`UNKNOWN_CODE`] up to the longest row.
pub fn encode_rows(rows: &[Vec<String>], dict: &TokenDictionary) -> CodeMatrix {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);

    CodeMatrix::from_fn(rows.len(), width, |i, j| {
        rows[i]
            .get(j)
            .map_or(UNKNOWN_CODE, |token| dict.encode(token))
    })
}
