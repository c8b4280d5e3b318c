//! Typed in-memory transaction tables.
//!
//! A [`Frame`] holds named columns of loosely typed [`Value`]s, the way rows
//! arrive from a database or a parsed bank statement. Column kinds are
//! inferred on demand and the frame is converted into the matrices the
//! classifier consumes.

pub mod json;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use spendcat_core::{Float, Label, Matrix, Result, SpendcatError, TextMatrix};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Number(Float),
    Date(NaiveDate),
    Missing,
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Date(_) => "date",
            Value::Missing => "missing",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Float> for Value {
    fn from(v: Float) -> Self {
        Value::Number(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
    Date,
}

/// String and numeric feature matrices extracted from a [`Frame`].
#[derive(Debug, Clone)]
pub struct Features {
    pub text: TextMatrix,
    pub numeric: Matrix,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::ShapeMismatch`] if the row width differs from the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SpendcatError::ShapeMismatch {
                expected: format!("{} values per row", self.columns.len()),
                got: format!("{}", row.len()),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| SpendcatError::InvalidValue {
                message: format!("unknown column `{}`", name),
            })
    }

    fn with_rows(&self, rows: Vec<Vec<Value>>) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Infers the kind of a column from its values.
    ///
    /// Any date makes it a date column. Otherwise numbers make it numeric and
    /// text makes it textual; a column of only missing values counts as text.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::TypeMismatch`] if text and numbers are mixed.
    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        let idx = self.column_index(name)?;
        let values = self.rows.iter().map(|row| &row[idx]);

        let mut has_text = false;
        let mut has_number = false;
        for value in values {
            match value {
                Value::Date(_) => return Ok(ColumnKind::Date),
                Value::Text(_) => has_text = true,
                Value::Number(_) => has_number = true,
                Value::Missing => {}
            }
        }

        match (has_text, has_number) {
            (true, true) => Err(SpendcatError::TypeMismatch {
                column: name.to_string(),
                expected: "only text or only numbers".into(),
                got: "text and numbers".into(),
            }),
            (false, true) => Ok(ColumnKind::Numeric),
            _ => Ok(ColumnKind::Text),
        }
    }

    /// Splits the non-date columns into feature matrices.
    ///
    /// Columns named in `exclude` are skipped. Text columns keep their order,
    /// as do numeric columns. Missing text becomes the empty string.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::TypeMismatch`] if a column mixes text and numbers, or
    ///   a numeric column has a missing value.
    pub fn features(&self, exclude: &[&str]) -> Result<Features> {
        let mut text_cols = Vec::new();
        let mut numeric_cols = Vec::new();

        for (idx, name) in self.columns.iter().enumerate() {
            if exclude.contains(&name.as_str()) {
                continue;
            }
            match self.column_kind(name)? {
                ColumnKind::Text => text_cols.push(idx),
                ColumnKind::Numeric => numeric_cols.push(idx),
                ColumnKind::Date => {}
            }
        }

        if let Some((row, col)) = self.rows.iter().enumerate().find_map(|(i, row)| {
            numeric_cols
                .iter()
                .find(|&&c| row[c] == Value::Missing)
                .map(|&c| (i, c))
        }) {
            return Err(SpendcatError::TypeMismatch {
                column: self.columns[col].clone(),
                expected: "number".into(),
                got: format!("missing value in row {}", row),
            });
        }

        let n = self.rows.len();
        let text = TextMatrix::from_fn(n, text_cols.len(), |i, j| {
            match &self.rows[i][text_cols[j]] {
                Value::Text(s) => s.clone(),
                _ => String::new(),
            }
        });
        let numeric = Matrix::from_fn(n, numeric_cols.len(), |i, j| {
            match self.rows[i][numeric_cols[j]] {
                Value::Number(v) => v,
                _ => Float::NAN,
            }
        });

        Ok(Features { text, numeric })
    }

    /// Values of the target column as labels.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::TypeMismatch`] if a target value is not text.
    pub fn labels(&self, target: &str) -> Result<Vec<Label>> {
        let idx = self.column_index(target)?;

        self.rows
            .iter()
            .map(|row| match &row[idx] {
                Value::Text(s) => Ok(s.clone()),
                other => Err(SpendcatError::TypeMismatch {
                    column: target.to_string(),
                    expected: "text".into(),
                    got: other.type_name().into(),
                }),
            })
            .collect()
    }

    /// Keeps rows whose target is present and differs from `not_available`.
    pub fn labelled(&self, target: &str, not_available: &str) -> Result<Frame> {
        let idx = self.column_index(target)?;

        let rows = self
            .rows
            .iter()
            .filter(|row| match &row[idx] {
                Value::Missing => false,
                Value::Text(s) => s != not_available,
                _ => true,
            })
            .cloned()
            .collect();

        Ok(self.with_rows(rows))
    }

    /// Stable sort by a date column; rows without a date go last.
    pub fn sort_by_date(&mut self, column: &str) -> Result<()> {
        let idx = self.column_index(column)?;

        self.rows.sort_by_key(|row| match row[idx] {
            Value::Date(d) => (false, Some(d)),
            _ => (true, None),
        });
        Ok(())
    }

    /// Rows whose date lies strictly after `after` and strictly before
    /// `before`. A `None` bound is open; rows without a date never match.
    pub fn between(
        &self,
        column: &str,
        after: Option<NaiveDate>,
        before: Option<NaiveDate>,
    ) -> Result<Frame> {
        let idx = self.column_index(column)?;
        let inside = |d: NaiveDate| after.is_none_or(|a| d > a) && before.is_none_or(|b| d < b);

        let rows = self
            .rows
            .iter()
            .filter(|row| matches!(row[idx], Value::Date(d) if inside(d)))
            .cloned()
            .collect();

        Ok(self.with_rows(rows))
    }

    /// Splits into a head of `floor(len · ratio)` rows and the remaining tail.
    ///
    /// No shuffling happens: on a date-sorted frame the tail holds the most
    /// recent rows.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::InvalidHyperparameter`] unless `0 <= ratio <= 1`.
    pub fn split(&self, ratio: Float) -> Result<(Frame, Frame)> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(SpendcatError::InvalidHyperparameter {
                name: "ratio".into(),
                value: ratio.to_string(),
            });
        }

        let cut = (self.rows.len() as Float * ratio).floor() as usize;
        let (head, tail) = self.rows.split_at(cut);
        Ok((self.with_rows(head.to_vec()), self.with_rows(tail.to_vec())))
    }
}
