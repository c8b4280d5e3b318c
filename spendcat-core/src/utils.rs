use crate::{Float, Matrix, Result, SpendcatError, TextMatrix};

fn check_rectangular<T>(rows: &[Vec<T>]) -> Result<usize> {
    let ncols = rows.first().map_or(0, Vec::len);

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
        return Err(SpendcatError::ShapeMismatch {
            expected: format!("{} columns in every row", ncols),
            got: format!("{} columns in row {}", row.len(), i),
        });
    }

    Ok(ncols)
}

/// Builds a [`TextMatrix`] from row vectors.
///
/// An empty `rows` gives a `0 × 0` matrix.
///
/// # Errors
///
/// - [`SpendcatError::ShapeMismatch`] if the rows have different lengths.
pub fn text_matrix<S: Into<String>>(rows: Vec<Vec<S>>) -> Result<TextMatrix> {
    let ncols = check_rectangular(&rows)?;
    let nrows = rows.len();
    let cells = rows.into_iter().flatten().map(Into::into);
    Ok(TextMatrix::from_row_iterator(nrows, ncols, cells))
}

/// Builds a numeric [`Matrix`] from row vectors.
///
/// # Errors
///
/// - [`SpendcatError::ShapeMismatch`] if the rows have different lengths.
pub fn numeric_matrix(rows: Vec<Vec<Float>>) -> Result<Matrix> {
    let ncols = check_rectangular(&rows)?;
    let nrows = rows.len();
    Ok(Matrix::from_row_iterator(nrows, ncols, rows.into_iter().flatten()))
}
