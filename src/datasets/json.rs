//! Loading frames from JSON transaction exports.

use std::io::Read;

use chrono::NaiveDate;
use serde_json::{Map, Value as Json};
use spendcat_core::{Result, SpendcatError};

use super::{Frame, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reads a JSON array of flat objects into a [`Frame`].
///
/// Columns are the union of all object keys in first-seen order; keys absent
/// from an object become [`Value::Missing`]. Strings in `date_column` are
/// parsed as `YYYY-MM-DD` dates.
///
/// # Errors
///
/// - [`SpendcatError::Serialization`] if the input is not a JSON array of objects.
/// - [`SpendcatError::TypeMismatch`] for booleans, arrays or nested objects.
/// - [`SpendcatError::InvalidValue`] for an unparseable date.
pub fn read_records<R: Read>(reader: R, date_column: &str) -> Result<Frame> {
    let records: Vec<Map<String, Json>> =
        serde_json::from_reader(reader).map_err(|e| SpendcatError::Serialization(e.to_string()))?;

    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut frame = Frame::new(columns.iter().cloned());
    for record in &records {
        let row = columns
            .iter()
            .map(|column| match record.get(column) {
                Some(json) => convert(column, json, column == date_column),
                None => Ok(Value::Missing),
            })
            .collect::<Result<Vec<_>>>()?;
        frame.push_row(row)?;
    }

    Ok(frame)
}

fn convert(column: &str, json: &Json, is_date: bool) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Missing),
        Json::String(s) if is_date => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| SpendcatError::InvalidValue {
                message: format!("column `{}`: bad date `{}`: {}", column, s, e),
            }),
        Json::String(s) => Ok(Value::Text(s.clone())),
        Json::Number(n) => n.as_f64().map(Value::Number).ok_or_else(|| SpendcatError::InvalidValue {
            message: format!("column `{}`: number {} out of range", column, n),
        }),
        other => Err(SpendcatError::TypeMismatch {
            column: column.to_string(),
            expected: "text, number or null".into(),
            got: other.to_string(),
        }),
    }
}
