use std::fmt;

use spendcat_core::{Float, Result, SpendcatError};

/// Ordered set of named numeric form fields, each possibly still empty.
///
/// Used to collect one value per category (e.g. asset balances) before the
/// values are written out as rows. Field order is insertion order and never
/// changes, so [`to_rows`](FieldBag::to_rows) is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBag {
    fields: Vec<(String, Option<Float>)>,
}

impl FieldBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bag with one empty field per name. Duplicate names are kept once.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bag = Self::new();
        for name in names {
            bag.insert(name, None);
        }
        bag
    }

    /// Like [`from_names`](Self::from_names), with category names normalized
    /// to field names: `-` becomes `_` and everything is lower-cased.
    pub fn from_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_names(
            categories
                .into_iter()
                .map(|c| c.as_ref().replace('-', "_").to_lowercase()),
        )
    }

    /// Adds a field, or overwrites its value if it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<Float>) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Sets the value of an existing field.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::InvalidValue`] if there is no field called `name`.
    pub fn set(&mut self, name: &str, value: Float) -> Result<()> {
        let (_, slot) = self
            .fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| SpendcatError::InvalidValue {
                message: format!("unknown field `{}`", name),
            })?;
        *slot = Some(value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Float> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }

    /// `true` once every field has a value.
    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_some())
    }

    /// Names of the fields still without a value.
    pub fn missing(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// One `(name, value)` row per field, in insertion order.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::InvalidValue`] listing the empty fields if the bag
    ///   is not complete.
    pub fn to_rows(&self) -> Result<Vec<(String, Float)>> {
        self.fields
            .iter()
            .map(|(name, value)| {
                value.map(|v| (name.clone(), v)).ok_or_else(|| {
                    SpendcatError::InvalidValue {
                        message: format!("fields without a value: {}", self.missing().join(", ")),
                    }
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for FieldBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            match value {
                Some(v) => writeln!(f, "{}: {}", name, v)?,
                None => writeln!(f, "{}: -", name)?,
            }
        }
        Ok(())
    }
}
