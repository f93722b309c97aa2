//! Label encoding for categorical columns
//!
//! Classes are stored sorted so the integer ids are stable across runs
//! regardless of row order in the training file.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::ModelError;

#[derive(Debug, Clone, Serialize)]
pub struct LabelEncoder {
    kind: &'static str,
    classes: Vec<String>,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl LabelEncoder {
    /// Fit on every observed value; `kind` names the column in error messages
    pub fn fit<'a, I>(kind: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut classes: Vec<String> = values.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();

        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Self { kind, classes, index }
    }

    pub fn transform(&self, value: &str) -> Result<usize, ModelError> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| ModelError::UnknownCategory {
                kind: self.kind,
                value: value.to_string(),
            })
    }

    pub fn inverse(&self, id: usize) -> Option<&str> {
        self.classes.get(id).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
