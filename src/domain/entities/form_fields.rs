use std::collections::HashMap;

use crate::errors::AppError;

/// Text parts of a multipart form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        FormFields(HashMap::new())
    }

    /// Later values for the same name replace earlier ones.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Removes and returns a field, treating whitespace-only values as absent.
    pub fn take_non_blank(&mut self, name: &str) -> Option<String> {
        self.0.remove(name).filter(|value| !value.trim().is_empty())
    }

    /// Fails with `MissingFields` listing every name that is absent or blank.
    pub fn require(&self, names: &[&str]) -> Result<(), AppError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| self.get(name).is_none_or(|value| value.trim().is_empty()))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingFields(missing))
        }
    }

    /// Fails with `MissingFields` for every name that was supplied but left blank.
    pub fn reject_blank(&self, names: &[&str]) -> Result<(), AppError> {
        let blank: Vec<String> = names
            .iter()
            .filter(|name| self.get(name).is_some_and(|value| value.trim().is_empty()))
            .map(|name| name.to_string())
            .collect();

        if blank.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingFields(blank))
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FormFields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FormFields(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
