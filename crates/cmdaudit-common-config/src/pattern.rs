//! Compiled policy patterns.

use crate::{ConfigError, ConfigResult, Property, PropertyStore};
use regex::Regex;
use std::fmt;

/// A named regular expression used for activation and path policies.
#[derive(Clone)]
pub struct Pattern {
    name: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern; `name` identifies it in diagnostics.
    pub fn new(name: impl Into<String>, source: &str) -> ConfigResult<Self> {
        let name = name.into();
        let regex = Regex::new(source).map_err(|source| ConfigError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        Ok(Self { name, regex })
    }

    /// Compile the pattern held in a property, if it has a non-empty value.
    pub fn from_property(store: &dyn PropertyStore, key: Property) -> ConfigResult<Option<Self>> {
        match store.get(key) {
            Some(source) if !source.is_empty() => Self::new(key.env_name(), &source).map(Some),
            _ => Ok(None),
        }
    }

    /// Whether the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Diagnostic name of the pattern.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({}=/{}/)", self.name, self.regex.as_str())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.regex.as_str())
    }
}
