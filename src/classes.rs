//! Class id to display name lookup.

use crate::error::{EvalError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Display names for class ids.
///
/// Ids without a name resolve to the id itself, so reports never lose a row
/// because of an incomplete class list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNames {
    names: BTreeMap<u32, String>,
}

/// Accepted JSON layouts: `["a", "b"]` or `{"0": "a", "1": "b"}`.
///
/// Untagged content keeps object keys as strings, so ids are parsed after
/// deserialization.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassNamesFile {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl ClassNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names indexed by position.
    pub fn from_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| (id as u32, name.into()))
            .collect();
        Self { names }
    }

    /// Parse a `classes.txt` body: one name per line, line index = id.
    ///
    /// Blank lines still take an id but get no name.
    pub fn from_lines(content: &str) -> Self {
        let names = content
            .lines()
            .enumerate()
            .filter_map(|(id, line)| {
                let name = line.trim();
                (!name.is_empty()).then(|| (id as u32, name.to_string()))
            })
            .collect();
        Self { names }
    }

    /// Parse a JSON list or id-keyed object.
    pub fn from_json(json_str: &str) -> Result<Self> {
        let file: ClassNamesFile = serde_json::from_str(json_str)?;
        Ok(match file {
            ClassNamesFile::List(names) => Self::from_list(names),
            ClassNamesFile::Map(entries) => {
                let names = entries
                    .into_iter()
                    .map(|(key, name)| {
                        key.trim().parse::<u32>().map(|id| (id, name)).map_err(|_| {
                            EvalError::InvalidArgument(format!(
                                "invalid class id '{}' in class names; expected non-negative integer",
                                key
                            ))
                        })
                    })
                    .collect::<Result<BTreeMap<u32, String>>>()?;
                Self { names }
            }
        })
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as
    /// one name per line.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let names = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_lines(&content)
        };
        log::debug!("Loaded {} class names from {}", names.len(), path.display());
        Ok(names)
    }

    pub fn insert(&mut self, id: u32, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    /// Look up the name of a class.
    pub fn get(&self, id: u32) -> Result<&str> {
        self.names
            .get(&id)
            .map(String::as_str)
            .ok_or(EvalError::ClassLookupMiss(id))
    }

    /// Name of a class, or its id as text when unknown.
    pub fn resolve(&self, id: u32) -> String {
        match self.get(id) {
            Ok(name) => name.to_string(),
            Err(err) => {
                log::trace!("{}", err);
                id.to_string()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
