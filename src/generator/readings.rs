//! Per-cycle readings.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One app's value for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub app_name: String,
    pub value: i64,
}

/// The readings of one generation cycle, keyed by app name.
///
/// Keeps insertion order (`app1, app2, ...` for generated sets) so the text
/// exposition and the JSON log list apps the way they were produced.
/// Inserting a name that is already present replaces its value in place.
/// Lookups go through a name → position index, so building a set of N
/// readings stays linear in N.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readings {
    entries: Vec<Reading>,
    index: HashMap<String, usize>,
}

impl Readings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, app_name: impl Into<String>, value: i64) -> Option<i64> {
        let app_name = app_name.into();
        if let Some(&position) = self.index.get(&app_name) {
            return Some(std::mem::replace(&mut self.entries[position].value, value));
        }
        self.index.insert(app_name.clone(), self.entries.len());
        self.entries.push(Reading { app_name, value });
        None
    }

    pub fn get(&self, app_name: &str) -> Option<i64> {
        self.index.get(app_name).map(|&position| self.entries[position].value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.entries.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for Readings {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        let mut readings = Readings::new();
        for (name, value) in iter {
            readings.insert(name, value);
        }
        readings
    }
}

impl<'a> IntoIterator for &'a Readings {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Readings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for reading in &self.entries {
            map.serialize_entry(&reading.app_name, &reading.value)?;
        }
        map.end()
    }
}
