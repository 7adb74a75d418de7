//! Named-state containers for model definitions.
//!
//! A model's working state is a handful of [`NamedState`] containers
//! (`var`, `dvar`, `aux_var`, `param`) plus a [`FnMap`] of named shape
//! functions. Containers are insertion-ordered so that "iterate over all
//! declared variables" is stable, and every lookup of an undeclared key is
//! an error rather than a silent default.

use crate::errors::{StockflowError, StockflowResult};
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    name: String,
    value: FloatValue,
}

/// An insertion-ordered mapping from variable name to value.
///
/// This is very similar to a map (with likely worse performance for large
/// key sets), but preserves declaration order and carries a role name
/// (`"var"`, `"param"`, ...) so lookup failures report which container was
/// missing the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedState {
    role: String,
    entries: Vec<Entry>,
}

impl NamedState {
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Look up a value, failing if the key was never declared.
    pub fn get(&self, key: &str) -> StockflowResult<FloatValue> {
        self.entries
            .iter()
            .find(|e| e.name == key)
            .map(|e| e.value)
            .ok_or_else(|| StockflowError::UndeclaredKey {
                role: self.role.clone(),
                key: key.to_string(),
            })
    }

    /// Insert or overwrite a value.
    ///
    /// Overwriting keeps the key's original insertion position.
    pub fn set(&mut self, key: &str, value: FloatValue) {
        match self.entries.iter_mut().find(|e| e.name == key) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Entry {
                name: key.to_string(),
                value,
            }),
        }
    }

    /// Add `delta` to an already-declared value.
    ///
    /// Contributions are summed, never assigned, so independent callers
    /// (e.g. flow applications) commute. An undeclared key is an error.
    pub fn add(&mut self, key: &str, delta: FloatValue) -> StockflowResult<()> {
        match self.entries.iter_mut().find(|e| e.name == key) {
            Some(entry) => {
                entry.value += delta;
                Ok(())
            }
            None => Err(StockflowError::UndeclaredKey {
                role: self.role.clone(),
                key: key.to_string(),
            }),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.name == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FloatValue)> {
        self.entries.iter().map(|e| (e.name.as_str(), e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Project the values at the given keys, in the given order.
    pub fn to_vector(&self, order: &[String]) -> StockflowResult<Vec<FloatValue>> {
        order.iter().map(|key| self.get(key)).collect()
    }

    /// Overwrite the values at the given keys from a same-length slice.
    ///
    /// The container is untouched if any key is undeclared or the lengths
    /// differ.
    pub fn from_vector(&mut self, order: &[String], values: &[FloatValue]) -> StockflowResult<()> {
        if order.len() != values.len() {
            return Err(StockflowError::ShapeMismatch {
                expected: order.len(),
                actual: values.len(),
            });
        }
        let indexes = order
            .iter()
            .map(|key| {
                self.entries
                    .iter()
                    .position(|e| &e.name == key)
                    .ok_or_else(|| StockflowError::UndeclaredKey {
                        role: self.role.clone(),
                        key: key.to_string(),
                    })
            })
            .collect::<StockflowResult<Vec<_>>>()?;
        for (index, value) in indexes.into_iter().zip(values) {
            self.entries[index].value = *value;
        }
        Ok(())
    }

    /// Redeclare exactly the given keys, in order, all zero.
    pub fn zero_all(&mut self, order: &[String]) {
        self.entries.clear();
        self.entries.extend(order.iter().map(|key| Entry {
            name: key.clone(),
            value: 0.0,
        }));
    }
}

/// A shape function: a scalar response curve registered under a name.
pub type ShapeFn = Box<dyn Fn(FloatValue) -> FloatValue + Send + Sync>;

/// An insertion-ordered mapping from name to shape function (the `fn`
/// container). Not serializable; closures have no data representation.
#[derive(Default)]
pub struct FnMap {
    entries: Vec<(String, ShapeFn)>,
}

impl FnMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register or replace a function under the given name.
    pub fn set(&mut self, key: &str, f: ShapeFn) {
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => *existing = f,
            None => self.entries.push((key.to_string(), f)),
        }
    }

    pub fn get(&self, key: &str) -> StockflowResult<&ShapeFn> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, f)| f)
            .ok_or_else(|| StockflowError::UndeclaredKey {
                role: "fn".to_string(),
                key: key.to_string(),
            })
    }

    /// Evaluate the named function at `x`.
    pub fn call(&self, key: &str, x: FloatValue) -> StockflowResult<FloatValue> {
        Ok(self.get(key)?(x))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for FnMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
