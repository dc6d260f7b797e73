//! Process environment abstraction.
//!
//! Environment variables are global to a process and hard to test with a
//! multi-threaded test runner. `Env` reads either from the real process
//! environment or from a map supplied by the caller.
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Env(Arc<Inner>);

#[derive(Debug)]
enum Inner {
    Real,
    Fake(HashMap<String, String>),
}

impl Default for Env {
    fn default() -> Self {
        Self::real()
    }
}

impl Env {
    /// Delegate to `std::env::var`.
    pub fn real() -> Self {
        Self(Arc::new(Inner::Real))
    }

    /// Fake environment built from `(name, value)` pairs.
    pub fn from_slice(vars: &[(&str, &str)]) -> Self {
        Self(Arc::new(Inner::Fake(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )))
    }

    /// Value of `key`; unset, empty and non unicode values are all `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match self.0.as_ref() {
            Inner::Real => std::env::var(key).ok(),
            Inner::Fake(map) => map.get(key).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// First variable in `keys` that is set.
    pub fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.get(k))
    }
}
