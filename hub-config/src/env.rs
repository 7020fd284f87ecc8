//! Access to environment variables.
//!
//! Resolution reads and writes variables through the [`Environment`] trait so the
//! precedence rules can be exercised against an in-memory map instead of the real
//! process environment.

use std::collections::HashMap;

/// A readable and writable set of environment variables
pub trait Environment {
    /// Returns the value of `key`, or `None` when unset
    fn get(&self, key: &str) -> Option<String>;

    /// Sets `key` to `value`
    fn set(&mut self, key: &str, value: &str);
}

/// The environment of the running process.
///
/// Writes go through [`std::env::set_var`], which is only sound while no other thread
/// reads the environment concurrently. Resolve configuration before spawning threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

/// In-memory environment, mostly useful in tests
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Environment for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
