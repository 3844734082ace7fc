//! Hierarchical string key/value environments.
//!
//! Every process carries a [`MapEnv`] of its own, and every node token
//! carries a local one. A token's *effective* environment is the
//! [`NestedEnv`] view layering the local scope over the process scope:
//! lookups check the local scope first and fall through to the process
//! scope, while writes always target the local scope. The view wraps live
//! references rather than copying, so it stays consistent with later
//! mutation of either underlying scope.
//!
//! # Examples
//!
//! ```rust
//! use oxbow::env::{MapEnv, NestedEnv};
//!
//! let mut process = MapEnv::new();
//! process.set("region", "eu-west");
//! process.set("retries", "3");
//!
//! let mut local = MapEnv::new();
//! local.set("retries", "5");
//!
//! let view = NestedEnv::new(&local, &process);
//! assert_eq!(view.get("retries"), Some("5"));   // local shadows process
//! assert_eq!(view.get("region"), Some("eu-west")); // falls through
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Flat string-to-string environment scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEnv {
    vars: FxHashMap<String, String>,
}

impl MapEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a value in this scope only.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Sets a value in this scope, overwriting any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Removes a key from this scope, returning its previous value.
    ///
    /// Removal never reaches into an outer scope; a [`NestedEnv`] lookup
    /// will still see the outer value afterward.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Returns `true` if this scope defines `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Iterates over the key/value pairs defined in this scope.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Read-only view of a local scope nested over an outer scope.
///
/// Constructed on demand by
/// [`GraphProcess::full_env`](crate::process::GraphProcess::full_env); the
/// view borrows both scopes, so it always reflects their current contents.
#[derive(Clone, Copy, Debug)]
pub struct NestedEnv<'a> {
    inner: &'a MapEnv,
    outer: &'a MapEnv,
}

impl<'a> NestedEnv<'a> {
    /// Builds a view with `inner` shadowing `outer`.
    #[must_use]
    pub fn new(inner: &'a MapEnv, outer: &'a MapEnv) -> Self {
        Self { inner, outer }
    }

    /// Looks up `key` in the inner scope, falling through to the outer one.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.inner.get(key).or_else(|| self.outer.get(key))
    }

    /// Returns `true` if either scope defines `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key) || self.outer.contains(key)
    }
}
