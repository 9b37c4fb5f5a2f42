//! Role permission sets.
//!
//! Permissions are dotted `module.action` capability names
//! (e.g. `employees.create`). Checks use any-of semantics: a requirement
//! listing several permissions passes when the holder has at least one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The set of permission names a principal holds through its role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet(HashSet<String>);

impl PermissionSet {
    /// Creates an empty permission set (a principal with no role).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of permissions held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks a single permission.
    #[must_use]
    pub fn has(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Checks whether ANY of the required permissions is held (logical OR).
    ///
    /// An empty requirement list denies.
    #[must_use]
    pub fn has_any(&self, required: &[&str]) -> bool {
        required.iter().any(|p| self.0.contains(*p))
    }

    /// Iterates the held permission names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the permissions as a sorted vector, for stable API output.
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.iter().cloned().collect();
        names.sort();
        names
    }
}

impl FromIterator<String> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(String::from).collect())
    }
}
