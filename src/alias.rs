//! Repeated-message aliases: `message repeated Name { ... }` declares `Name`
//! to be an array of another type, possibly of another alias.

use crate::error::{ProtoError, Result};
use std::collections::HashMap;

/// Array suffix appended once per resolution hop.
pub const ARRAY_SUFFIX: &str = "[]";

/// `pkg.sub.Name` -> `Name`; messages and aliases are registered under their bare title.
pub fn unqualified(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// `true` when `referenced_type` is a concrete type, `false` when it names another alias.
    pub is_leaf: bool,
    pub referenced_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, Alias>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the alias for `name`.
    pub fn define(&mut self, name: impl Into<String>, is_leaf: bool, referenced_type: impl Into<String>) {
        self.aliases.insert(
            name.into(),
            Alias {
                is_leaf,
                referenced_type: referenced_type.into(),
            },
        );
    }

    /// Alias named `name`, which may be package-qualified.
    pub fn get(&self, name: &str) -> Option<&Alias> {
        self.aliases.get(unqualified(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Resolve `name` to its concrete type with one `[]` per hop of the chain.
    ///
    /// Fails with `UnresolvedAlias` when a link of the chain was never defined
    /// and with `CyclicAlias` when the chain comes back to an alias already visited.
    /// Every link is looked up by its unqualified name.
    pub fn resolve(&self, name: &str) -> Result<String> {
        let mut chain: Vec<&str> = Vec::new();
        let mut current = unqualified(name);
        loop {
            if chain.contains(&current) {
                let mut cycle: Vec<String> = chain.iter().map(|s| s.to_string()).collect();
                cycle.push(current.to_string());
                return Err(ProtoError::CyclicAlias { chain: cycle });
            }
            let alias = self
                .aliases
                .get(current)
                .ok_or_else(|| ProtoError::UnresolvedAlias {
                    name: current.to_string(),
                })?;
            chain.push(current);
            if alias.is_leaf {
                let mut resolved = alias.referenced_type.clone();
                resolved.push_str(&ARRAY_SUFFIX.repeat(chain.len()));
                return Ok(resolved);
            }
            current = unqualified(&alias.referenced_type);
        }
    }
}
