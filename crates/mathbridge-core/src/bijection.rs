//! Symbol bijection — original symbols ↔ generator-issued aliases
//!
//! Both directions are stored and always updated together, so they stay
//! mutually inverse: no alias names two originals, no original has two
//! aliases. The bijection owns its [`SymbolNameGenerator`], which is the
//! only source of aliases.

use std::collections::BTreeMap;

use crate::naming::SymbolNameGenerator;
use crate::symbol::Symbol;
use crate::{Error, Result};

/// One `(original, alias)` entry, as persisted
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SymbolPair {
    pub original: Symbol,
    pub alias: Symbol,
}

/// One-to-one mapping between original symbols and short aliases
#[derive(Debug, Default)]
pub struct SymbolBijection {
    forward: BTreeMap<Symbol, Symbol>,
    inverse: BTreeMap<Symbol, Symbol>,
    /// Originals in allocation order, for stable serialization
    order: Vec<Symbol>,
    names: SymbolNameGenerator,
}

impl SymbolBijection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias for `original`, allocating a fresh one on first use
    ///
    /// Idempotent: a second call with the same original returns the same
    /// alias and does not advance the generator.
    pub fn allocate(&mut self, original: &Symbol) -> Symbol {
        if let Some(alias) = self.forward.get(original) {
            return alias.clone();
        }

        // Restored bijections may already hold generator names.
        let alias = loop {
            let candidate = Symbol::new(self.names.next_name());
            if !self.inverse.contains_key(&candidate) {
                break candidate;
            }
        };

        tracing::debug!(original = %original, alias = %alias, "allocated alias");
        self.insert(original.clone(), alias.clone());
        alias
    }

    /// Original symbol behind `alias`
    ///
    /// # Errors
    /// Returns `LookupError` if `alias` was never allocated.
    pub fn resolve(&self, alias: &Symbol) -> Result<Symbol> {
        self.inverse
            .get(alias)
            .cloned()
            .ok_or_else(|| Error::LookupError(alias.name().to_string()))
    }

    /// Alias already recorded for `original`, if any
    pub fn get_alias(&self, original: &Symbol) -> Option<&Symbol> {
        self.forward.get(original)
    }

    pub fn contains_alias(&self, alias: &Symbol) -> bool {
        self.inverse.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(original, alias)` pairs in allocation order
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Symbol)> + '_ {
        self.order
            .iter()
            .filter_map(move |original| self.forward.get(original).map(|alias| (original, alias)))
    }

    /// alias → original view, for importing foreign values
    pub fn inverse_map(&self) -> &BTreeMap<Symbol, Symbol> {
        &self.inverse
    }

    /// original → alias view, for exporting to foreign values
    pub fn forward_map(&self) -> &BTreeMap<Symbol, Symbol> {
        &self.forward
    }

    /// Ordered `(original, alias)` pairs
    pub fn to_pairs(&self) -> Vec<SymbolPair> {
        self.iter()
            .map(|(original, alias)| SymbolPair {
                original: original.clone(),
                alias: alias.clone(),
            })
            .collect()
    }

    /// Rebuild both directions from persisted pairs
    ///
    /// The generator starts fresh; allocation skips any name already used
    /// as an alias here.
    ///
    /// # Errors
    /// Returns `DuplicateOriginal` or `DuplicateAlias` when the pairs are
    /// not one-to-one.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = SymbolPair>,
    {
        let mut bijection = SymbolBijection::new();
        for SymbolPair { original, alias } in pairs {
            if bijection.forward.contains_key(&original) {
                return Err(Error::DuplicateOriginal(original.into_name()));
            }
            if bijection.inverse.contains_key(&alias) {
                return Err(Error::DuplicateAlias(alias.into_name()));
            }
            bijection.insert(original, alias);
        }
        Ok(bijection)
    }

    fn insert(&mut self, original: Symbol, alias: Symbol) {
        self.inverse.insert(alias.clone(), original.clone());
        self.forward.insert(original.clone(), alias);
        self.order.push(original);
    }
}
