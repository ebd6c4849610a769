//! FormulaRegistry — named expression stores sharing one grammar
//!
//! An explicit ordered map from formula name to [`ExpressionStore`]. Each
//! new store receives a clone of the registry's grammar. The registry's
//! persisted form is a JSON object of [`FormulaRecord`]s keyed by name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::grammar::Grammar;
use crate::store::{ExpressionStore, FormulaRecord};
use crate::{Error, Result};

/// Ordered collection of named formulas
#[derive(Debug)]
pub struct FormulaRegistry<G: Grammar + Clone> {
    grammar: G,
    formulas: BTreeMap<String, ExpressionStore<G>>,
}

impl<G: Grammar + Clone> FormulaRegistry<G> {
    pub fn new(grammar: G) -> Self {
        FormulaRegistry {
            grammar,
            formulas: BTreeMap::new(),
        }
    }

    /// Insert a fresh empty store under `name`, replacing any existing one
    pub fn add(&mut self, name: &str) -> &mut ExpressionStore<G> {
        let store = ExpressionStore::new(self.grammar.clone());
        if self.formulas.insert(name.to_string(), store).is_some() {
            tracing::debug!(name, "replaced formula");
        }
        self.get(name)
    }

    /// Store under `name`, created empty if missing
    pub fn get(&mut self, name: &str) -> &mut ExpressionStore<G> {
        let grammar = &self.grammar;
        self.formulas
            .entry(name.to_string())
            .or_insert_with(|| ExpressionStore::new(grammar.clone()))
    }

    /// # Errors
    /// `UnknownFormula` if there is no store under `name`.
    pub fn lookup(&self, name: &str) -> Result<&ExpressionStore<G>> {
        self.formulas
            .get(name)
            .ok_or_else(|| Error::UnknownFormula(name.to_string()))
    }

    /// # Errors
    /// `UnknownFormula` if there is no store under `name`.
    pub fn remove(&mut self, name: &str) -> Result<ExpressionStore<G>> {
        self.formulas
            .remove(name)
            .ok_or_else(|| Error::UnknownFormula(name.to_string()))
    }

    /// Drop every empty store; returns the removed names
    pub fn clean_empty(&mut self) -> Vec<String> {
        let removed: Vec<String> = self
            .formulas
            .iter()
            .filter(|(_, store)| store.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        self.formulas.retain(|_, store| !store.is_empty());
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "removed empty formulas");
        }
        removed
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.formulas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExpressionStore<G>)> + '_ {
        self.formulas.iter().map(|(name, store)| (name.as_str(), store))
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    // ── Persistence ────────────────────────────────────────

    pub fn export(&self) -> BTreeMap<String, FormulaRecord> {
        self.formulas
            .iter()
            .map(|(name, store)| (name.clone(), store.export_record()))
            .collect()
    }

    /// Replace every formula with the given records
    ///
    /// # Errors
    /// The first record that fails to load; the registry is untouched.
    pub fn load(&mut self, records: &BTreeMap<String, FormulaRecord>) -> Result<()> {
        let mut formulas = BTreeMap::new();
        for (name, record) in records {
            let mut store = ExpressionStore::new(self.grammar.clone());
            store.load_record(record).map_err(|err| {
                tracing::warn!(name = %name, error = %err, "formula failed to load");
                err
            })?;
            formulas.insert(name.clone(), store);
        }
        self.formulas = formulas;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Registry rebuilt from [`to_json`](Self::to_json) output
    ///
    /// # Errors
    /// `SerializationError` for malformed JSON, or a record's load error.
    pub fn from_json(grammar: G, json: &str) -> Result<Self> {
        let records: BTreeMap<String, FormulaRecord> = serde_json::from_str(json)?;
        let mut registry = FormulaRegistry::new(grammar);
        registry.load(&records)?;
        Ok(registry)
    }

    /// # Errors
    /// `IoError` if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), formulas = self.len(), "saved registry");
        Ok(())
    }

    /// Replace every formula with the contents of a saved file
    ///
    /// # Errors
    /// `IoError`, `SerializationError`, or a record's load error.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let json = fs::read_to_string(path)?;
        let records: BTreeMap<String, FormulaRecord> = serde_json::from_str(&json)?;
        self.load(&records)
    }
}

/// Expression a fresh store would hold after `set_from_markup(raw)`
///
/// # Errors
/// The grammar's `ParseError`.
pub fn parse_markup<G: Grammar>(grammar: G, raw: &str) -> Result<G::Expr> {
    let mut store = ExpressionStore::new(grammar);
    store.set_from_markup(raw)?;
    store.expression().cloned().ok_or(Error::EmptyStore)
}
