//! Python bindings for mathbridge
//!
//! Thin wrapper around `mathbridge-core`. No logic here: every call goes
//! straight to the Rust implementation and every error surfaces as
//! `ValueError` carrying the core error text.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use mathbridge_core::{
    parse_markup, Error, ExpressionStore, FormulaRecord, FormulaRegistry, JsonBridge,
    LatexGrammar, Symbol,
};

fn to_py(err: Error) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn to_py_json(err: serde_json::Error) -> PyErr {
    PyValueError::new_err(format!("Serialization error: {}", err))
}

/// Rewrite editor markup into the parser's dialect.
///
/// Never fails; malformed markup passes through best-effort.
#[pyfunction]
fn normalize_for_parsing(markup: &str) -> String {
    mathbridge_core::normalize_for_parsing(markup)
}

/// Rewrite printer output into the editor's dialect.
///
/// Guarantees:
///   - Deterministic: same input → same output
///   - Idempotent: normalize_for_display(normalize_for_display(x)) == normalize_for_display(x)
#[pyfunction]
fn normalize_for_display(markup: &str) -> String {
    mathbridge_core::normalize_for_display(markup)
}

/// One formula: expression, display markup and alias table.
#[pyclass(unsendable)]
struct Formula {
    store: ExpressionStore<LatexGrammar>,
}

#[pymethods]
impl Formula {
    #[new]
    fn new() -> Self {
        Formula {
            store: ExpressionStore::new(LatexGrammar::new()),
        }
    }

    /// Replace the expression with parsed editor markup.
    ///
    /// Raises:
    ///     ValueError: If the markup is rejected; the formula is unchanged
    fn from_latex(&mut self, markup: &str) -> PyResult<()> {
        self.store.set_from_markup(markup).map_err(to_py)
    }

    /// Display markup, or "" for an empty formula.
    fn to_latex(&self) -> String {
        self.store.to_markup().to_string()
    }

    fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Substitute symbols in order.
    ///
    /// Args:
    ///     bindings: list of (symbol name, replacement markup) pairs
    ///
    /// Raises:
    ///     ValueError: If the formula is empty or a replacement is rejected
    fn subs(&mut self, bindings: Vec<(String, String)>) -> PyResult<()> {
        let parsed = bindings
            .into_iter()
            .map(|(name, markup)| {
                parse_markup(LatexGrammar::new(), &markup).map(|expr| (Symbol::new(name), expr))
            })
            .collect::<Result<Vec<_>, Error>>()
            .map_err(to_py)?;
        self.store.substitute(parsed).map_err(to_py)
    }

    /// JSON expression tree using short aliases.
    fn to_foreign(&mut self) -> PyResult<String> {
        let value = self.store.export_foreign(&JsonBridge).map_err(to_py)?;
        serde_json::to_string(&value).map_err(to_py_json)
    }

    /// Replace the expression from an aliased JSON tree.
    fn from_foreign(&mut self, json: &str) -> PyResult<()> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(to_py_json)?;
        self.store.import_foreign(&JsonBridge, &value).map_err(to_py)
    }

    /// Persisted record as a JSON string.
    fn export(&self) -> PyResult<String> {
        serde_json::to_string_pretty(&self.store.export_record()).map_err(to_py_json)
    }

    /// Restore from a JSON record produced by `export`.
    fn load(&mut self, json: &str) -> PyResult<()> {
        let record: FormulaRecord = serde_json::from_str(json).map_err(to_py_json)?;
        self.store.load_record(&record).map_err(to_py)
    }

    fn __repr__(&self) -> String {
        format!("Formula({:?})", self.store.to_markup())
    }
}

/// Named formulas, saved together in one JSON file.
#[pyclass(unsendable)]
struct FormulaManager {
    registry: FormulaRegistry<LatexGrammar>,
}

#[pymethods]
impl FormulaManager {
    #[new]
    fn new() -> Self {
        FormulaManager {
            registry: FormulaRegistry::new(LatexGrammar::new()),
        }
    }

    /// Insert an empty formula, replacing any existing one.
    fn add(&mut self, name: &str) {
        self.registry.add(name);
    }

    /// Parse markup into the named formula, creating it if missing.
    fn set(&mut self, name: &str, markup: &str) -> PyResult<()> {
        self.registry.get(name).set_from_markup(markup).map_err(to_py)
    }

    /// Display markup of the named formula, creating it empty if missing.
    fn get(&mut self, name: &str) -> String {
        self.registry.get(name).to_markup().to_string()
    }

    fn remove(&mut self, name: &str) -> PyResult<()> {
        self.registry.remove(name).map(|_| ()).map_err(to_py)
    }

    /// Drop every empty formula and return their names.
    fn clean_empty(&mut self) -> Vec<String> {
        self.registry.clean_empty()
    }

    fn names(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    fn save(&self, path: std::path::PathBuf) -> PyResult<()> {
        self.registry.save(&path).map_err(to_py)
    }

    /// Replace every formula with the contents of a saved file.
    ///
    /// Raises:
    ///     ValueError: On I/O, JSON or markup errors; nothing is replaced
    fn load(&mut self, path: std::path::PathBuf) -> PyResult<()> {
        self.registry.load_file(&path).map_err(to_py)
    }

    fn __len__(&self) -> usize {
        self.registry.len()
    }
}

/// mathbridge Python module — formula markup between editor and parser
#[pymodule]
fn mathbridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(normalize_for_parsing, m)?)?;
    m.add_function(wrap_pyfunction!(normalize_for_display, m)?)?;
    m.add_class::<Formula>()?;
    m.add_class::<FormulaManager>()?;
    Ok(())
}
