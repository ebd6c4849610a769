//! ExpressionStore — one formula: its expression, display cache and aliases
//!
//! # State machine
//!
//! ```text
//! Empty ──set_from_markup / import_foreign / set_expression──→ Populated
//! Populated ──any successful mutation──→ Populated
//! ```
//!
//! Every mutation is all-or-nothing: the new expression is computed in
//! full before any field changes, so a failed parse or bridge call leaves
//! the store exactly as it was.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use crate::bijection::{SymbolBijection, SymbolPair};
use crate::expr::Expression;
use crate::foreign::ForeignBridge;
use crate::grammar::Grammar;
use crate::normalizer::{normalize_for_display, normalize_for_parsing};
use crate::symbol::Symbol;
use crate::{Error, Result};

/// Persisted form of one store
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FormulaRecord {
    /// Debug form of the expression, informational only
    #[serde(default)]
    pub expr: Option<String>,
    #[serde(default)]
    pub symbols: Vec<SymbolPair>,
    /// Markup the expression is rebuilt from on load
    #[serde(default)]
    pub markup: Option<String>,
}

/// Holds the current expression of one formula
#[derive(Debug)]
pub struct ExpressionStore<G: Grammar> {
    grammar: G,
    expr: Option<G::Expr>,
    /// Display markup of `expr`; empty cell means stale
    display: OnceCell<String>,
    symbols: SymbolBijection,
    /// Raw markup of the last accepted parse, while it still describes `expr`
    markup: Option<String>,
}

impl<G: Grammar> ExpressionStore<G> {
    /// Empty store using `grammar` for parsing and printing
    pub fn new(grammar: G) -> Self {
        ExpressionStore {
            grammar,
            expr: None,
            display: OnceCell::new(),
            symbols: SymbolBijection::new(),
            markup: None,
        }
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    pub fn expression(&self) -> Option<&G::Expr> {
        self.expr.as_ref()
    }

    pub fn symbols(&self) -> &SymbolBijection {
        &self.symbols
    }

    /// Raw markup of the last successful [`set_from_markup`](Self::set_from_markup)
    ///
    /// `None` once the expression has been replaced by other means.
    pub fn last_markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    // ── Markup ─────────────────────────────────────────────

    /// Parse editor markup and make it the current expression
    ///
    /// The display cache is filled right away from the grammar's own
    /// printing of the new expression.
    ///
    /// # Errors
    /// Returns the grammar's `ParseError` unchanged; the store is untouched.
    pub fn set_from_markup(&mut self, raw: &str) -> Result<()> {
        let expr = self.parse_raw(raw)?;
        let display_markup = normalize_for_display(&self.grammar.print(&expr));
        tracing::debug!(markup = raw, display = %display_markup, "parsed markup");

        self.expr = Some(expr);
        self.display = OnceCell::from(display_markup);
        self.markup = Some(raw.to_string());
        Ok(())
    }

    /// Display markup of the current expression; empty for an empty store
    ///
    /// Recomputed only when the expression changed since the last call.
    pub fn to_markup(&self) -> &str {
        let Some(expr) = &self.expr else {
            return "";
        };
        self.display.get_or_init(|| {
            tracing::debug!("recomputing display markup");
            normalize_for_display(&self.grammar.print(expr))
        })
    }

    fn parse_raw(&self, raw: &str) -> Result<G::Expr> {
        let normalized = normalize_for_parsing(raw);
        self.grammar.parse(&normalized).map_err(|err| {
            tracing::warn!(markup = raw, error = %err, "markup rejected");
            err
        })
    }

    // ── Foreign exchange ───────────────────────────────────

    /// Convert the expression for a foreign system, under aliases
    ///
    /// Every free symbol gets an alias (allocated on first export) and is
    /// renamed to it before the bridge sees the expression.
    ///
    /// # Errors
    /// `EmptyStore` for an empty store, or the bridge's error.
    pub fn export_foreign<B>(&mut self, bridge: &B) -> Result<B::Value>
    where
        B: ForeignBridge<G::Expr>,
    {
        let expr = self.expr.as_ref().ok_or(Error::EmptyStore)?;

        let renames: BTreeMap<Symbol, Symbol> = expr
            .free_symbols()
            .into_iter()
            .map(|original| {
                let alias = self.symbols.allocate(&original);
                (original, alias)
            })
            .collect();

        tracing::debug!(symbols = renames.len(), "exporting to foreign value");
        bridge.to_foreign(&expr.rename_symbols(&renames))
    }

    /// Replace the expression with a foreign value, restoring original names
    ///
    /// Symbols that are not known aliases pass through unchanged.
    ///
    /// # Errors
    /// The bridge's error; the store is untouched.
    pub fn import_foreign<B>(&mut self, bridge: &B, value: &B::Value) -> Result<()>
    where
        B: ForeignBridge<G::Expr>,
    {
        let foreign = bridge.from_foreign(value)?;
        let restored = foreign.rename_symbols(self.symbols.inverse_map());
        tracing::debug!(expr = %restored, "imported foreign value");
        self.replace(restored);
        Ok(())
    }

    // ── Expression edits ───────────────────────────────────

    /// Apply `bindings` one after another, each on the previous result
    ///
    /// # Errors
    /// `EmptyStore` for an empty store.
    pub fn substitute<I>(&mut self, bindings: I) -> Result<()>
    where
        I: IntoIterator<Item = (Symbol, G::Expr)>,
    {
        let expr = self.expr.as_ref().ok_or(Error::EmptyStore)?;
        let substituted = bindings
            .into_iter()
            .fold(expr.clone(), |acc, (symbol, value)| acc.substitute(&symbol, &value));
        self.replace(substituted);
        Ok(())
    }

    /// Make `expr` the current expression
    pub fn set_expression(&mut self, expr: G::Expr) {
        self.replace(expr);
    }

    fn replace(&mut self, expr: G::Expr) {
        self.expr = Some(expr);
        self.display = OnceCell::new();
        self.markup = None;
    }

    // ── Persistence ────────────────────────────────────────

    /// Snapshot for saving
    ///
    /// When the expression no longer comes from raw markup, its display
    /// markup is recorded instead so that loading can rebuild it.
    pub fn export_record(&self) -> FormulaRecord {
        let markup = match (&self.markup, &self.expr) {
            (Some(raw), _) => Some(raw.clone()),
            (None, Some(_)) => Some(self.to_markup().to_string()),
            (None, None) => None,
        };
        FormulaRecord {
            expr: self.expr.as_ref().map(|e| e.to_string()),
            symbols: self.symbols.to_pairs(),
            markup,
        }
    }

    /// Restore from a saved record: bijection first, then the markup
    ///
    /// # Errors
    /// `DuplicateOriginal`/`DuplicateAlias` for inconsistent pairs, or the
    /// `ParseError` of the recorded markup; the store is untouched.
    pub fn load_record(&mut self, record: &FormulaRecord) -> Result<()> {
        let symbols = SymbolBijection::from_pairs(record.symbols.iter().cloned())?;

        match &record.markup {
            Some(raw) => {
                let expr = self.parse_raw(raw)?;
                self.symbols = symbols;
                self.replace(expr);
                self.markup = Some(raw.clone());
            }
            None => {
                self.symbols = symbols;
                self.expr = None;
                self.display = OnceCell::new();
                self.markup = None;
            }
        }
        Ok(())
    }
}
