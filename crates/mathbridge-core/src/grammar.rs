//! Grammar capability — the parser/printer pair a store is built with
//!
//! A grammar is injected into each [`ExpressionStore`](crate::ExpressionStore)
//! at construction; nothing is configured globally.

use std::collections::BTreeMap;

use crate::expr::{Expr, Expression};
use crate::greek::GREEK_LETTERS;
use crate::parser::parse_latex;
use crate::printer::print_latex;
use crate::Result;

/// Parser and printer for one markup dialect
pub trait Grammar {
    type Expr: Expression;

    /// Parse already-normalized markup
    ///
    /// # Errors
    /// Returns `ParseError` with the rejection message.
    fn parse(&self, markup: &str) -> Result<Self::Expr>;

    /// Print an expression, applying the grammar's symbol-name overrides
    fn print(&self, expr: &Self::Expr) -> String;
}

/// Printer overrides: symbol name → markup written in its place
///
/// Matches whole names only; `beta` is overridden, `beta_{r}` is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNames {
    table: BTreeMap<String, String>,
}

impl SymbolNames {
    /// Table with no overrides at all
    pub fn empty() -> Self {
        SymbolNames {
            table: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, markup: impl Into<String>) -> Option<String> {
        self.table.insert(name.into(), markup.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.table.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.table.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Every Greek letter name, both cases, mapped to its escaped command
impl Default for SymbolNames {
    fn default() -> Self {
        let table = GREEK_LETTERS
            .iter()
            .map(|name| (name.to_string(), format!("\\{}", name)))
            .collect();
        SymbolNames { table }
    }
}

/// LaTeX markup grammar producing [`Expr`] trees
#[derive(Debug, Clone, Default)]
pub struct LatexGrammar {
    names: SymbolNames,
}

impl LatexGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol_names(names: SymbolNames) -> Self {
        LatexGrammar { names }
    }

    pub fn symbol_names(&self) -> &SymbolNames {
        &self.names
    }
}

impl Grammar for LatexGrammar {
    type Expr = Expr;

    fn parse(&self, markup: &str) -> Result<Expr> {
        parse_latex(markup)
    }

    fn print(&self, expr: &Expr) -> String {
        print_latex(expr, &self.names)
    }
}
