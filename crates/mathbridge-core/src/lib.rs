//! mathbridge core — formula markup between an editor and a symbolic parser
//!
//! The editor's LaTeX dialect and the parser's grammar disagree on
//! implicit multiplication, script bracing, special-symbol spelling and
//! commas. This crate rewrites markup in both directions and keeps each
//! formula's symbols exchangeable with foreign algebra systems through a
//! short-alias bijection.
//!
//! # Architecture
//!
//! ```text
//! editor markup → normalize_for_parsing → Grammar::parse → Expression
//!                                                              ↓
//! editor markup ← normalize_for_display ← Grammar::print ←─────┤
//!                                                              ↓
//!        ForeignBridge ← rename to aliases ← SymbolBijection ← ExpressionStore
//! ```
//!
//! # Guarantees
//!
//! - **Total normalizer**: rewrite stages never fail, malformed markup
//!   passes through best-effort
//! - **Idempotent display**: `display(display(x)) == display(x)`
//! - **Atomic stores**: a failed parse or bridge call changes nothing
//! - **Bijective aliases**: no alias names two symbols, no symbol has two
//!   aliases

pub mod bijection;
pub mod error;
pub mod expr;
pub mod foreign;
pub mod grammar;
pub mod greek;
pub mod naming;
pub mod normalizer;
pub mod parser;
pub mod printer;
pub mod registry;
pub mod store;
pub mod symbol;

pub use bijection::{SymbolBijection, SymbolPair};
pub use error::{Error, Result};
pub use expr::{Expr, Expression};
pub use foreign::{ForeignBridge, JsonBridge};
pub use grammar::{Grammar, LatexGrammar, SymbolNames};
pub use naming::SymbolNameGenerator;
pub use normalizer::{normalize_for_display, normalize_for_parsing, Pipeline, RewriteStage};
pub use registry::{parse_markup, FormulaRegistry};
pub use store::{ExpressionStore, FormulaRecord};
pub use symbol::Symbol;

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_import_restores_original_names() {
        let mut store = ExpressionStore::new(LatexGrammar::new());
        store.set_from_markup(r"x \cdot y_{long}").unwrap();
        let before = store.expression().cloned().unwrap();

        let foreign = store.export_foreign(&JsonBridge).unwrap();
        assert!(foreign.to_string().contains("\"a\""));
        assert!(!foreign.to_string().contains("long"));

        store.import_foreign(&JsonBridge, &foreign).unwrap();
        assert_eq!(store.expression(), Some(&before));
        let names: Vec<String> = before
            .free_symbols()
            .into_iter()
            .map(Symbol::into_name)
            .collect();
        assert_eq!(names, vec!["x", "y_{long}"]);
    }

    #[test]
    fn test_display_of_reparsed_display_is_stable() {
        let samples = [
            r"0.5 \beta_{r} x_{nm}",
            r"E_{rear} \cdot v^{2} + \frac{1}{2} m",
            r"\exponentialE^{-(t)} k",
            r"\sin{\left(\omega t\right)} A",
        ];
        for raw in samples {
            let mut store = ExpressionStore::new(LatexGrammar::new());
            store.set_from_markup(raw).unwrap();
            let display = store.to_markup().to_string();

            let mut again = ExpressionStore::new(LatexGrammar::new());
            again.set_from_markup(&display).unwrap();
            assert_eq!(again.expression(), store.expression(), "reparse of {:?}", display);
            assert_eq!(again.to_markup(), display);
        }
    }

    #[test]
    fn test_version_is_package_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert!(VERSION.split('.').count() >= 3);
    }

    #[test]
    fn test_determinism_100_iterations() {
        let raw = r"k \cdot e^{-\frac{A}{B}} r_{sum, j}";
        let mut first = ExpressionStore::new(LatexGrammar::new());
        first.set_from_markup(raw).unwrap();

        for i in 0..100 {
            let mut store = ExpressionStore::new(LatexGrammar::new());
            store.set_from_markup(raw).unwrap();
            assert_eq!(first.to_markup(), store.to_markup(), "Non-determinism at iteration {}", i);
            assert_eq!(first.export_record(), store.export_record());
        }
    }
}
