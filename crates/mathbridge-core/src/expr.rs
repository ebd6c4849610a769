//! Expression capability and the crate's reference expression tree
//!
//! The store only needs to enumerate free symbols and substitute them, so
//! it talks to expressions through [`Expression`]. [`Expr`] is the tree the
//! bundled LaTeX grammar produces; it is immutable, every operation returns
//! a new value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::symbol::Symbol;

/// What the store requires of an expression value
///
/// `Display` is the plain debug form written to persisted records.
pub trait Expression: Clone + fmt::Debug + fmt::Display + PartialEq {
    /// Symbols occurring in the expression
    fn free_symbols(&self) -> BTreeSet<Symbol>;

    /// Replace every occurrence of `symbol` with `replacement`
    fn substitute(&self, symbol: &Symbol, replacement: &Self) -> Self;

    /// Rename symbols simultaneously; symbols missing from `renames` stay
    ///
    /// Simultaneous means `{a → b, b → a}` swaps the two instead of
    /// collapsing both onto `a`.
    fn rename_symbols(&self, renames: &BTreeMap<Symbol, Symbol>) -> Self;
}

/// Symbolic expression tree
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    Number(f64),
    Symbol(Symbol),
    Neg(Box<Expr>),
    /// n-ary sum, at least two terms
    Add(Vec<Expr>),
    /// n-ary product, at least two factors
    Mul(Vec<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call { name: String, args: Vec<Expr> },
    Equation(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn num(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn sym(name: &str) -> Self {
        Expr::Symbol(Symbol::new(name))
    }

    pub fn neg(inner: Expr) -> Self {
        Expr::Neg(Box::new(inner))
    }

    /// Sum of `terms`, flattening nested sums; a single term is returned as is
    pub fn sum(terms: Vec<Expr>) -> Self {
        let mut flat = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Expr::Add(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Expr::Add(flat)
        }
    }

    /// Product of `factors`, flattening nested products
    pub fn product(factors: Vec<Expr>) -> Self {
        let mut flat = Vec::with_capacity(factors.len());
        for factor in factors {
            match factor {
                Expr::Mul(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Expr::Mul(flat)
        }
    }

    pub fn div(numerator: Expr, denominator: Expr) -> Self {
        Expr::Div(Box::new(numerator), Box::new(denominator))
    }

    pub fn pow(base: Expr, exponent: Expr) -> Self {
        Expr::Pow(Box::new(base), Box::new(exponent))
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.to_string(),
            args,
        }
    }

    pub fn equation(lhs: Expr, rhs: Expr) -> Self {
        Expr::Equation(Box::new(lhs), Box::new(rhs))
    }

    /// Rebuild the tree, replacing symbols for which `f` returns a value
    fn map_symbols<F>(&self, f: &F) -> Expr
    where
        F: Fn(&Symbol) -> Option<Expr>,
    {
        let all = |items: &[Expr]| items.iter().map(|e| e.map_symbols(f)).collect::<Vec<_>>();
        match self {
            Expr::Number(v) => Expr::Number(*v),
            Expr::Symbol(s) => f(s).unwrap_or_else(|| Expr::Symbol(s.clone())),
            Expr::Neg(inner) => Expr::neg(inner.map_symbols(f)),
            Expr::Add(terms) => Expr::sum(all(terms)),
            Expr::Mul(factors) => Expr::product(all(factors)),
            Expr::Div(n, d) => Expr::div(n.map_symbols(f), d.map_symbols(f)),
            Expr::Pow(b, e) => Expr::pow(b.map_symbols(f), e.map_symbols(f)),
            Expr::Call { name, args } => Expr::Call {
                name: name.clone(),
                args: all(args),
            },
            Expr::Equation(l, r) => Expr::equation(l.map_symbols(f), r.map_symbols(f)),
        }
    }

    fn collect_symbols(&self, into: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Number(_) => {}
            Expr::Symbol(s) => {
                into.insert(s.clone());
            }
            Expr::Neg(inner) => inner.collect_symbols(into),
            Expr::Add(items) | Expr::Mul(items) | Expr::Call { args: items, .. } => {
                for item in items {
                    item.collect_symbols(into);
                }
            }
            Expr::Div(a, b) | Expr::Pow(a, b) | Expr::Equation(a, b) => {
                a.collect_symbols(into);
                b.collect_symbols(into);
            }
        }
    }

    /// Binding strength, used to decide where parentheses go
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Expr::Equation(..) => 0,
            Expr::Add(_) => 1,
            Expr::Neg(_) => 2,
            Expr::Number(v) if *v < 0.0 => 2,
            Expr::Mul(_) | Expr::Div(..) => 3,
            Expr::Pow(..) => 4,
            Expr::Number(_) | Expr::Symbol(_) | Expr::Call { .. } => 5,
        }
    }
}

impl Expression for Expr {
    fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn substitute(&self, symbol: &Symbol, replacement: &Self) -> Self {
        self.map_symbols(&|s: &Symbol| (s == symbol).then(|| replacement.clone()))
    }

    fn rename_symbols(&self, renames: &BTreeMap<Symbol, Symbol>) -> Self {
        self.map_symbols(&|s: &Symbol| renames.get(s).map(|to| Expr::Symbol(to.clone())))
    }
}

/// `0.5`, `2`; integral values print without a fraction part
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// ── Debug form ─────────────────────────────────────────────

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(v) => f.write_str(&format_number(*v)),
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::Neg(inner) => {
                f.write_str("-")?;
                write_operand(f, inner, inner.precedence() <= 2)
            }
            Expr::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    match (i, term) {
                        (0, _) => write!(f, "{}", term)?,
                        (_, Expr::Neg(inner)) => {
                            f.write_str(" - ")?;
                            write_operand(f, inner, inner.precedence() <= 2)?;
                        }
                        _ => write!(f, " + {}", term)?,
                    }
                }
                Ok(())
            }
            Expr::Mul(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    write_operand(f, factor, factor.precedence() < 3)?;
                }
                Ok(())
            }
            Expr::Div(n, d) => {
                write_operand(f, n, n.precedence() < 3)?;
                f.write_str("/")?;
                write_operand(f, d, d.precedence() <= 3)
            }
            Expr::Pow(b, e) => {
                write_operand(f, b, b.precedence() <= 4)?;
                f.write_str("^")?;
                write_operand(f, e, e.precedence() < 4)
            }
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Equation(l, r) => write!(f, "{} = {}", l, r),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}
