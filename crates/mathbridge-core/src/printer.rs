//! LaTeX printer for [`Expr`]
//!
//! Output mirrors what a CAS printer emits, which is what the display
//! pipeline expects to tidy up: implicit products are plain spaces
//! (`0.5 x`), exponents are always braced, and symbol names go out as
//! stored unless the override table says otherwise. A name the parser
//! would split into a product (`speed`, `x1`, `a,b`) goes out as
//! `\mathit{...}` so it reads back as one symbol.

use crate::expr::{format_number, Expr};
use crate::grammar::SymbolNames;
use crate::greek::is_greek;

pub fn print_latex(expr: &Expr, names: &SymbolNames) -> String {
    Printer { names }.print(expr)
}

struct Printer<'a> {
    names: &'a SymbolNames,
}

impl Printer<'_> {
    fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Number(v) => format_number(*v),
            Expr::Symbol(s) => self.symbol(s.name()),
            Expr::Neg(inner) => format!("-{}", self.operand(inner, inner.precedence() <= 2)),
            Expr::Add(terms) => {
                let mut out = String::new();
                for (i, term) in terms.iter().enumerate() {
                    match (i, term) {
                        (0, _) => out.push_str(&self.print(term)),
                        (_, Expr::Neg(inner)) => {
                            out.push_str(" - ");
                            out.push_str(&self.operand(inner, inner.precedence() <= 2));
                        }
                        _ => {
                            out.push_str(" + ");
                            out.push_str(&self.print(term));
                        }
                    }
                }
                out
            }
            Expr::Mul(factors) => {
                let mut out = String::new();
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        out.push_str(match factor {
                            Expr::Number(_) => r" \cdot ",
                            _ => " ",
                        });
                    }
                    out.push_str(&self.operand(factor, factor.precedence() < 3));
                }
                out
            }
            Expr::Div(n, d) => format!(r"\frac{{{}}}{{{}}}", self.print(n), self.print(d)),
            Expr::Pow(b, e) => format!(
                "{}^{{{}}}",
                self.operand(b, b.precedence() <= 4),
                self.print(e)
            ),
            Expr::Call { name, args } => self.call(name, args),
            Expr::Equation(l, r) => format!("{} = {}", self.print(l), self.print(r)),
        }
    }

    fn symbol(&self, name: &str) -> String {
        if let Some(markup) = self.names.get(name) {
            return markup.to_string();
        }
        if reads_back_bare(name) || !fits_opaque_text(name) {
            return name.to_string();
        }
        format!(r"\mathit{{{}}}", name)
    }

    fn call(&self, name: &str, args: &[Expr]) -> String {
        let printed: Vec<String> = args.iter().map(|a| self.print(a)).collect();
        let joined = printed.join(", ");
        match name {
            "exp" => format!("e^{{{}}}", joined),
            "sqrt" => format!(r"\sqrt{{{}}}", joined),
            _ => format!(r"\{}{{\left({}\right)}}", name, joined),
        }
    }

    fn operand(&self, expr: &Expr, parenthesize: bool) -> String {
        if parenthesize {
            format!(r"\left({}\right)", self.print(expr))
        } else {
            self.print(expr)
        }
    }
}

/// Single letter, Greek name, or either with a braced subscript
fn reads_back_bare(name: &str) -> bool {
    let letter_or_greek = |base: &str| {
        let mut chars = base.chars();
        let single = chars.next().is_some_and(|c| c.is_ascii_alphabetic()) && chars.next().is_none();
        single || is_greek(base)
    };
    if letter_or_greek(name) {
        return true;
    }
    match name.split_once("_{") {
        Some((base, rest)) => rest.ends_with('}') && letter_or_greek(base),
        None => false,
    }
}

/// The tokenizer reads `\mathit{...}` up to the first `}` and trims it
fn fits_opaque_text(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '\\'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_latex;

    fn print(expr: &Expr) -> String {
        print_latex(expr, &SymbolNames::default())
    }

    #[test]
    fn test_print_implicit_product_with_spaces() {
        let e = Expr::product(vec![Expr::num(0.5), Expr::sym("x")]);
        assert_eq!(print(&e), "0.5 x");
    }

    #[test]
    fn test_print_number_factor_gets_cdot() {
        let e = Expr::product(vec![Expr::sym("x"), Expr::num(2.0)]);
        assert_eq!(print(&e), r"x \cdot 2");
    }

    #[test]
    fn test_print_greek_whole_names_only() {
        assert_eq!(print(&Expr::sym("beta")), r"\beta");
        assert_eq!(print(&Expr::sym("beta_{r}")), "beta_{r}");
    }

    #[test]
    fn test_print_multi_letter_name_as_text() {
        assert_eq!(print(&Expr::sym("speed")), r"\mathit{speed}");
        assert_eq!(print(&Expr::sym("x1")), r"\mathit{x1}");
        assert_eq!(print(&Expr::sym("a,b")), r"\mathit{a,b}");
        assert_eq!(print(&Expr::sym("x_{rear}")), "x_{rear}");
        assert_eq!(print(&Expr::sym("E")), "E");
    }

    #[test]
    fn test_print_unrepresentable_name_unchanged() {
        assert_eq!(print(&Expr::sym("a b")), "a b");
        assert_eq!(print(&Expr::sym("q}")), "q}");
    }

    #[test]
    fn test_print_fraction_and_power() {
        let e = Expr::div(Expr::sym("A"), Expr::pow(Expr::sym("B"), Expr::num(2.0)));
        assert_eq!(print(&e), r"\frac{A}{B^{2}}");
    }

    #[test]
    fn test_print_exponential_as_power_of_e() {
        let e = Expr::call("exp", vec![Expr::neg(Expr::div(Expr::sym("A"), Expr::sym("B")))]);
        assert_eq!(print(&e), r"e^{-\frac{A}{B}}");
    }

    #[test]
    fn test_print_function_call() {
        let e = Expr::call("sin", vec![Expr::sym("x")]);
        assert_eq!(print(&e), r"\sin{\left(x\right)}");
    }

    #[test]
    fn test_print_grouped_sum_in_product() {
        let e = Expr::product(vec![
            Expr::sum(vec![Expr::sym("a"), Expr::sym("b")]),
            Expr::sum(vec![Expr::sym("c"), Expr::neg(Expr::sym("d"))]),
        ]);
        assert_eq!(print(&e), r"\left(a + b\right) \left(c - d\right)");
    }

    #[test]
    fn test_print_custom_override() {
        let mut names = SymbolNames::empty();
        names.insert("v_{0}", r"v_{\mathrm{0}}");
        assert_eq!(print_latex(&Expr::sym("v_{0}"), &names), r"v_{\mathrm{0}}");
        assert_eq!(print_latex(&Expr::sym("alpha"), &names), "alpha");
    }

    #[test]
    fn test_printed_output_parses_back() {
        let samples = [
            r"0.5 x",
            r"\frac{A}{B} + c^{2}",
            r"\sin{\left(x\right)} \cdot 3",
            r"\left(a + b\right)^{2}",
            r"e^{-\frac{t}{\tau}} k",
            r"F = m a",
            r"\mathit{speed} \cdot t",
            r"\mathit{a,b} + x_{1}",
        ];
        for s in samples {
            let expr = parse_latex(s).unwrap();
            let reparsed = parse_latex(&print(&expr)).unwrap();
            assert_eq!(expr, reparsed, "printer round trip failed for {:?}", s);
        }
    }
}
