//! Markup parser — tokenizer and recursive descent parser
//!
//! Converts normalized LaTeX markup into an [`Expr`].
//!
//! ```text
//! equation := sum ('=' sum)?
//! sum      := ('+' | '-')? term (('+' | '-') term)*
//! term     := signed (('*' | '/') signed | power)*      // juxtaposition multiplies
//! signed   := '-' signed | power
//! power    := script ('^' argument)?
//! script   := primary ('_' argument)?
//! argument := '{' sum '}' | primary
//! ```
//!
//! A subscript never multiplies: `x_{ab}` is the single symbol named
//! `x_{a*b}`, built from the debug form of the subscript expression.

pub mod tokenizer;

use crate::expr::Expr;
use crate::greek::is_greek;
use crate::{Error, Result};
use tokenizer::{Span, SpannedToken, Token, Tokenizer};

/// Functions written as `\name` followed by their argument
const FUNCTIONS: &[&str] = &[
    "exp", "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "ln", "log",
];

/// Parse markup into an expression tree
///
/// # Errors
/// Returns `ParseError` with line:column for syntax violations, including
/// any comma.
pub fn parse_latex(input: &str) -> Result<Expr> {
    let tokens = Tokenizer::new(input).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_equation()?;
    parser.expect(Token::Eof)?;
    Ok(expr)
}

struct Parser {
    /// Always ends with `Token::Eof`
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    // ── Token helpers ──────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn span(&self) -> &Span {
        &self.tokens[self.pos].span
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self) -> Error {
        Error::ParseError(format!("Unexpected {} at {}", self.peek(), self.span()))
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if *self.peek() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn starts_factor(&self) -> bool {
        matches!(
            self.peek(),
            Token::Number(_)
                | Token::Letter(_)
                | Token::Text(_)
                | Token::Command(_)
                | Token::LParen
                | Token::LBrace
        )
    }

    // ── Grammar rules ──────────────────────────────────────

    fn parse_equation(&mut self) -> Result<Expr> {
        let lhs = self.parse_sum()?;
        if *self.peek() != Token::Equals {
            return Ok(lhs);
        }
        self.advance();
        let rhs = self.parse_sum()?;
        Ok(Expr::equation(lhs, rhs))
    }

    fn parse_sum(&mut self) -> Result<Expr> {
        let first = match self.peek() {
            Token::Minus => {
                self.advance();
                Expr::neg(self.parse_term()?)
            }
            Token::Plus => {
                self.advance();
                self.parse_term()?
            }
            _ => self.parse_term()?,
        };

        let mut terms = vec![first];
        loop {
            match self.peek() {
                Token::Plus => {
                    self.advance();
                    terms.push(self.parse_term()?);
                }
                Token::Minus => {
                    self.advance();
                    terms.push(Expr::neg(self.parse_term()?));
                }
                _ => break,
            }
        }
        Ok(Expr::sum(terms))
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut factors = vec![self.parse_signed()?];
        loop {
            match self.peek() {
                Token::Star => {
                    self.advance();
                    factors.push(self.parse_signed()?);
                }
                Token::Slash => {
                    self.advance();
                    let denominator = self.parse_signed()?;
                    let numerator = Expr::product(std::mem::take(&mut factors));
                    factors.push(Expr::div(numerator, denominator));
                }
                _ if self.starts_factor() => factors.push(self.parse_power()?),
                _ => break,
            }
        }
        Ok(Expr::product(factors))
    }

    fn parse_signed(&mut self) -> Result<Expr> {
        if *self.peek() == Token::Minus {
            self.advance();
            return Ok(Expr::neg(self.parse_signed()?));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_script()?;
        if *self.peek() != Token::Caret {
            return Ok(base);
        }
        self.advance();
        let exponent = self.parse_argument()?;

        // `e^{x}` is the exponential function, a bare `e` stays a symbol.
        if base == Expr::sym("e") {
            return Ok(Expr::call("exp", vec![exponent]));
        }
        Ok(Expr::pow(base, exponent))
    }

    fn parse_script(&mut self) -> Result<Expr> {
        let span = self.span().clone();
        let base = self.parse_primary()?;
        if *self.peek() != Token::Underscore {
            return Ok(base);
        }

        let Expr::Symbol(name) = base else {
            return Err(Error::ParseError(format!(
                "Subscript needs a symbol base at {}",
                span
            )));
        };
        self.advance();
        let subscript = match self.parse_argument()? {
            Expr::Symbol(s) => s.into_name(),
            other => other.to_string(),
        };
        Ok(Expr::sym(&format!("{}_{{{}}}", name, subscript)))
    }

    /// Script or `\frac` argument: a braced group or a single primary
    fn parse_argument(&mut self) -> Result<Expr> {
        if *self.peek() == Token::LBrace {
            return self.parse_group();
        }
        self.parse_primary()
    }

    fn parse_group(&mut self) -> Result<Expr> {
        self.expect(Token::LBrace)?;
        let inner = self.parse_sum()?;
        self.expect(Token::RBrace)?;
        Ok(inner)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.span().clone();
        match self.peek().clone() {
            Token::Number(text) => {
                self.advance();
                let value: f64 = text.parse().map_err(|_| {
                    Error::ParseError(format!("Invalid number '{}' at {}", text, span))
                })?;
                Ok(Expr::num(value))
            }
            Token::Letter(c) => {
                self.advance();
                Ok(Expr::sym(&c.to_string()))
            }
            Token::Text(text) => {
                self.advance();
                Ok(Expr::sym(&text))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_sum()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBrace => self.parse_group(),
            Token::Command(name) => {
                self.advance();
                self.parse_command(&name, &span)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_command(&mut self, name: &str, span: &Span) -> Result<Expr> {
        match name {
            n if is_greek(n) => Ok(Expr::sym(n)),
            "frac" => {
                let numerator = self.parse_argument()?;
                let denominator = self.parse_argument()?;
                Ok(Expr::div(numerator, denominator))
            }
            "sqrt" => Ok(Expr::call("sqrt", vec![self.parse_argument()?])),
            n if FUNCTIONS.contains(&n) => {
                let arg = match self.peek() {
                    Token::LParen | Token::LBrace => self.parse_primary()?,
                    _ => self.parse_power()?,
                };
                Ok(Expr::call(n, vec![arg]))
            }
            _ => Err(Error::ParseError(format!(
                "Unknown command '\\{}' at {}",
                name, span
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Expr {
        parse_latex(input).unwrap()
    }

    fn parse_err(input: &str) -> String {
        parse_latex(input).unwrap_err().to_string()
    }

    #[test]
    fn test_parse_implicit_product() {
        assert_eq!(
            parse("0.5 x y"),
            Expr::Mul(vec![Expr::num(0.5), Expr::sym("x"), Expr::sym("y")])
        );
        assert_eq!(parse("ab").to_string(), "a*b");
    }

    #[test]
    fn test_parse_operator_precedence() {
        assert_eq!(parse(r"a + b \cdot c^{2}").to_string(), "a + b*c^2");
        assert_eq!(parse(r"-a - b").to_string(), "-a - b");
        assert_eq!(parse("a / b c").to_string(), "a/b*c");
    }

    #[test]
    fn test_parse_fraction_and_sqrt() {
        assert_eq!(parse(r"\frac{1}{2} x").to_string(), "1/2*x");
        assert_eq!(parse(r"\sqrt{x + 1}").to_string(), "sqrt(x + 1)");
    }

    #[test]
    fn test_parse_subscripted_symbols() {
        assert_eq!(parse("x_1"), Expr::sym("x_{1}"));
        assert_eq!(parse("x_{r}"), Expr::sym("x_{r}"));
        assert_eq!(parse(r"E_{\mathit{rear}}"), Expr::sym("E_{rear}"));
        assert_eq!(parse(r"\beta_{0}"), Expr::sym("beta_{0}"));
    }

    #[test]
    fn test_unprotected_subscript_reads_as_product() {
        assert_eq!(parse("x_{ab}"), Expr::sym("x_{a*b}"));
    }

    #[test]
    fn test_parse_greek_symbols() {
        assert_eq!(parse(r"\alpha \Omega").to_string(), "alpha*Omega");
    }

    #[test]
    fn test_parse_exponential_forms() {
        let call = parse(r"\exp(-\frac{A}{B}) \cdot x");
        assert_eq!(call.to_string(), "exp(-A/B)*x");
        assert_eq!(parse("e^{x}"), Expr::call("exp", vec![Expr::sym("x")]));
        assert_eq!(parse("e"), Expr::sym("e"));
    }

    #[test]
    fn test_parse_functions() {
        assert_eq!(parse(r"\sin{\left(x\right)}").to_string(), "sin(x)");
        assert_eq!(parse(r"\cos x").to_string(), "cos(x)");
        assert_eq!(parse(r"\ln(x + 1)").to_string(), "ln(x + 1)");
    }

    #[test]
    fn test_parse_equation() {
        assert_eq!(parse(r"F = m a").to_string(), "F = m*a");
    }

    #[test]
    fn test_parse_power_of_group() {
        assert_eq!(parse(r"\left(a + b\right)^{2}").to_string(), "(a + b)^2");
        assert_eq!(parse("x^23").to_string(), "x^2*3");
    }

    #[test]
    fn test_comma_rejected_with_position() {
        let err = parse_err("r_{sum,j}");
        assert_eq!(err, "Parse error: Unexpected ',' at 1:7");
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(parse_err(r"\foo x").contains("Unknown command '\\foo' at 1:1"));
    }

    #[test]
    fn test_unbalanced_input_rejected() {
        assert!(parse_err("(a + b").contains("Unexpected end of input"));
        assert!(parse_err("a + b)").contains("Unexpected ')'"));
        assert!(parse_err("").contains("Unexpected end of input at 1:1"));
    }

    #[test]
    fn test_subscript_on_group_rejected() {
        assert!(parse_err("(a + b)_1").contains("Subscript needs a symbol base"));
    }

    #[test]
    fn test_parse_determinism_100_iterations() {
        let input = r"\exp(-\frac{A}{B}) \cdot x_{\mathit{rear}} + 0.5 \beta^{2}";
        let first = parse(input);

        for i in 0..100 {
            assert_eq!(first, parse(input), "Determinism failure at iteration {}", i);
        }
    }
}
