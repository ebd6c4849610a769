//! Foreign bridge capability and a JSON reference bridge
//!
//! A foreign system usually accepts only plain identifiers as symbol names,
//! which is why stores export through their alias bijection.

use serde_json::{json, Map, Value};

use crate::expr::Expr;
use crate::symbol::Symbol;
use crate::{Error, Result};

/// Converts expressions to and from another symbolic-algebra system
pub trait ForeignBridge<E> {
    type Value;

    /// # Errors
    /// Returns `ForeignError` when the expression cannot be represented.
    fn to_foreign(&self, expr: &E) -> Result<Self::Value>;

    /// # Errors
    /// Returns `ForeignError` for values that do not describe an expression.
    fn from_foreign(&self, value: &Self::Value) -> Result<E>;
}

/// Bridge to a JSON expression tree
///
/// ```text
/// {"num": 0.5}   {"sym": "a"}   {"fn": "exp", "args": [...]}
/// {"op": "add" | "mul" | "div" | "pow" | "neg" | "eq", "args": [...]}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBridge;

/// `[A-Za-z][A-Za-z0-9]*`
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric())
}

impl ForeignBridge<Expr> for JsonBridge {
    type Value = Value;

    fn to_foreign(&self, expr: &Expr) -> Result<Value> {
        let all = |items: &[Expr]| items.iter().map(|e| self.to_foreign(e)).collect::<Result<Vec<_>>>();
        let value = match expr {
            Expr::Number(v) => json!({ "num": v }),
            Expr::Symbol(s) => {
                if !is_plain_identifier(s.name()) {
                    return Err(Error::ForeignError(format!(
                        "symbol '{}' is not a plain identifier",
                        s
                    )));
                }
                json!({ "sym": s.name() })
            }
            Expr::Neg(inner) => op("neg", vec![self.to_foreign(inner)?]),
            Expr::Add(terms) => op("add", all(terms)?),
            Expr::Mul(factors) => op("mul", all(factors)?),
            Expr::Div(n, d) => op("div", vec![self.to_foreign(n)?, self.to_foreign(d)?]),
            Expr::Pow(b, e) => op("pow", vec![self.to_foreign(b)?, self.to_foreign(e)?]),
            Expr::Equation(l, r) => op("eq", vec![self.to_foreign(l)?, self.to_foreign(r)?]),
            Expr::Call { name, args } => json!({ "fn": name, "args": all(args)? }),
        };
        Ok(value)
    }

    fn from_foreign(&self, value: &Value) -> Result<Expr> {
        let object = value
            .as_object()
            .ok_or_else(|| malformed("expected an object", value))?;

        if let Some(num) = object.get("num") {
            return num
                .as_f64()
                .map(Expr::Number)
                .ok_or_else(|| malformed("'num' is not a number", value));
        }
        if let Some(sym) = object.get("sym") {
            return sym
                .as_str()
                .map(|name| Expr::Symbol(Symbol::new(name)))
                .ok_or_else(|| malformed("'sym' is not a string", value));
        }

        let mut args = self.args(object, value)?;
        if let Some(name) = object.get("fn") {
            let name = name
                .as_str()
                .ok_or_else(|| malformed("'fn' is not a string", value))?;
            return Ok(Expr::call(name, args));
        }

        let name = object
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing 'num', 'sym', 'fn' or 'op'", value))?;
        match (name, args.len()) {
            ("add", n) if n >= 2 => Ok(Expr::Add(args)),
            ("mul", n) if n >= 2 => Ok(Expr::Mul(args)),
            ("neg", 1) => Ok(Expr::neg(args.remove(0))),
            ("div", 2) | ("pow", 2) | ("eq", 2) => {
                let rhs = args.remove(1);
                let lhs = args.remove(0);
                Ok(match name {
                    "div" => Expr::div(lhs, rhs),
                    "pow" => Expr::pow(lhs, rhs),
                    _ => Expr::equation(lhs, rhs),
                })
            }
            (_, n) => Err(malformed(
                &format!("bad operator '{}' with {} arguments", name, n),
                value,
            )),
        }
    }
}

impl JsonBridge {
    fn args(&self, object: &Map<String, Value>, value: &Value) -> Result<Vec<Expr>> {
        match object.get("args") {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().map(|item| self.from_foreign(item)).collect(),
            Some(_) => Err(malformed("'args' is not an array", value)),
        }
    }
}

fn op(name: &str, args: Vec<Value>) -> Value {
    json!({ "op": name, "args": args })
}

fn malformed(reason: &str, value: &Value) -> Error {
    Error::ForeignError(format!("malformed value ({}): {}", reason, value))
}
