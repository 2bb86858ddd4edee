//! Guard expressions.
//!
//! The condition language transitions and `if` arms are written in:
//!
//! - `ctx.field` / `ctx.a.b.c` - datamodel access (truthy check)
//! - `_event.name`, `_event.data.x` - the event being processed
//! - `==` `!=` `>` `>=` `<` `<=` - comparison against a literal
//! - `!expr`, `expr && expr`, `expr || expr`, `(expr)`
//!
//! Examples: `ctx.count < 3`, `_event.data.code == "retry" && !ctx.busy`.

use crate::error::SimError;
use crate::event::Event;
use serde_json::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// A parsed guard expression.
#[derive(Debug, Clone)]
pub enum GuardExpr {
    /// Path resolves to a truthy value.
    Truthy(String),
    /// Path compared against a literal.
    Cmp {
        path: String,
        op: CmpOp,
        value: Value,
    },
    Not(Box<GuardExpr>),
    And(Box<GuardExpr>, Box<GuardExpr>),
    Or(Box<GuardExpr>, Box<GuardExpr>),
}

/// What a guard reads: the datamodel and the current event.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub data: &'a Value,
    pub event: Option<&'a Event>,
}

impl<'a> Scope<'a> {
    /// Resolves a dotted path against the scope; unknown segments yield
    /// null.
    pub fn lookup(&self, path: &str) -> Value {
        let mut segments = path.split('.');
        let mut current = match segments.next() {
            Some("ctx") => self.data.clone(),
            Some("_event") => match self.event {
                Some(event) => serde_json::json!({
                    "name": event.name,
                    "data": event.data,
                }),
                None => Value::Null,
            },
            _ => return Value::Null,
        };
        for segment in segments {
            current = match current {
                Value::Object(mut map) => map.remove(segment).unwrap_or(Value::Null),
                _ => return Value::Null,
            };
        }
        current
    }
}

impl GuardExpr {
    /// Parses a guard expression.
    pub fn parse(input: &str) -> Result<Self, SimError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid("empty expression"));
        }
        let mut parser = Parser { input, pos: 0 };
        let expr = parser.parse_or()?;
        parser.skip_ws();
        if parser.pos != parser.input.len() {
            return Err(invalid(format!(
                "trailing input at byte {}",
                parser.pos
            )));
        }
        Ok(expr)
    }

    /// Evaluates the guard in `scope`.
    pub fn eval(&self, scope: Scope<'_>) -> bool {
        match self {
            GuardExpr::Truthy(path) => truthy(&scope.lookup(path)),
            GuardExpr::Cmp { path, op, value } => compare(&scope.lookup(path), *op, value),
            GuardExpr::Not(inner) => !inner.eval(scope),
            GuardExpr::And(a, b) => a.eval(scope) && b.eval(scope),
            GuardExpr::Or(a, b) => a.eval(scope) || b.eval(scope),
        }
    }
}

fn invalid(reason: impl Into<String>) -> SimError {
    SimError::InvalidGuard {
        reason: reason.into(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn compare(lhs: &Value, op: CmpOp, rhs: &Value) -> bool {
    match op {
        CmpOp::Eq => loose_eq(lhs, rhs),
        CmpOp::Ne => !loose_eq(lhs, rhs),
        CmpOp::Gt | CmpOp::Ge | CmpOp::Lt | CmpOp::Le => {
            let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
                return false;
            };
            match op {
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
                _ => unreachable!(),
            }
        }
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
        _ => a == b,
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_or(&mut self) -> Result<GuardExpr, SimError> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_ws();
            if !self.eat("||") {
                return Ok(left);
            }
            let right = self.parse_and()?;
            left = GuardExpr::Or(Box::new(left), Box::new(right));
        }
    }

    fn parse_and(&mut self) -> Result<GuardExpr, SimError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_ws();
            if !self.eat("&&") {
                return Ok(left);
            }
            let right = self.parse_unary()?;
            left = GuardExpr::And(Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<GuardExpr, SimError> {
        self.skip_ws();
        if self.eat("!") {
            let inner = self.parse_unary()?;
            return Ok(GuardExpr::Not(Box::new(inner)));
        }
        if self.eat("(") {
            let expr = self.parse_or()?;
            self.skip_ws();
            if !self.eat(")") {
                return Err(invalid("expected ')'"));
            }
            return Ok(expr);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<GuardExpr, SimError> {
        let path = self.parse_path()?;
        self.skip_ws();

        let op = [
            ("==", CmpOp::Eq),
            ("!=", CmpOp::Ne),
            (">=", CmpOp::Ge),
            ("<=", CmpOp::Le),
            (">", CmpOp::Gt),
            ("<", CmpOp::Lt),
        ]
        .into_iter()
        .find(|(tok, _)| self.eat(tok));

        match op {
            None => Ok(GuardExpr::Truthy(path)),
            Some((_, op)) => {
                self.skip_ws();
                let value = self.parse_literal()?;
                Ok(GuardExpr::Cmp { path, op, value })
            }
        }
    }

    fn parse_path(&mut self) -> Result<String, SimError> {
        let rest = &self.input[self.pos..];
        let root = if rest.starts_with("ctx.") {
            "ctx."
        } else if rest.starts_with("_event.") {
            "_event."
        } else {
            return Err(invalid("path must start with 'ctx.' or '_event.'"));
        };
        let start = self.pos;
        self.pos += root.len();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let path = &self.input[start..self.pos];
        if path.len() == root.len() || path.ends_with('.') {
            return Err(invalid(format!("incomplete path '{}'", path)));
        }
        Ok(path.to_string())
    }

    fn parse_literal(&mut self) -> Result<Value, SimError> {
        let rest = &self.input[self.pos..];
        for (token, value) in [
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("null", Value::Null),
        ] {
            if rest.starts_with(token) {
                self.pos += token.len();
                return Ok(value);
            }
        }
        if rest.starts_with('"') {
            return self.parse_string();
        }
        self.parse_number()
    }

    fn parse_string(&mut self) -> Result<Value, SimError> {
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '"' {
                let s = self.input[start..self.pos].to_string();
                self.pos += 1;
                return Ok(Value::String(s));
            }
            self.pos += c.len_utf8();
        }
        Err(invalid("unterminated string"))
    }

    fn parse_number(&mut self) -> Result<Value, SimError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        let number: f64 = text
            .parse()
            .map_err(|_| invalid(format!("expected literal, found '{}'", text)))?;
        serde_json::Number::from_f64(number)
            .map(Value::Number)
            .ok_or_else(|| invalid(format!("non-finite number '{}'", text)))
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.input[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expr: &str, data: Value) -> bool {
        GuardExpr::parse(expr)
            .unwrap()
            .eval(Scope {
                data: &data,
                event: None,
            })
    }

    fn eval_with_event(expr: &str, data: Value, event: &Event) -> bool {
        GuardExpr::parse(expr)
            .unwrap()
            .eval(Scope {
                data: &data,
                event: Some(event),
            })
    }

    #[test]
    fn test_truthy() {
        assert!(eval("ctx.on", json!({"on": true})));
        assert!(!eval("ctx.on", json!({"on": false})));
        assert!(!eval("ctx.on", json!({})));
        assert!(eval("ctx.items", json!({"items": [1]})));
        assert!(!eval("ctx.items", json!({"items": []})));
    }

    #[test]
    fn test_nested_path() {
        assert!(eval("ctx.order.paid", json!({"order": {"paid": true}})));
        assert!(!eval("ctx.order.paid", json!({"order": {}})));
    }

    #[test]
    fn test_comparisons() {
        assert!(eval("ctx.n == 3", json!({"n": 3})));
        assert!(eval("ctx.n != 4", json!({"n": 3})));
        assert!(eval("ctx.n >= 3", json!({"n": 3})));
        assert!(eval("ctx.n < 10", json!({"n": 3})));
        assert!(!eval("ctx.n > 10", json!({"n": 3})));
        assert!(eval("ctx.tag == \"go\"", json!({"tag": "go"})));
        assert!(eval("ctx.gone == null", json!({})));
        assert!(eval("ctx.t > -2.5", json!({"t": 0})));
    }

    #[test]
    fn test_comparison_against_non_number() {
        assert!(!eval("ctx.n > 1", json!({"n": "nope"})));
        assert!(!eval("ctx.n > 1", json!({})));
    }

    #[test]
    fn test_boolean_operators_and_precedence() {
        let data = json!({"a": true, "b": false, "c": true});
        assert!(eval("ctx.a && ctx.c", data.clone()));
        assert!(eval("ctx.b || ctx.c", data.clone()));
        assert!(!eval("!ctx.a", data.clone()));
        // && binds tighter than ||.
        assert!(eval("ctx.b && ctx.c || ctx.a", data.clone()));
        assert!(!eval("(ctx.a || ctx.b) && ctx.b", data));
    }

    #[test]
    fn test_event_access() {
        let event = Event::with_data("pay.ok", json!({"amount": 50}));
        assert!(eval_with_event(
            "_event.name == \"pay.ok\"",
            json!({}),
            &event
        ));
        assert!(eval_with_event("_event.data.amount >= 50", json!({}), &event));
        // Without an event the path is null.
        assert!(!eval("_event.name == \"pay.ok\"", json!({})));
    }

    #[test]
    fn test_parse_errors() {
        assert!(GuardExpr::parse("").is_err());
        assert!(GuardExpr::parse("foo.bar").is_err());
        assert!(GuardExpr::parse("ctx.").is_err());
        assert!(GuardExpr::parse("(ctx.a && ctx.b").is_err());
        assert!(GuardExpr::parse("ctx.a == \"open").is_err());
        assert!(GuardExpr::parse("ctx.a == nope").is_err());
        assert!(GuardExpr::parse("ctx.a ctx.b").is_err());
    }
}
