//! The `Evaluator` collaborator interface and a minimal arithmetic
//! stand-in implementation.
//!
//! The real source-language parser and tree-walking interpreter are
//! external collaborators, out of scope for this runtime (see the crate
//! root docs). What is in scope is the narrow interface the worker actor
//! depends on: parse-and-evaluate source text, and invoke a named
//! `receive` handler with bound arguments. `ArithmeticEvaluator` below
//! satisfies exactly that interface with a four-operator expression
//! language, solely so the HTTP gateway's `/eval` path and the `10 + 5`
//! scenario are runnable end to end.

// Layer 1: Standard library
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

// Layer 2: Third-party
use serde_json::Value;

// Layer 3: Internal
use crate::error::WorkerError;
use crate::worker::ServerInitData;

/// A host-provided builtin, callable by name from evaluated `receive`
/// handler bodies — e.g. the `send` builtin [`crate::worker::WorkerActor`]
/// installs at `pre_start`.
///
/// Synchronous despite bridging to an inherently async operation: per
/// this trait's contract, evaluation runs on its own CPU-bound worker
/// thread, so a global is expected to block that thread (via
/// `tokio::task::block_in_place`) rather than return a future for the
/// interpreter to await — the stand-in language here has no `async`
/// concept to await one with.
pub type GlobalFn = Arc<dyn Fn(Vec<Value>) -> Result<Value, WorkerError> + Send + Sync>;

/// The interpreter-state collaborator a worker actor owns exclusively.
///
/// No method here is `async`: evaluation is assumed to be synchronous,
/// CPU-bound work performed inside the worker's per-message subordinate
/// task.
pub trait Evaluator: Send {
    /// Parse and evaluate `source`, returning the value of its final
    /// top-level expression.
    fn evaluate(&mut self, source: &str) -> Result<Value, WorkerError>;

    /// True if a `receive` handler named `name` is declared.
    fn has_handler(&self, name: &str) -> bool;

    /// Invoke a declared handler by name with arguments bound by
    /// parameter name. Fields present in `args` but not in the handler's
    /// signature are ignored; missing parameters are treated as absent
    /// (the real language binds them to `nil`).
    fn call_handler(&mut self, name: &str, args: HashMap<String, Value>) -> Result<Value, WorkerError>;

    /// Drain any `server { ... }` blocks declared during the most recent
    /// `evaluate` call, each requesting that the worker ask its
    /// supervisor to spawn a sibling actor for it.
    ///
    /// Defaults to no pending spawns: the arithmetic stand-in has no
    /// `server` syntax.
    fn take_pending_spawns(&mut self) -> Vec<ServerInitData> {
        Vec::new()
    }

    /// Install a callable global under `name`, reachable from a `receive`
    /// handler body evaluated afterward.
    ///
    /// Defaults to a no-op: the arithmetic stand-in has no notion of
    /// callable globals — it has no `receive` handlers to call one from
    /// in the first place (`has_handler` is always `false`).
    fn set_global(&mut self, _name: &str, _callback: GlobalFn) {}
}

/// A four-operator (`+ - * /`), parenthesized, integer-or-float
/// expression evaluator. Top-level expressions are separated by `;` or
/// newlines; the value of the last one is returned.
#[derive(Default)]
pub struct ArithmeticEvaluator;

impl ArithmeticEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for ArithmeticEvaluator {
    fn evaluate(&mut self, source: &str) -> Result<Value, WorkerError> {
        let mut last = Value::Null;
        for stmt in source.split(['\n', ';']) {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            let mut parser = ExprParser::new(stmt);
            let value = parser.parse_expr()?;
            parser.expect_end()?;
            last = value;
        }
        Ok(last)
    }

    fn has_handler(&self, _name: &str) -> bool {
        false
    }

    fn call_handler(&mut self, name: &str, _args: HashMap<String, Value>) -> Result<Value, WorkerError> {
        Err(WorkerError::UnknownHandler(name.to_string()))
    }
}

/// Recursive-descent parser/evaluator over `+ - * / ( )` and numeric
/// literals, combining parse and evaluate into one pass since the
/// arithmetic language has no deferred semantics worth separating.
struct ExprParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> ExprParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn expect_end(&mut self) -> Result<(), WorkerError> {
        self.skip_ws();
        match self.chars.peek() {
            None => Ok(()),
            Some(c) => Err(WorkerError::Parse(format!("unexpected trailing character '{c}'"))),
        }
    }

    fn parse_expr(&mut self) -> Result<Value, WorkerError> {
        let mut value = self.parse_term()?;
        loop {
            self.skip_ws();
            match self.chars.peek() {
                Some('+') => {
                    self.chars.next();
                    let rhs = self.parse_term()?;
                    value = numeric_op(value, rhs, |a, b| a + b)?;
                }
                Some('-') => {
                    self.chars.next();
                    let rhs = self.parse_term()?;
                    value = numeric_op(value, rhs, |a, b| a - b)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<Value, WorkerError> {
        let mut value = self.parse_factor()?;
        loop {
            self.skip_ws();
            match self.chars.peek() {
                Some('*') => {
                    self.chars.next();
                    let rhs = self.parse_factor()?;
                    value = numeric_op(value, rhs, |a, b| a * b)?;
                }
                Some('/') => {
                    self.chars.next();
                    let rhs = self.parse_factor()?;
                    let divisor = as_f64(&rhs)?;
                    if divisor == 0.0 {
                        return Err(WorkerError::Eval("division by zero".to_string()));
                    }
                    value = numeric_op(value, rhs, |a, b| a / b)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> Result<Value, WorkerError> {
        self.skip_ws();
        match self.chars.peek() {
            Some('(') => {
                self.chars.next();
                let value = self.parse_expr()?;
                self.skip_ws();
                match self.chars.next() {
                    Some(')') => Ok(value),
                    _ => Err(WorkerError::Parse("expected closing ')'".to_string())),
                }
            }
            Some('-') => {
                self.chars.next();
                let value = self.parse_factor()?;
                numeric_op(Value::from(0i64), value, |_, b| -b)
            }
            Some(c) if c.is_ascii_digit() || *c == '.' => self.parse_number(),
            Some(c) => Err(WorkerError::Parse(format!("unexpected character '{c}'"))),
            None => Err(WorkerError::Parse("unexpected end of input".to_string())),
        }
    }

    fn parse_number(&mut self) -> Result<Value, WorkerError> {
        let mut buf = String::new();
        let mut is_float = false;
        while let Some(c) = self.chars.peek() {
            if c.is_ascii_digit() {
                buf.push(*c);
                self.chars.next();
            } else if *c == '.' && !is_float {
                is_float = true;
                buf.push(*c);
                self.chars.next();
            } else {
                break;
            }
        }
        if buf.is_empty() {
            return Err(WorkerError::Parse("expected a number".to_string()));
        }
        if is_float {
            buf.parse::<f64>()
                .map(|f| Value::from(f))
                .map_err(|e| WorkerError::Parse(e.to_string()))
        } else {
            buf.parse::<i64>()
                .map(|i| Value::from(i))
                .map_err(|e| WorkerError::Parse(e.to_string()))
        }
    }
}

fn as_f64(v: &Value) -> Result<f64, WorkerError> {
    v.as_f64().ok_or_else(|| WorkerError::Eval(format!("not a number: {v}")))
}

fn numeric_op(a: Value, b: Value, op: impl Fn(f64, f64) -> f64) -> Result<Value, WorkerError> {
    let result = op(as_f64(&a)?, as_f64(&b)?);
    let both_int = a.is_i64() && b.is_i64() && result.fract() == 0.0;
    if both_int {
        Ok(Value::from(result as i64))
    } else {
        Ok(Value::from(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_simple_addition() {
        let mut ev = ArithmeticEvaluator::new();
        let result = ev.evaluate("10 + 5").expect("evaluates");
        assert_eq!(result, Value::from(15));
    }

    #[test]
    fn respects_operator_precedence() {
        let mut ev = ArithmeticEvaluator::new();
        let result = ev.evaluate("2 + 3 * 4").expect("evaluates");
        assert_eq!(result, Value::from(14));
    }

    #[test]
    fn respects_parentheses() {
        let mut ev = ArithmeticEvaluator::new();
        let result = ev.evaluate("(2 + 3) * 4").expect("evaluates");
        assert_eq!(result, Value::from(20));
    }

    #[test]
    fn handles_floats() {
        let mut ev = ArithmeticEvaluator::new();
        let result = ev.evaluate("1.5 + 2.5").expect("evaluates");
        assert_eq!(result, Value::from(4.0));
    }

    #[test]
    fn division_by_zero_is_an_eval_error() {
        let mut ev = ArithmeticEvaluator::new();
        let err = ev.evaluate("1 / 0").unwrap_err();
        assert!(matches!(err, WorkerError::Eval(_)));
    }

    #[test]
    fn malformed_source_is_a_parse_error() {
        let mut ev = ArithmeticEvaluator::new();
        let err = ev.evaluate("1 + ").unwrap_err();
        assert!(matches!(err, WorkerError::Parse(_)));
    }

    #[test]
    fn multiple_statements_return_the_last_value() {
        let mut ev = ArithmeticEvaluator::new();
        let result = ev.evaluate("1 + 1\n2 + 2").expect("evaluates");
        assert_eq!(result, Value::from(4));
    }

    #[test]
    fn negative_numbers_and_unary_minus() {
        let mut ev = ArithmeticEvaluator::new();
        let result = ev.evaluate("-5 + 10").expect("evaluates");
        assert_eq!(result, Value::from(5));
    }

    #[test]
    fn has_handler_is_always_false_for_the_stand_in() {
        let ev = ArithmeticEvaluator::new();
        assert!(!ev.has_handler("anything"));
    }

    #[test]
    fn call_handler_is_always_unknown_for_the_stand_in() {
        let mut ev = ArithmeticEvaluator::new();
        let err = ev.call_handler("inc", HashMap::new()).unwrap_err();
        assert!(matches!(err, WorkerError::UnknownHandler(_)));
    }
}
