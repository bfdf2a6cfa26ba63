//! Dynamic expressions used in template paths and collection predicates.
//!
//! Expressions are compiled once per distinct (preprocessed) source text and
//! cached by the owning [`ExpressionEngine`]:
//!
//! ```text
//! "language is \"fr\""
//!     │ preprocess
//!     ▼
//! "language == (\"fr\") ? (\"fr\") : \"\""
//!     │ parse (nom)          cache hit ──► Arc<Program>
//!     ▼
//! Program ──► evaluate(Context) ──► Value
//! ```

mod ast;
mod error;
mod parser;
mod value;

use ast::{BinaryOperator, Expression, UnaryOperator};
pub use error::ExprError;
use parser::parse_expression;
pub use value::{Record, Value};

use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, LazyLock};

/// Variables visible to an expression.
pub type Context = FxHashMap<String, Value>;

/// `IDENT is EXPR` evaluates to `EXPR` when equal, `""` otherwise.
static RE_IS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s+is\s+(.+?)\s*$").unwrap()
});

/// `IDENT except EXPR` evaluates to `IDENT` unless equal, `""` otherwise.
static RE_EXCEPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s+except\s+(.+?)\s*$").unwrap()
});

/// A bare `is` / `except` left over after preprocessing.
static RE_SUGAR_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(is|except)\s").unwrap());

/// Rewrite the `is` / `except` sugar into plain conditionals.
///
/// The sugar always spans the whole expression: in `language is "fr" or
/// language is "en"` the right-hand side is `"fr" or language is "en"`, which
/// does not parse. Combine conditions with `==` and `!=` instead.
pub fn preprocess(text: &str) -> String {
    if let Some(caps) = RE_IS.captures(text) {
        return format!(r#"{} == ({}) ? ({}) : """#, &caps[1], &caps[2], &caps[2]);
    }
    if let Some(caps) = RE_EXCEPT.captures(text) {
        return format!(r#"{} != ({}) ? {} : """#, &caps[1], &caps[2], &caps[1]);
    }
    text.trim().to_owned()
}

/// A compiled expression.
#[derive(Debug)]
pub struct Program {
    /// Text as written by the user, used in error messages.
    pub text: String,
    /// Text after preprocessing, the cache key.
    pub source: String,
    pub expression: Expression,
}

/// Compiles, caches and evaluates expressions.
///
/// The cache never evicts. Concurrent compiles of the same text may both parse,
/// but only the first inserted program is ever handed out.
#[derive(Debug, Default)]
pub struct ExpressionEngine {
    cache: RwLock<FxHashMap<String, Arc<Program>>>,
}

impl ExpressionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&self, text: &str) -> Result<Arc<Program>, ExprError> {
        let source = preprocess(text);

        if let Some(program) = self.cache.read().get(&source) {
            return Ok(Arc::clone(program));
        }

        let expression = parse_expression(&source).map_err(|err| match err {
            ExprError::Invalid { reason, .. } if RE_SUGAR_WORD.is_match(&source) => {
                ExprError::invalid(
                    text,
                    format!(
                        "{reason} (`is` and `except` apply to the whole expression, \
                         combine conditions with `==` and `!=`)"
                    ),
                )
            }
            ExprError::Invalid { reason, .. } => ExprError::invalid(text, reason),
            other => other,
        })?;

        let program = Arc::new(Program {
            text: text.to_owned(),
            source: source.clone(),
            expression,
        });

        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.entry(source).or_insert(program)))
    }

    pub fn evaluate(&self, program: &Program, context: &Context) -> Result<Value, ExprError> {
        Evaluator {
            text: &program.text,
            context,
        }
        .eval(&program.expression)
    }

    /// Compile then evaluate.
    pub fn eval(&self, text: &str, context: &Context) -> Result<Value, ExprError> {
        let program = self.compile(text)?;
        self.evaluate(&program, context)
    }

    /// Evaluate an expression that must produce a boolean.
    pub fn eval_bool(&self, text: &str, context: &Context) -> Result<bool, ExprError> {
        match self.eval(text, context)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExprError::evaluation(
                text,
                format!("expected a boolean, got {}", other.type_name()),
            )),
        }
    }

    /// Number of distinct compiled programs.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

// ============================================================================
// Evaluation
// ============================================================================

struct Evaluator<'a> {
    text: &'a str,
    context: &'a Context,
}

impl Evaluator<'_> {
    fn error(&self, reason: impl Into<String>) -> ExprError {
        ExprError::evaluation(self.text, reason)
    }

    fn eval(&self, expr: &Expression) -> Result<Value, ExprError> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Variable(name) => self
                .context
                .get(name)
                .cloned()
                .ok_or_else(|| self.error(format!("unknown variable `{name}`"))),
            Expression::Member { target, field } => match self.eval(target)? {
                Value::Nil => Ok(Value::Nil),
                Value::Record(record) => match field.as_str() {
                    "id" if !record.fields.contains_key("id") => Ok(Value::String(record.id)),
                    _ => record.fields.get(field).cloned().ok_or_else(|| {
                        self.error(format!("`{}` has no field `{field}`", record.id))
                    }),
                },
                other => Err(self.error(format!(
                    "cannot access `{field}` on a {}",
                    other.type_name()
                ))),
            },
            Expression::Unary { op, expr } => {
                let value = self.eval(expr)?;
                match op {
                    UnaryOperator::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOperator::Minus => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(self.error(format!(
                            "cannot negate a {}",
                            other.type_name()
                        ))),
                    },
                }
            }
            Expression::Binary { left, op, right } => self.binary(left, *op, right),
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    fn binary(
        &self,
        left: &Expression,
        op: BinaryOperator,
        right: &Expression,
    ) -> Result<Value, ExprError> {
        // short-circuit before evaluating the right side
        match op {
            BinaryOperator::Or => {
                let result = self.eval(left)?.is_truthy() || self.eval(right)?.is_truthy();
                return Ok(Value::Bool(result));
            }
            BinaryOperator::And => {
                let result = self.eval(left)?.is_truthy() && self.eval(right)?.is_truthy();
                return Ok(Value::Bool(result));
            }
            _ => {}
        }

        let lhs = self.eval(left)?;
        let rhs = self.eval(right)?;

        match op {
            BinaryOperator::Equals => Ok(Value::Bool(lhs.loosely_equals(&rhs))),
            BinaryOperator::NotEquals => Ok(Value::Bool(!lhs.loosely_equals(&rhs))),
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => self.compare(&lhs, op, &rhs),
            BinaryOperator::In => self.contains(&rhs, &lhs),
            BinaryOperator::Plus => match (&lhs, &rhs) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                _ => match (lhs.stringify(), rhs.stringify()) {
                    (Some(a), Some(b)) => Ok(Value::String(a + &b)),
                    _ => Err(self.mismatch(&lhs, op, &rhs)),
                },
            },
            BinaryOperator::Minus => match (&lhs, &rhs) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(self.mismatch(&lhs, op, &rhs)),
            },
            BinaryOperator::Or | BinaryOperator::And => unreachable!("handled above"),
        }
    }

    fn compare(&self, lhs: &Value, op: BinaryOperator, rhs: &Value) -> Result<Value, ExprError> {
        let ordering = match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
        .ok_or_else(|| self.mismatch(lhs, op, rhs))?;

        let result = match op {
            BinaryOperator::LessThan => ordering.is_lt(),
            BinaryOperator::LessThanOrEqual => ordering.is_le(),
            BinaryOperator::GreaterThan => ordering.is_gt(),
            _ => ordering.is_ge(),
        };
        Ok(Value::Bool(result))
    }

    fn contains(&self, haystack: &Value, needle: &Value) -> Result<Value, ExprError> {
        let found = match haystack {
            Value::List(items) => items.iter().any(|item| item.loosely_equals(needle)),
            Value::String(s) => match needle.stringify() {
                Some(n) => s.contains(&n),
                None => return Err(self.mismatch(needle, BinaryOperator::In, haystack)),
            },
            Value::Record(record) => match needle {
                Value::String(name) => record.fields.contains_key(name),
                _ => return Err(self.mismatch(needle, BinaryOperator::In, haystack)),
            },
            Value::Nil => false,
            _ => return Err(self.mismatch(needle, BinaryOperator::In, haystack)),
        };
        Ok(Value::Bool(found))
    }

    fn mismatch(&self, lhs: &Value, op: BinaryOperator, rhs: &Value) -> ExprError {
        self.error(format!(
            "cannot apply `{}` to {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(language: &str) -> Context {
        let work = Record::new("neptune")
            .with("created", "2021-03-04")
            .with("wip", false)
            .with("tags", vec!["music", "code"]);
        let mut ctx = Context::default();
        ctx.insert("language".into(), Value::from(language));
        ctx.insert("work".into(), Value::Record(work));
        ctx.insert("tag".into(), Value::Nil);
        ctx
    }

    #[test]
    fn test_preprocess_is() {
        assert_eq!(
            preprocess(r#"language is "fr""#),
            r#"language == ("fr") ? ("fr") : """#
        );
        assert_eq!(
            preprocess("work.id is 'neptune'"),
            r#"work.id == ('neptune') ? ('neptune') : """#
        );
    }

    #[test]
    fn test_preprocess_except() {
        assert_eq!(
            preprocess(r#"work except "neptune""#),
            r#"work != ("neptune") ? work : """#
        );
    }

    #[test]
    fn test_is_inside_compound_expression() {
        let engine = ExpressionEngine::new();
        let err = engine
            .compile(r#"language is "fr" or language is "en""#)
            .unwrap_err();
        assert!(matches!(&err, ExprError::Invalid { reason, .. } if reason.contains("whole expression")));

        let combined = r#"language == "fr" or language == "en""#;
        assert_eq!(engine.eval(combined, &context("en")).unwrap(), Value::Bool(true));
        assert_eq!(engine.eval(combined, &context("de")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_preprocess_leaves_plain_expressions() {
        assert_eq!(preprocess("  work  "), "work");
        // `is` inside an identifier is not the operator
        assert_eq!(preprocess("this_is_fine"), "this_is_fine");
    }

    #[test]
    fn test_compile_is_cached() {
        let engine = ExpressionEngine::new();
        let first = engine.compile("work.created").unwrap();
        let second = engine.compile("work.created").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cached(), 1);

        let ctx = context("fr");
        assert_eq!(
            engine.evaluate(&first, &ctx).unwrap(),
            engine.evaluate(&second, &ctx).unwrap()
        );
    }

    #[test]
    fn test_language_is() {
        let engine = ExpressionEngine::new();
        assert_eq!(
            engine.eval(r#"language is "fr""#, &context("fr")).unwrap(),
            Value::from("fr")
        );
        assert_eq!(
            engine.eval(r#"language is "fr""#, &context("en")).unwrap(),
            Value::from("")
        );
    }

    #[test]
    fn test_except() {
        let engine = ExpressionEngine::new();
        let ctx = context("fr");
        assert_eq!(
            engine.eval(r#"work except "neptune""#, &ctx).unwrap(),
            Value::from("")
        );
        let result = engine.eval(r#"work except "ideaseed""#, &ctx).unwrap();
        assert_eq!(result.stringify().unwrap(), "neptune");
    }

    #[test]
    fn test_member_access() {
        let engine = ExpressionEngine::new();
        let ctx = context("fr");
        assert_eq!(
            engine.eval("work.created", &ctx).unwrap(),
            Value::from("2021-03-04")
        );
        assert_eq!(engine.eval("work.id", &ctx).unwrap(), Value::from("neptune"));
        // nil propagates through member access
        assert_eq!(engine.eval("tag.plural", &ctx).unwrap(), Value::Nil);
    }

    #[test]
    fn test_logic_and_membership() {
        let engine = ExpressionEngine::new();
        let ctx = context("fr");
        assert!(engine.eval_bool(r#""music" in work.tags"#, &ctx).unwrap());
        assert!(!engine.eval_bool(r#""art" in work.tags"#, &ctx).unwrap());
        assert!(engine.eval_bool("not work.wip and work", &ctx).unwrap());
        assert!(engine.eval_bool(r#""tags" in work"#, &ctx).unwrap());
        assert!(engine.eval_bool(r#""2021" in work.created"#, &ctx).unwrap());
    }

    #[test]
    fn test_or_short_circuits() {
        let engine = ExpressionEngine::new();
        let ctx = context("fr");
        // the unknown variable on the right is never evaluated
        assert!(engine.eval_bool("work or missing", &ctx).unwrap());
        assert!(engine.eval("missing or work", &ctx).is_err());
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        let engine = ExpressionEngine::new();
        let ctx = Context::default();
        assert_eq!(engine.eval("1 + 2", &ctx).unwrap(), Value::Number(3.0));
        assert_eq!(engine.eval("-2 - 1", &ctx).unwrap(), Value::Number(-3.0));
        assert_eq!(engine.eval("'a' + 1", &ctx).unwrap(), Value::from("a1"));
        assert!(engine.eval_bool("2 >= 2", &ctx).unwrap());
        assert!(engine.eval_bool("'abc' < 'abd'", &ctx).unwrap());
        assert!(engine.eval("1 < 'a'", &ctx).is_err());
    }

    #[test]
    fn test_no_numeric_coercion() {
        let engine = ExpressionEngine::new();
        assert!(!engine.eval_bool("1 == '1'", &Context::default()).unwrap());
    }

    #[test]
    fn test_unknown_variable() {
        let engine = ExpressionEngine::new();
        let err = engine.eval("wrok", &context("fr")).unwrap_err();
        assert!(matches!(err, ExprError::Evaluation { .. }));
        assert!(err.to_string().contains("wrok"));
    }

    #[test]
    fn test_unknown_field() {
        let engine = ExpressionEngine::new();
        let err = engine.eval("work.nope", &context("fr")).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_invalid_syntax_keeps_original_text() {
        let engine = ExpressionEngine::new();
        let err = engine.compile("language is").unwrap_err();
        let ExprError::Invalid { text, .. } = err else {
            panic!("expected invalid expression");
        };
        assert_eq!(text, "language is");
        assert_eq!(engine.cached(), 0);
    }

    #[test]
    fn test_eval_bool_rejects_non_boolean() {
        let engine = ExpressionEngine::new();
        assert!(engine.eval_bool("language", &context("fr")).is_err());
    }
}
