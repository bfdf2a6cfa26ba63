//! Dynamic values produced by expression evaluation.

use std::collections::BTreeMap;
use std::fmt;

/// A database object exposed to expressions.
///
/// Its `id` is what the object stringifies to, which is what a bare `:work`
/// or `:tag` path segment becomes in an output path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub id: String,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_owned(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Record(_) => "record",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Record(record) => !record.id.is_empty(),
        }
    }

    /// String form used for path segments and template interpolation.
    ///
    /// Lists have no single string form and yield `None`.
    pub fn stringify(&self) -> Option<String> {
        match self {
            Self::Nil => Some(String::new()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::String(s) => Some(s.clone()),
            Self::List(_) => None,
            Self::Record(record) => Some(record.id.clone()),
        }
    }

    /// Value equality used by `==`, `!=`, `in`, and the `is`/`except` sugar.
    ///
    /// A record equals a string holding its id. Numbers never equal strings.
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Record(r), Self::String(s)) | (Self::String(s), Self::Record(r)) => r.id == *s,
            (Self::Record(a), Self::Record(b)) => a.id == b.id,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            (a, b) => a == b,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stringify() {
            Some(s) => f.write_str(&s),
            None => {
                let Self::List(items) = self else {
                    return Ok(());
                };
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_numbers() {
        assert_eq!(Value::Number(2.0).stringify().unwrap(), "2");
        assert_eq!(Value::Number(2.5).stringify().unwrap(), "2.5");
        assert_eq!(Value::Number(-3.0).stringify().unwrap(), "-3");
    }

    #[test]
    fn test_stringify_record_uses_id() {
        let work = Record::new("neptune").with("wip", true);
        assert_eq!(Value::Record(work).stringify().unwrap(), "neptune");
    }

    #[test]
    fn test_list_is_not_stringable() {
        let list = Value::from(vec!["a", "b"]);
        assert_eq!(list.stringify(), None);
        assert_eq!(list.to_string(), "[a, b]");
    }

    #[test]
    fn test_loose_equality() {
        let work = Value::Record(Record::new("neptune"));
        assert!(work.loosely_equals(&Value::from("neptune")));
        assert!(Value::from("neptune").loosely_equals(&work));
        assert!(!work.loosely_equals(&Value::from("ideaseed")));

        // No numeric coercion
        assert!(!Value::Number(1.0).loosely_equals(&Value::from("1")));
        assert!(Value::Number(1.0).loosely_equals(&Value::Number(1.0)));
        assert!(Value::Nil.loosely_equals(&Value::Nil));
        assert!(!Value::Nil.loosely_equals(&Value::from("")));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("fr").is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Record(Record::default()).is_truthy());
        assert!(Value::from(vec![true]).is_truthy());
    }
}
