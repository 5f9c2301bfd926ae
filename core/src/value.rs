//! Row data model: scalar values, sort keys and rows

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A single scalar cell.
///
/// Values of different variants never compare equal. Ordering across variants
/// follows the declaration order below, floats use IEEE total ordering.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::Text(_) => 4,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Sort key of a row: one scalar, or an ordered tuple for composite keys.
///
/// Keys compare lexicographically element-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Vec<Value>);

impl Key {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Key(vec![value.into()])
    }

    pub fn composite(values: Vec<Value>) -> Self {
        Key(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            values => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => single.serialize(serializer),
            values => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for v in values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
    }
}

/// A fixed-arity tuple of `(key, col_1, ..., col_n)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub key: Key,
    pub columns: Vec<Value>,
}

impl Row {
    pub fn new(key: Key, columns: Vec<Value>) -> Self {
        Self { key, columns }
    }

    /// Number of non-key columns
    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

/// Which side of a comparison a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Build a [`Row`] with a scalar key: `row![1; 2, "bar"]`
#[macro_export]
macro_rules! row {
    ($key:expr; $($col:expr),* $(,)?) => {
        $crate::value::Row::new(
            $crate::value::Key::scalar($key),
            vec![$($crate::value::Value::from($col)),*],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_ordering_across_variants() {
        let mut values = vec![
            Value::Text("a".to_string()),
            Value::Float(0.5),
            Value::Int(3),
            Value::Bool(true),
            Value::Null,
        ];
        values.sort();
        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Bool(true));
        assert_eq!(values[2], Value::Int(3));
        assert_eq!(values[3], Value::Float(0.5));
        assert_eq!(values[4], Value::Text("a".to_string()));
    }

    #[test]
    fn test_strict_equality() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Text("1".to_string()), Value::Int(1));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn test_composite_key_ordering() {
        let mut keys = vec![
            Key::composite(vec![Value::Int(2), Value::Int(1)]),
            Key::composite(vec![Value::Int(1), Value::Int(2)]),
            Key::composite(vec![Value::Int(1), Value::Int(1)]),
        ];
        keys.sort();
        assert_eq!(keys[0].to_string(), "(1, 1)");
        assert_eq!(keys[1].to_string(), "(1, 2)");
        assert_eq!(keys[2].to_string(), "(2, 1)");
    }

    #[test]
    fn test_row_macro() {
        let row = row![1; 2, "bar"];
        assert_eq!(row.key, Key::scalar(1));
        assert_eq!(row.columns, vec![Value::Int(2), Value::Text("bar".to_string())]);
        assert_eq!(row.arity(), 2);
    }
}
