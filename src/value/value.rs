//! The immutable `Value` pair: a `ValueType` plus optional content.
//!
//! Null is a distinguished state, not the absence of a value: a null `Value`
//! still carries its type. Sequences are themselves values (`is_sequence()`),
//! and the null sequence is distinct from the empty sequence.

use super::types::ValueType;
use base64::Engine;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A scalar literal, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
    Locale(String),
    Point { latitude: f64, longitude: f64 },
}

impl Literal {
    /// The `ValueType` this literal belongs to.
    pub fn kind(&self) -> ValueType {
        match self {
            Literal::Text(_) => ValueType::Text,
            Literal::Integer(_) => ValueType::Integer,
            Literal::Decimal(_) => ValueType::Decimal,
            Literal::Boolean(_) => ValueType::Boolean,
            Literal::Date(_) => ValueType::Date,
            Literal::DateTime(_) => ValueType::DateTime,
            Literal::Binary(_) => ValueType::Binary,
            Literal::Locale(_) => ValueType::Locale,
            Literal::Point { .. } => ValueType::Point,
        }
    }

    /// Canonical textual form, identical to what `ValueType::parse` accepts.
    pub fn to_text(&self) -> String {
        match self {
            Literal::Text(s) | Literal::Locale(s) => s.clone(),
            Literal::Integer(i) => i.to_string(),
            Literal::Decimal(d) => d.to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Date(d) => d.format("%Y-%m-%d").to_string(),
            Literal::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            Literal::Binary(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
            Literal::Point {
                latitude,
                longitude,
            } => format!("{},{}", latitude, longitude),
        }
    }

    fn compare(&self, other: &Literal) -> Ordering {
        match (self, other) {
            (Literal::Text(a), Literal::Text(b)) => a.cmp(b),
            (Literal::Integer(a), Literal::Integer(b)) => a.cmp(b),
            (Literal::Decimal(a), Literal::Decimal(b)) => a.total_cmp(b),
            (Literal::Boolean(a), Literal::Boolean(b)) => a.cmp(b),
            (Literal::Date(a), Literal::Date(b)) => a.cmp(b),
            (Literal::DateTime(a), Literal::DateTime(b)) => a.cmp(b),
            (Literal::Binary(a), Literal::Binary(b)) => a.cmp(b),
            (Literal::Locale(a), Literal::Locale(b)) => a.cmp(b),
            (
                Literal::Point {
                    latitude: a1,
                    longitude: a2,
                },
                Literal::Point {
                    latitude: b1,
                    longitude: b2,
                },
            ) => a1.total_cmp(b1).then(a2.total_cmp(b2)),
            // Mixed kinds only arise from misused backends; order by kind name
            // to stay total.
            (a, b) => a.kind().name().cmp(b.kind().name()),
        }
    }
}

/// What a `Value` holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueContent {
    /// The typed null scalar
    Null,
    Scalar(Literal),
    /// The typed null sequence, distinct from the empty sequence
    NullSequence,
    Sequence(Vec<Value>),
}

/// An immutable typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    value_type: ValueType,
    content: ValueContent,
}

impl Value {
    pub(crate) fn new(value_type: ValueType, content: ValueContent) -> Self {
        Self {
            value_type,
            content,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::new(ValueType::Text, ValueContent::Scalar(Literal::Text(s.into())))
    }

    pub fn integer(i: i64) -> Self {
        Self::new(ValueType::Integer, ValueContent::Scalar(Literal::Integer(i)))
    }

    pub fn decimal(d: f64) -> Self {
        Self::new(ValueType::Decimal, ValueContent::Scalar(Literal::Decimal(d)))
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(ValueType::Boolean, ValueContent::Scalar(Literal::Boolean(b)))
    }

    pub fn date(d: NaiveDate) -> Self {
        Self::new(ValueType::Date, ValueContent::Scalar(Literal::Date(d)))
    }

    pub fn datetime(dt: DateTime<Utc>) -> Self {
        Self::new(
            ValueType::DateTime,
            ValueContent::Scalar(Literal::DateTime(dt)),
        )
    }

    pub fn binary(bytes: Vec<u8>) -> Self {
        Self::new(ValueType::Binary, ValueContent::Scalar(Literal::Binary(bytes)))
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn content(&self) -> &ValueContent {
        &self.content
    }

    /// True for the typed null scalar and the null sequence.
    pub fn is_null(&self) -> bool {
        matches!(self.content, ValueContent::Null | ValueContent::NullSequence)
    }

    pub fn is_sequence(&self) -> bool {
        matches!(
            self.content,
            ValueContent::NullSequence | ValueContent::Sequence(_)
        )
    }

    /// The scalar literal, if this is a non-null scalar.
    pub fn literal(&self) -> Option<&Literal> {
        match &self.content {
            ValueContent::Scalar(lit) => Some(lit),
            _ => None,
        }
    }

    /// The sequence elements, if this is a non-null sequence.
    pub fn sequence(&self) -> Option<&[Value]> {
        match &self.content {
            ValueContent::Sequence(values) => Some(values),
            _ => None,
        }
    }

    /// Canonical textual form of a non-null scalar.
    pub fn to_text(&self) -> Option<String> {
        self.literal().map(Literal::to_text)
    }

    /// Total order among values of one type. Nulls sort before non-nulls;
    /// callers doing min/max reductions are expected to filter them first.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (&self.content, &other.content) {
            (ValueContent::Scalar(a), ValueContent::Scalar(b)) => a.compare(b),
            (ValueContent::Scalar(_), _) => Ordering::Greater,
            (_, ValueContent::Scalar(_)) => Ordering::Less,
            (ValueContent::Sequence(a), ValueContent::Sequence(b)) => {
                let mut it_a = a.iter();
                let mut it_b = b.iter();
                loop {
                    match (it_a.next(), it_b.next()) {
                        (Some(x), Some(y)) => match x.compare(y) {
                            Ordering::Equal => continue,
                            other => return other,
                        },
                        (Some(_), None) => return Ordering::Greater,
                        (None, Some(_)) => return Ordering::Less,
                        (None, None) => return Ordering::Equal,
                    }
                }
            }
            (ValueContent::Sequence(_), _) => Ordering::Greater,
            (_, ValueContent::Sequence(_)) => Ordering::Less,
            _ => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_carries_its_type() {
        let v = ValueType::Integer.null_value();
        assert!(v.is_null());
        assert!(!v.is_sequence());
        assert_eq!(v.value_type(), ValueType::Integer);
    }

    #[test]
    fn null_sequence_is_not_empty_sequence() {
        let null_seq = ValueType::Text.null_sequence();
        let empty = ValueType::Text.sequence_of(vec![]).unwrap();
        assert!(null_seq.is_null() && null_seq.is_sequence());
        assert!(!empty.is_null() && empty.is_sequence());
        assert_ne!(null_seq, empty);
    }

    #[test]
    fn scalar_is_not_a_one_element_sequence() {
        let scalar = Value::integer(1);
        let seq = ValueType::Integer.sequence_of(vec![Value::integer(1)]).unwrap();
        assert_ne!(scalar, seq);
    }

    #[test]
    fn values_order_by_literal() {
        let a = Value::integer(1);
        let b = Value::integer(2);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(a.compare(&Value::integer(1)), Ordering::Equal);
    }

    #[test]
    fn nulls_sort_before_values() {
        let null = ValueType::Integer.null_value();
        assert_eq!(null.compare(&Value::integer(0)), Ordering::Less);
        assert_eq!(Value::integer(0).compare(&null), Ordering::Greater);
    }

    #[test]
    fn canonical_text_round_trips() {
        let dt = Value::datetime("2020-05-01T10:30:00Z".parse().unwrap());
        assert_eq!(dt.to_text().unwrap(), "2020-05-01T10:30:00Z");
        assert_eq!(Value::integer(-7).to_text().unwrap(), "-7");
        assert_eq!(Value::boolean(true).to_text().unwrap(), "true");
    }
}
