//! The closed set of value kinds and the coercion table between them.
//!
//! Every operation matches exhaustively on `ValueType`, so adding a kind
//! forces every rule to be revisited at compile time.

use super::value::{Literal, Value, ValueContent};
use crate::error::{EngineError, EngineResult};
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Binary,
    Locale,
    Point,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::Binary => "binary",
            ValueType::Locale => "locale",
            ValueType::Point => "point",
        }
    }

    pub fn from_name(name: &str) -> EngineResult<Self> {
        match name {
            "text" => Ok(ValueType::Text),
            "integer" => Ok(ValueType::Integer),
            "decimal" => Ok(ValueType::Decimal),
            "boolean" => Ok(ValueType::Boolean),
            "date" => Ok(ValueType::Date),
            "datetime" => Ok(ValueType::DateTime),
            "binary" => Ok(ValueType::Binary),
            "locale" => Ok(ValueType::Locale),
            "point" => Ok(ValueType::Point),
            other => Err(EngineError::InvalidData(format!(
                "unknown value type '{}'",
                other
            ))),
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Decimal)
    }

    pub fn is_date_time(self) -> bool {
        matches!(self, ValueType::Date | ValueType::DateTime)
    }

    /// The typed null scalar.
    pub fn null_value(self) -> Value {
        Value::new(self, ValueContent::Null)
    }

    /// The typed null sequence, distinct from an empty sequence.
    pub fn null_sequence(self) -> Value {
        Value::new(self, ValueContent::NullSequence)
    }

    /// Wraps a literal of this kind as a `Value`.
    pub fn value_of(self, literal: Literal) -> EngineResult<Value> {
        if literal.kind() != self {
            return Err(EngineError::ValueConversion(format!(
                "literal of kind {} given to type {}",
                literal.kind(),
                self
            )));
        }
        Ok(Value::new(self, ValueContent::Scalar(literal)))
    }

    /// Wraps same-typed values as one sequence value. Size 0 is a valid,
    /// non-null sequence.
    pub fn sequence_of(self, values: Vec<Value>) -> EngineResult<Value> {
        for v in &values {
            if v.value_type() != self {
                return Err(EngineError::ValueConversion(format!(
                    "sequence of {} cannot hold a {} element",
                    self,
                    v.value_type()
                )));
            }
        }
        Ok(Value::new(self, ValueContent::Sequence(values)))
    }

    /// Parses the canonical textual form into a value of this type.
    pub fn parse(self, text: &str) -> EngineResult<Value> {
        let conversion_err =
            |t: ValueType| EngineError::ValueConversion(format!("'{}' is not a valid {}", text, t));
        let literal = match self {
            ValueType::Text => Literal::Text(text.to_string()),
            ValueType::Integer => Literal::Integer(
                text.trim().parse::<i64>().map_err(|_| conversion_err(self))?,
            ),
            ValueType::Decimal => Literal::Decimal(
                text.trim().parse::<f64>().map_err(|_| conversion_err(self))?,
            ),
            ValueType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Literal::Boolean(true),
                "false" => Literal::Boolean(false),
                _ => return Err(conversion_err(self)),
            },
            ValueType::Date => Literal::Date(
                NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                    .map_err(|_| conversion_err(self))?,
            ),
            ValueType::DateTime => Literal::DateTime(
                DateTime::parse_from_rfc3339(text.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| conversion_err(self))?,
            ),
            ValueType::Binary => Literal::Binary(
                base64::engine::general_purpose::STANDARD
                    .decode(text.trim())
                    .map_err(|_| conversion_err(self))?,
            ),
            ValueType::Locale => {
                let trimmed = text.trim();
                if trimmed.is_empty()
                    || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                {
                    return Err(conversion_err(self));
                }
                Literal::Locale(trimmed.to_string())
            }
            ValueType::Point => {
                let (lat, lon) = text
                    .trim()
                    .split_once(',')
                    .ok_or_else(|| conversion_err(self))?;
                Literal::Point {
                    latitude: lat.trim().parse().map_err(|_| conversion_err(self))?,
                    longitude: lon.trim().parse().map_err(|_| conversion_err(self))?,
                }
            }
        };
        self.value_of(literal)
    }

    /// Whether a conversion rule exists from `from` into this type at all.
    ///
    /// Text is the universal interchange form: anything formats to text, and
    /// text parses into anything (the parse itself may still fail on the
    /// data). Beyond that only integer<->decimal and date<->datetime are
    /// defined.
    fn supports_conversion_from(self, from: ValueType) -> bool {
        if from == self || from == ValueType::Text || self == ValueType::Text {
            return true;
        }
        matches!(
            (from, self),
            (ValueType::Integer, ValueType::Decimal)
                | (ValueType::Decimal, ValueType::Integer)
                | (ValueType::Date, ValueType::DateTime)
                | (ValueType::DateTime, ValueType::Date)
        )
    }

    /// Converts a value into this type.
    ///
    /// A structurally undefined pair fails with `UnsupportedConversion`
    /// before any data is examined; a defined pair whose data does not fit
    /// fails with `ValueConversion`. A null input converts to this type's
    /// null (sequence-ness preserved); it never masks an unsupported pair.
    pub fn convert(self, value: &Value) -> EngineResult<Value> {
        let from = value.value_type();
        if !self.supports_conversion_from(from) {
            return Err(EngineError::UnsupportedConversion(from, self));
        }
        match value.content() {
            ValueContent::Null => Ok(self.null_value()),
            ValueContent::NullSequence => Ok(self.null_sequence()),
            ValueContent::Sequence(values) => {
                let converted = values
                    .iter()
                    .map(|v| self.convert(v))
                    .collect::<EngineResult<Vec<_>>>()?;
                self.sequence_of(converted)
            }
            ValueContent::Scalar(literal) => {
                if from == self {
                    return Ok(value.clone());
                }
                self.convert_literal(literal)
            }
        }
    }

    fn convert_literal(self, literal: &Literal) -> EngineResult<Value> {
        let from = literal.kind();
        match (literal, self) {
            (lit, ValueType::Text) => self.value_of(Literal::Text(lit.to_text())),
            (Literal::Text(s), target) => target.parse(s),
            (Literal::Integer(i), ValueType::Decimal) => {
                self.value_of(Literal::Decimal(*i as f64))
            }
            // Truncating: documented as the one lossy numeric direction.
            (Literal::Decimal(d), ValueType::Integer) => {
                self.value_of(Literal::Integer(*d as i64))
            }
            (Literal::Date(d), ValueType::DateTime) => self.value_of(Literal::DateTime(
                Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)),
            )),
            // Lossy: drops the time-of-day component.
            (Literal::DateTime(dt), ValueType::Date) => {
                self.value_of(Literal::Date(dt.date_naive()))
            }
            _ => Err(EngineError::UnsupportedConversion(from, self)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for vt in [
            ValueType::Text,
            ValueType::Integer,
            ValueType::Decimal,
            ValueType::Boolean,
            ValueType::Date,
            ValueType::DateTime,
            ValueType::Binary,
            ValueType::Locale,
            ValueType::Point,
        ] {
            assert_eq!(ValueType::from_name(vt.name()).unwrap(), vt);
        }
        assert!(ValueType::from_name("complex").is_err());
    }

    #[test]
    fn kind_predicates() {
        assert!(ValueType::Integer.is_numeric());
        assert!(ValueType::Decimal.is_numeric());
        assert!(!ValueType::Text.is_numeric());
        assert!(ValueType::Date.is_date_time());
        assert!(ValueType::DateTime.is_date_time());
        assert!(!ValueType::Binary.is_date_time());
    }

    #[test]
    fn parse_failures_are_conversion_errors() {
        assert!(matches!(
            ValueType::Integer.parse("qwerty"),
            Err(EngineError::ValueConversion(_))
        ));
        assert!(matches!(
            ValueType::Boolean.parse("maybe"),
            Err(EngineError::ValueConversion(_))
        ));
        assert!(matches!(
            ValueType::Date.parse("01/05/2020"),
            Err(EngineError::ValueConversion(_))
        ));
    }

    #[test]
    fn datetime_to_text_formats() {
        let dt = ValueType::DateTime.parse("2020-05-01T10:30:00Z").unwrap();
        let text = ValueType::Text.convert(&dt).unwrap();
        assert_eq!(text.to_text().unwrap(), "2020-05-01T10:30:00Z");
    }

    #[test]
    fn structurally_unsupported_pairs_fail_fast() {
        let dt = ValueType::DateTime.parse("2020-05-01T10:30:00Z").unwrap();
        assert!(matches!(
            ValueType::Integer.convert(&dt),
            Err(EngineError::UnsupportedConversion(ValueType::DateTime, ValueType::Integer))
        ));
        assert!(matches!(
            ValueType::Boolean.convert(&dt),
            Err(EngineError::UnsupportedConversion(ValueType::DateTime, ValueType::Boolean))
        ));
        let bin = Value::binary(vec![1, 2, 3]);
        assert!(matches!(
            ValueType::DateTime.convert(&bin),
            Err(EngineError::UnsupportedConversion(ValueType::Binary, ValueType::DateTime))
        ));
        // Even a null value of an unsupported source type fails structurally.
        assert!(matches!(
            ValueType::DateTime.convert(&ValueType::Binary.null_value()),
            Err(EngineError::UnsupportedConversion(_, _))
        ));
    }

    #[test]
    fn binary_text_round_trip() {
        let bin = Value::binary(vec![0, 159, 146, 150]);
        let text = ValueType::Text.convert(&bin).unwrap();
        let back = ValueType::Binary.convert(&text).unwrap();
        assert_eq!(back, bin);
    }

    #[test]
    fn numeric_text_round_trip() {
        let i = Value::integer(42);
        let text = ValueType::Text.convert(&i).unwrap();
        assert_eq!(ValueType::Integer.convert(&text).unwrap(), i);

        let d = Value::decimal(1.5);
        let text = ValueType::Text.convert(&d).unwrap();
        assert_eq!(ValueType::Decimal.convert(&text).unwrap(), d);

        assert!(matches!(
            ValueType::Integer.convert(&Value::text("qwerty")),
            Err(EngineError::ValueConversion(_))
        ));
    }

    #[test]
    fn integer_decimal_round_trip() {
        let i = Value::integer(3);
        let d = ValueType::Decimal.convert(&i).unwrap();
        assert_eq!(ValueType::Integer.convert(&d).unwrap(), i);
    }

    #[test]
    fn date_datetime_round_trip() {
        let date = ValueType::Date.parse("2020-05-01").unwrap();
        let dt = ValueType::DateTime.convert(&date).unwrap();
        assert_eq!(dt.to_text().unwrap(), "2020-05-01T00:00:00Z");
        assert_eq!(ValueType::Date.convert(&dt).unwrap(), date);
    }

    #[test]
    fn null_converts_to_typed_null_on_supported_pairs() {
        let null_int = ValueType::Integer.null_value();
        let converted = ValueType::Text.convert(&null_int).unwrap();
        assert!(converted.is_null());
        assert_eq!(converted.value_type(), ValueType::Text);
    }

    #[test]
    fn sequences_convert_element_wise() {
        let seq = ValueType::Integer
            .sequence_of(vec![Value::integer(1), Value::integer(2)])
            .unwrap();
        let texts = ValueType::Text.convert(&seq).unwrap();
        let elements = texts.sequence().unwrap();
        assert_eq!(elements[0], Value::text("1"));
        assert_eq!(elements[1], Value::text("2"));
    }

    #[test]
    fn sequence_of_rejects_mixed_types() {
        assert!(ValueType::Integer
            .sequence_of(vec![Value::integer(1), Value::text("x")])
            .is_err());
    }

    #[test]
    fn point_text_round_trip() {
        let p = ValueType::Point.parse("45.5,-73.6").unwrap();
        let text = ValueType::Text.convert(&p).unwrap();
        assert_eq!(ValueType::Point.convert(&text).unwrap(), p);
    }
}
