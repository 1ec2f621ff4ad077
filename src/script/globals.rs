//! The script-facing globals that touch the value and join engines:
//! `new_value`, `new_sequence`, `set_of` and `join`.
//!
//! The host script runtime hands native values across the boundary as
//! `serde_json::Value`; everything beyond this module works on typed
//! `Value`s only.

use crate::error::{EngineError, EngineResult};
use crate::resolver::{DatasourceRegistry, Reference};
use crate::table::{ValueTable, VariableEntity};
use crate::value::{flatten_one_or_many, Value, ValueType};
use log::trace;
use serde_json::Value as JsonValue;

use super::context::EvaluationContext;

/// An argument handed to a global by the script runtime: either an engine
/// value (scalar or sequence) or a still-native one.
pub enum ScriptArg {
    Value(Value),
    Native(JsonValue),
}

/// Builds a scalar value from a native one.
///
/// Without a type name the type is inferred from the native kind: boolean,
/// integer-shaped number, other number, or text. With a type name the raw
/// value's textual form is parsed into that type; a value that does not
/// parse is a conversion failure, never a silent null.
pub fn new_value(raw: &JsonValue, type_name: Option<&str>) -> EngineResult<Value> {
    match type_name {
        None => infer_value(raw),
        Some(name) => {
            let value_type = ValueType::from_name(name)?;
            match raw {
                JsonValue::Null => Ok(value_type.null_value()),
                _ => value_type.parse(&native_text(raw)?),
            }
        }
    }
}

/// Builds a uniform sequence from native elements, applying the `new_value`
/// rule element-wise. Without a type name the first element decides the
/// type; an empty untyped input falls back to text.
pub fn new_sequence(raw: &[JsonValue], type_name: Option<&str>) -> EngineResult<Value> {
    let value_type = match type_name {
        Some(name) => ValueType::from_name(name)?,
        None => match raw.first() {
            Some(first) => infer_value(first)?.value_type(),
            None => ValueType::Text,
        },
    };
    let values = raw
        .iter()
        .map(|element| new_value(element, Some(value_type.name())))
        .collect::<EngineResult<Vec<_>>>()?;
    value_type.sequence_of(values)
}

/// Flattens every argument (scalar, sequence or native array) into one
/// sequence with set semantics: duplicate elements are removed. Only
/// distinct-value membership is contractual; this implementation keeps
/// first-seen order so results are deterministic. The element type is the
/// explicit one, or the type of the first encountered element.
pub fn set_of(args: &[ScriptArg], type_name: Option<&str>) -> EngineResult<Value> {
    let mut elements: Vec<Value> = Vec::new();
    for arg in args {
        match arg {
            ScriptArg::Value(value) => {
                if value.is_sequence() {
                    elements.extend(flatten_one_or_many(value));
                } else {
                    elements.push(value.clone());
                }
            }
            ScriptArg::Native(JsonValue::Array(items)) => {
                for item in items {
                    elements.push(new_value(item, type_name)?);
                }
            }
            ScriptArg::Native(other) => elements.push(new_value(other, type_name)?),
        }
    }
    let value_type = match type_name {
        Some(name) => ValueType::from_name(name)?,
        None => match elements.first() {
            Some(first) => first.value_type(),
            None => ValueType::Text,
        },
    };
    let mut distinct: Vec<Value> = Vec::new();
    for element in elements {
        let element = value_type.convert(&element)?;
        if !distinct.contains(&element) {
            distinct.push(element);
        }
    }
    value_type.sequence_of(distinct)
}

/// Cross-table lookup: the current row's `source_variable` value is treated
/// as one-or-many foreign keys into the table named by `target_reference`,
/// and the target variable's values are collected in key order.
///
/// A null foreign key yields the target type's null value, not an empty
/// sequence. A key that resolves to no entity, or to a null target value,
/// contributes zero elements. Results are not deduplicated.
pub fn join(
    context: &EvaluationContext,
    registry: &DatasourceRegistry,
    target_reference: &str,
    source_variable: &str,
) -> EngineResult<Value> {
    let scope = context.current()?;
    let source = scope.table.variable(source_variable).ok_or_else(|| {
        EngineError::Resolution(format!(
            "no variable '{}' in table '{}'",
            source_variable,
            scope.table.name()
        ))
    })?;
    let foreign_key = scope.table.value_set(&scope.entity)?.value(&source)?;

    let reference = Reference::parse(target_reference)?;
    let resolved = registry.resolve(&reference, &scope.table)?;
    let target_table = resolved.table;
    let target = resolved.variable;

    if foreign_key.is_null() {
        return Ok(target.value_type.null_value());
    }

    let keys = flatten_one_or_many(&foreign_key);
    trace!(
        "joining {} keys of {} into {}",
        keys.len(),
        source.name,
        target_reference
    );
    let mut out = Vec::new();
    for key in keys {
        let identifier = match key.to_text() {
            Some(identifier) => identifier,
            None => continue,
        };
        let entity = VariableEntity::new(target_table.entity_type(), identifier);
        if !target_table.has_entity(&entity) {
            continue;
        }
        let value = target_table.value_set(&entity)?.value(&target)?;
        if value.is_null() {
            continue;
        }
        if value.is_sequence() {
            out.extend(flatten_one_or_many(&value));
        } else {
            out.push(value);
        }
    }
    target.value_type.sequence_of(out)
}

fn infer_value(raw: &JsonValue) -> EngineResult<Value> {
    match raw {
        JsonValue::Null => Ok(ValueType::Text.null_value()),
        JsonValue::Bool(b) => Ok(Value::boolean(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::integer(i))
            } else {
                Ok(Value::decimal(n.as_f64().ok_or_else(|| {
                    EngineError::ValueConversion(format!("unrepresentable number {}", n))
                })?))
            }
        }
        JsonValue::String(s) => Ok(Value::text(s.clone())),
        other => Err(EngineError::ValueConversion(format!(
            "cannot build a scalar value from {}",
            other
        ))),
    }
}

fn native_text(raw: &JsonValue) -> EngineResult<String> {
    match raw {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(EngineError::ValueConversion(format!(
            "cannot build a scalar value from {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_value_infers_integer() {
        let v = new_value(&json!(1), None).unwrap();
        assert_eq!(v, Value::integer(1));
    }

    #[test]
    fn new_value_parses_named_type() {
        let v = new_value(&json!("1"), Some("integer")).unwrap();
        assert_eq!(v, Value::integer(1));
    }

    #[test]
    fn new_value_rejects_unparseable_text() {
        assert!(matches!(
            new_value(&json!("qwerty"), Some("integer")),
            Err(EngineError::ValueConversion(_))
        ));
    }

    #[test]
    fn new_value_infers_decimal_and_boolean() {
        assert_eq!(new_value(&json!(1.5), None).unwrap(), Value::decimal(1.5));
        assert_eq!(new_value(&json!(true), None).unwrap(), Value::boolean(true));
    }

    #[test]
    fn new_sequence_is_uniformly_typed() {
        let seq = new_sequence(&[json!(1), json!(2), json!(3)], None).unwrap();
        assert_eq!(seq.value_type(), ValueType::Integer);
        assert_eq!(seq.sequence().unwrap().len(), 3);

        let seq = new_sequence(&[json!("1"), json!("2")], Some("integer")).unwrap();
        assert_eq!(seq.sequence().unwrap()[1], Value::integer(2));
    }

    #[test]
    fn empty_untyped_sequence_defaults_to_text() {
        let seq = new_sequence(&[], None).unwrap();
        assert_eq!(seq.value_type(), ValueType::Text);
        assert_eq!(seq.sequence().unwrap().len(), 0);
    }

    #[test]
    fn set_of_removes_duplicates() {
        let result = set_of(
            &[ScriptArg::Native(json!(["a", "b", "a"]))],
            None,
        )
        .unwrap();
        let elements = result.sequence().unwrap();
        assert_eq!(elements.len(), 2);
        assert!(elements.contains(&Value::text("a")));
        assert!(elements.contains(&Value::text("b")));
    }

    #[test]
    fn set_of_flattens_mixed_inputs() {
        let seq = ValueType::Integer
            .sequence_of(vec![Value::integer(1), Value::integer(2)])
            .unwrap();
        let result = set_of(
            &[
                ScriptArg::Value(seq),
                ScriptArg::Value(Value::integer(2)),
                ScriptArg::Native(json!([3, 1])),
            ],
            None,
        )
        .unwrap();
        let elements = result.sequence().unwrap();
        assert_eq!(
            elements,
            &[Value::integer(1), Value::integer(2), Value::integer(3)]
        );
    }
}
