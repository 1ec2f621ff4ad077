//! Sequence helpers shared by the join engine and the script globals.

use super::value::Value;

/// Treats a value as a one-or-many source: a non-sequence value is a
/// singleton, a sequence contributes its elements in order, and either kind
/// of null contributes nothing.
pub fn flatten_one_or_many(value: &Value) -> Vec<Value> {
    if value.is_null() {
        return Vec::new();
    }
    match value.sequence() {
        Some(elements) => elements.to_vec(),
        None => vec![value.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    #[test]
    fn scalar_flattens_to_singleton() {
        assert_eq!(flatten_one_or_many(&Value::integer(5)), vec![Value::integer(5)]);
    }

    #[test]
    fn sequence_flattens_to_elements() {
        let seq = ValueType::Text
            .sequence_of(vec![Value::text("a"), Value::text("b")])
            .unwrap();
        assert_eq!(
            flatten_one_or_many(&seq),
            vec![Value::text("a"), Value::text("b")]
        );
    }

    #[test]
    fn nulls_flatten_to_nothing() {
        assert!(flatten_one_or_many(&ValueType::Text.null_value()).is_empty());
        assert!(flatten_one_or_many(&ValueType::Text.null_sequence()).is_empty());
    }
}
