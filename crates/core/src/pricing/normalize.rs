use serde_json::Value;
use thiserror::Error;

use crate::domain::quote::{QuoteItem, QuoteModifiers};

/// Type-level violations in a raw quote payload. Missing fields never land
/// here; they default. Only a value of the wrong JSON kind is rejected, so
/// callers can re-prompt instead of pricing garbage.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QuoteInputError {
    #[error("items payload is not an array")]
    ItemsNotAnArray,
    #[error("item at index {index} is not an object")]
    ItemNotAnObject { index: usize },
    #[error("modifiers payload is not an object")]
    ModifiersNotAnObject,
    #[error("{field} is not numeric")]
    NotNumeric { field: String },
    #[error("{field} is not a boolean")]
    NotBoolean { field: String },
}

/// Accepts the `items` value exactly as it appears in an action payload:
/// absent/null means no items, which still quotes (placeholder tier).
pub fn items_from_value(value: &Value) -> Result<Vec<QuoteItem>, QuoteInputError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(values) => items_from_values(values),
        _ => Err(QuoteInputError::ItemsNotAnArray),
    }
}

pub fn items_from_values(values: &[Value]) -> Result<Vec<QuoteItem>, QuoteInputError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| item_from_value(index, value))
        .collect()
}

pub fn modifiers_from_value(value: Option<&Value>) -> Result<QuoteModifiers, QuoteInputError> {
    let map = match value {
        None | Some(Value::Null) => return Ok(QuoteModifiers::default()),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(QuoteInputError::ModifiersNotAnObject),
    };

    Ok(QuoteModifiers {
        stairs_flights: int_or(map.get("stairs_flights"), 0, "modifiers.stairs_flights")?,
        inside_carry: bool_or(map.get("inside_carry"), false, "modifiers.inside_carry")?,
        hazardous_count: int_or(map.get("hazardous_count"), 0, "modifiers.hazardous_count")?,
        same_day: bool_or(map.get("same_day"), false, "modifiers.same_day")?,
        curbside: bool_or(map.get("curbside"), false, "modifiers.curbside")?,
    })
}

fn item_from_value(index: usize, value: &Value) -> Result<QuoteItem, QuoteInputError> {
    let Value::Object(map) = value else {
        return Err(QuoteInputError::ItemNotAnObject { index });
    };

    Ok(QuoteItem {
        name: string_or(map.get("name"), "Item"),
        category: string_or(map.get("category"), "Medium"),
        quantity: int_or(map.get("quantity"), 1, &format!("items[{index}].quantity"))?,
        est_cubic_yards: real_or(
            map.get("est_cubic_yards"),
            0.0,
            &format!("items[{index}].est_cubic_yards"),
        )?,
    })
}

fn string_or(value: Option<&Value>, fallback: &str) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        _ => fallback.to_string(),
    }
}

/// Integers pass through, floats truncate toward zero, numeric strings
/// parse. An explicit null is a violation, same as any other wrong kind.
fn int_or(value: Option<&Value>, fallback: i64, field: &str) -> Result<i64, QuoteInputError> {
    match value {
        None => Ok(fallback),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(whole) => Ok(whole),
            None => number
                .as_f64()
                .map(|real| real as i64)
                .ok_or_else(|| not_numeric(field)),
        },
        Some(Value::String(text)) => text.trim().parse().map_err(|_| not_numeric(field)),
        Some(_) => Err(not_numeric(field)),
    }
}

fn real_or(value: Option<&Value>, fallback: f64, field: &str) -> Result<f64, QuoteInputError> {
    match value {
        None => Ok(fallback),
        Some(Value::Number(number)) => number.as_f64().ok_or_else(|| not_numeric(field)),
        Some(Value::String(text)) => text.trim().parse().map_err(|_| not_numeric(field)),
        Some(_) => Err(not_numeric(field)),
    }
}

fn bool_or(value: Option<&Value>, fallback: bool, field: &str) -> Result<bool, QuoteInputError> {
    match value {
        None => Ok(fallback),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(QuoteInputError::NotBoolean { field: field.to_string() }),
    }
}

fn not_numeric(field: &str) -> QuoteInputError {
    QuoteInputError::NotNumeric { field: field.to_string() }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{items_from_value, items_from_values, modifiers_from_value, QuoteInputError};
    use crate::domain::quote::{QuoteItem, QuoteModifiers};
    use crate::pricing::engine::{DeterministicQuoteEngine, QuoteEngine};

    #[test]
    fn missing_item_fields_fall_back_to_defaults() {
        let items = items_from_values(&[json!({})]).unwrap();

        assert_eq!(
            items,
            vec![QuoteItem::new("Item", "Medium", 1, 0.0)]
        );
    }

    #[test]
    fn numeric_strings_and_floats_coerce() {
        let items = items_from_values(&[json!({
            "name": "boxes",
            "quantity": "3",
            "est_cubic_yards": "1.5",
        }), json!({
            "quantity": 2.9,
            "est_cubic_yards": 4,
        })])
        .unwrap();

        assert_eq!(items[0].quantity, 3);
        assert!((items[0].est_cubic_yards - 1.5).abs() < f64::EPSILON);
        assert_eq!(items[1].quantity, 2);
        assert!((items[1].est_cubic_yards - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_counts_pass_through() {
        let items = items_from_values(&[json!({"quantity": -2})]).unwrap();
        assert_eq!(items[0].quantity, -2);
    }

    #[test]
    fn non_string_name_and_category_fall_back() {
        let items = items_from_values(&[json!({"name": 7, "category": null})]).unwrap();

        assert_eq!(items[0].name, "Item");
        assert_eq!(items[0].category, "Medium");
    }

    #[test]
    fn wrong_kinds_are_rejected_with_the_field_path() {
        let err = items_from_values(&[json!({}), json!({"quantity": "a lot"})]).unwrap_err();
        assert_eq!(err, QuoteInputError::NotNumeric { field: "items[1].quantity".into() });

        let err = items_from_values(&[json!({"quantity": null})]).unwrap_err();
        assert_eq!(err, QuoteInputError::NotNumeric { field: "items[0].quantity".into() });

        let err = items_from_values(&[json!({"est_cubic_yards": true})]).unwrap_err();
        assert_eq!(
            err,
            QuoteInputError::NotNumeric { field: "items[0].est_cubic_yards".into() }
        );
    }

    #[test]
    fn non_object_item_reports_its_index() {
        let err = items_from_values(&[json!({}), json!("couch")]).unwrap_err();
        assert_eq!(err, QuoteInputError::ItemNotAnObject { index: 1 });
    }

    #[test]
    fn items_value_accepts_null_and_rejects_non_arrays() {
        assert_eq!(items_from_value(&json!(null)).unwrap(), Vec::new());
        assert_eq!(
            items_from_value(&json!("couch")).unwrap_err(),
            QuoteInputError::ItemsNotAnArray
        );
    }

    #[test]
    fn absent_or_null_modifiers_default() {
        assert_eq!(modifiers_from_value(None).unwrap(), QuoteModifiers::default());
        assert_eq!(
            modifiers_from_value(Some(&json!(null))).unwrap(),
            QuoteModifiers::default()
        );
    }

    #[test]
    fn modifier_fields_coerce_and_unknown_keys_are_ignored() {
        let modifiers = modifiers_from_value(Some(&json!({
            "stairs_flights": "2",
            "same_day": true,
            "note": "side gate",
        })))
        .unwrap();

        assert_eq!(modifiers.stairs_flights, 2);
        assert!(modifiers.same_day);
        assert!(!modifiers.curbside);
    }

    #[test]
    fn non_boolean_flags_are_rejected() {
        let err = modifiers_from_value(Some(&json!({"same_day": "yes"}))).unwrap_err();
        assert_eq!(err, QuoteInputError::NotBoolean { field: "modifiers.same_day".into() });
    }

    #[test]
    fn non_object_modifiers_are_rejected() {
        let err = modifiers_from_value(Some(&json!([1, 2]))).unwrap_err();
        assert_eq!(err, QuoteInputError::ModifiersNotAnObject);
    }

    #[test]
    fn mapping_form_prices_identically_to_typed_form() {
        let engine = DeterministicQuoteEngine::default();

        let mapped = items_from_values(&[
            json!({"name": "couch", "category": "Large", "quantity": 1, "est_cubic_yards": 2.0}),
            json!({"name": "boxes", "quantity": "4", "est_cubic_yards": 0.25}),
        ])
        .unwrap();
        let typed = vec![
            QuoteItem::new("couch", "Large", 1, 2.0),
            QuoteItem::new("boxes", "Medium", 4, 0.25),
        ];
        let modifiers =
            modifiers_from_value(Some(&json!({"inside_carry": true}))).unwrap();

        assert_eq!(engine.quote(&mapped, &modifiers), engine.quote(&typed, &modifiers));
    }
}
