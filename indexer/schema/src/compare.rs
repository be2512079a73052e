use {
    crate::{Field, FieldValues, Kind, SchemaError, SchemaResult, StateObjectType, Value},
    bigdecimal::BigDecimal,
    itertools::Itertools,
    std::str::FromStr,
};

/// Compare two values of the same kind for semantic equality.
///
/// Integer and decimal strings compare numerically, so `"1.0"` equals `"1"`.
/// Everything else compares structurally. `Null` equals only `Null`.
/// Returns an error if either value has the wrong representation for `kind`.
pub fn compare_kind_values(kind: Kind, a: &Value, b: &Value) -> SchemaResult<bool> {
    match (a, b) {
        (Value::Null, Value::Null) => return Ok(true),
        (Value::Null, other) | (other, Value::Null) => {
            kind.validate_value_type(other)?;
            return Ok(false);
        },
        _ => {},
    }

    kind.validate_value_type(a)?;
    kind.validate_value_type(b)?;

    match (kind, a, b) {
        (Kind::IntegerString | Kind::DecimalString, Value::String(a), Value::String(b)) => {
            Ok(parse_number(kind, a)? == parse_number(kind, b)?)
        },
        _ => Ok(a == b),
    }
}

/// Compare two sets of values for `fields`, field by field.
pub fn compare_field_values(
    fields: &[Field],
    a: &FieldValues,
    b: &FieldValues,
) -> SchemaResult<bool> {
    if fields.is_empty() {
        return Ok(true);
    }

    let (a, b) = (a.to_values(), b.to_values());

    if a.len() != fields.len() || b.len() != fields.len() {
        return Ok(false);
    }

    for ((field, a), b) in fields.iter().zip(&a).zip(&b) {
        if !compare_kind_values(field.kind, a, b)? {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Canonical string form of an object key, usable as a map key. Numerically
/// equal integer and decimal strings produce the same key string. Singletons
/// have the empty key string.
pub fn object_key_string(
    object_type: &StateObjectType,
    key: &FieldValues,
) -> SchemaResult<String> {
    if object_type.is_singleton() {
        return Ok(String::new());
    }

    let values = key.to_values();

    if values.len() != object_type.key_fields.len() {
        return Err(SchemaError::update(
            &object_type.name,
            format!(
                "expected {} key values, got {}",
                object_type.key_fields.len(),
                values.len()
            ),
        ));
    }

    let parts = object_type
        .key_fields
        .iter()
        .zip(&values)
        .map(|(field, value)| match (field.kind, value) {
            (Kind::IntegerString | Kind::DecimalString, Value::String(s)) => {
                Ok(parse_number(field.kind, s)?.normalized().to_string())
            },
            _ => Ok(value.to_string()),
        })
        .collect::<SchemaResult<Vec<_>>>()?;

    Ok(parts.iter().join("/"))
}

fn parse_number(kind: Kind, s: &str) -> SchemaResult<BigDecimal> {
    BigDecimal::from_str(s).map_err(|err| SchemaError::value(kind, err))
}

// ----------------------------------- tests -----------------------------------
