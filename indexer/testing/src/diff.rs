use indexer_schema::{
    compare_field_values, object_key_string,
    view::{AppState, ModuleState, ObjectCollection},
    FieldValues, ObjectValue, SchemaResult, StateObjectType, StateObjectUpdate,
};

/// Describe how `actual` differs from `expected`, one line per difference.
/// Empty if they hold the same state.
pub fn diff_app_states(expected: &dyn AppState, actual: &dyn AppState) -> SchemaResult<String> {
    let mut lines = vec![];

    let (expected_len, actual_len) = (expected.num_modules()?, actual.num_modules()?);
    if expected_len != actual_len {
        lines.push(format!("NUM MODULES: expected {expected_len}, got {actual_len}"));
    }

    for expected_module in expected.modules()? {
        let name = expected_module.module_name();

        match actual.get_module(name)? {
            None => lines.push(format!("Module {name}: NOT FOUND")),
            Some(actual_module) => {
                let diff = diff_module_states(expected_module.as_ref(), actual_module.as_ref())?;
                push_nested(&mut lines, format!("Module {name}"), &diff);
            },
        }
    }

    Ok(lines.join("\n"))
}

pub fn diff_module_states(
    expected: &dyn ModuleState,
    actual: &dyn ModuleState,
) -> SchemaResult<String> {
    let mut lines = vec![];

    let (expected_len, actual_len) = (
        expected.num_object_collections()?,
        actual.num_object_collections()?,
    );
    if expected_len != actual_len {
        lines.push(format!(
            "NUM COLLECTIONS: expected {expected_len}, got {actual_len}"
        ));
    }

    for expected_collection in expected.object_collections()? {
        let name = &expected_collection.object_type().name;

        match actual.get_object_collection(name)? {
            None => lines.push(format!("Collection {name}: NOT FOUND")),
            Some(actual_collection) => {
                let diff = diff_object_collections(
                    expected_collection.as_ref(),
                    actual_collection.as_ref(),
                )?;
                push_nested(&mut lines, format!("Collection {name}"), &diff);
            },
        }
    }

    Ok(lines.join("\n"))
}

pub fn diff_object_collections(
    expected: &dyn ObjectCollection,
    actual: &dyn ObjectCollection,
) -> SchemaResult<String> {
    let mut lines = vec![];
    let object_type = expected.object_type();

    let (expected_len, actual_len) = (expected.len()?, actual.len()?);
    if expected_len != actual_len {
        lines.push(format!("OBJECT COUNT: expected {expected_len}, got {actual_len}"));
    }

    for expected_object in expected.all_state()? {
        let key = object_key_string(object_type, &expected_object.key)?;

        match actual.get_object(&expected_object.key)? {
            None => lines.push(format!("Object {key}: NOT FOUND")),
            Some(actual_object) => {
                let diff = diff_objects(object_type, &expected_object, &actual_object)?;
                push_nested(&mut lines, format!("Object {key}"), &diff);
            },
        }
    }

    for actual_object in actual.all_state()? {
        if expected.get_object(&actual_object.key)?.is_none() {
            let key = object_key_string(object_type, &actual_object.key)?;
            lines.push(format!("Object {key}: UNEXPECTED"));
        }
    }

    Ok(lines.join("\n"))
}

fn diff_objects(
    object_type: &StateObjectType,
    expected: &StateObjectUpdate,
    actual: &StateObjectUpdate,
) -> SchemaResult<String> {
    let mut lines = vec![];

    if !compare_field_values(&object_type.key_fields, &expected.key, &actual.key)? {
        lines.push(format!("KEY: expected {:?}, got {:?}", expected.key, actual.key));
    }

    if expected.delete != actual.delete {
        lines.push(format!(
            "DELETED: expected {}, got {}",
            expected.delete, actual.delete
        ));
    }

    match (full_values(&expected.value), full_values(&actual.value)) {
        (Some(expected_values), Some(actual_values)) => {
            if !compare_field_values(&object_type.value_fields, expected_values, actual_values)? {
                lines.push(format!(
                    "VALUE: expected {expected_values:?}, got {actual_values:?}"
                ));
            }
        },
        _ => lines.push("VALUE: partial updates can't be compared".to_string()),
    }

    Ok(lines.join("\n"))
}

fn full_values(value: &ObjectValue) -> Option<&FieldValues> {
    match value {
        ObjectValue::Fields(values) => Some(values),
        ObjectValue::Updates(_) => None,
    }
}

fn push_nested(lines: &mut Vec<String>, header: String, diff: &str) {
    if diff.is_empty() {
        return;
    }

    lines.push(header);
    lines.extend(diff.lines().map(|line| format!("  {line}")));
}

// ----------------------------------- tests -----------------------------------
