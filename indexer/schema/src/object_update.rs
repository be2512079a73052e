use {
    crate::{SchemaResult, Value},
    std::{collections::BTreeMap, fmt, sync::Arc},
};

/// Values for an ordered list of fields.
///
/// - zero fields: [`FieldValues::Empty`];
/// - one field: [`FieldValues::Single`];
/// - two or more fields: [`FieldValues::Multiple`], one value per field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValues {
    #[default]
    Empty,
    Single(Value),
    Multiple(Vec<Value>),
}

impl FieldValues {
    /// Build the canonical representation for `values`.
    pub fn from_values(mut values: Vec<Value>) -> Self {
        match values.len() {
            0 => FieldValues::Empty,
            1 => FieldValues::Single(values.remove(0)),
            _ => FieldValues::Multiple(values),
        }
    }

    /// Flatten into one value per field.
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            FieldValues::Empty => vec![],
            FieldValues::Single(value) => vec![value.clone()],
            FieldValues::Multiple(values) => values.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValues::Empty => 0,
            FieldValues::Single(_) => 1,
            FieldValues::Multiple(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Value> for FieldValues {
    fn from(value: Value) -> Self {
        FieldValues::Single(value)
    }
}

impl From<Vec<Value>> for FieldValues {
    fn from(values: Vec<Value>) -> Self {
        FieldValues::Multiple(values)
    }
}

/// A partial update of an object's value fields: only the fields it visits
/// have changed.
pub trait ValueUpdates: Send + Sync + fmt::Debug {
    /// Visit every updated field. Iteration stops early when `visit` returns
    /// `false`.
    fn iterate(&self, visit: &mut dyn FnMut(&str, &Value) -> bool) -> SchemaResult<()>;
}

/// [`ValueUpdates`] backed by a map from field name to new value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapValueUpdates(pub BTreeMap<String, Value>);

impl MapValueUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        self.0.insert(name.into(), value.into());
        self
    }
}

impl ValueUpdates for MapValueUpdates {
    fn iterate(&self, visit: &mut dyn FnMut(&str, &Value) -> bool) -> SchemaResult<()> {
        for (name, value) in &self.0 {
            if !visit(name, value) {
                break;
            }
        }

        Ok(())
    }
}

/// Collect a [`ValueUpdates`] into an ordered map.
pub fn collect_value_updates(updates: &dyn ValueUpdates) -> SchemaResult<BTreeMap<String, Value>> {
    let mut map = BTreeMap::new();

    updates.iterate(&mut |name, value| {
        map.insert(name.to_string(), value.clone());
        true
    })?;

    Ok(map)
}

/// The value position of an object update: either a full set of value
/// fields, or a partial update.
#[derive(Debug, Clone)]
pub enum ObjectValue {
    Fields(FieldValues),
    Updates(Arc<dyn ValueUpdates>),
}

impl Default for ObjectValue {
    fn default() -> Self {
        ObjectValue::Fields(FieldValues::Empty)
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ObjectValue::Fields(a), ObjectValue::Fields(b)) => a == b,
            (ObjectValue::Updates(a), ObjectValue::Updates(b)) => {
                match (collect_value_updates(a.as_ref()), collect_value_updates(b.as_ref())) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            },
            _ => false,
        }
    }
}

impl From<FieldValues> for ObjectValue {
    fn from(values: FieldValues) -> Self {
        ObjectValue::Fields(values)
    }
}

impl From<Value> for ObjectValue {
    fn from(value: Value) -> Self {
        ObjectValue::Fields(FieldValues::Single(value))
    }
}

impl From<Vec<Value>> for ObjectValue {
    fn from(values: Vec<Value>) -> Self {
        ObjectValue::Fields(FieldValues::Multiple(values))
    }
}

impl From<MapValueUpdates> for ObjectValue {
    fn from(updates: MapValueUpdates) -> Self {
        ObjectValue::Updates(Arc::new(updates))
    }
}

/// An insert, update or delete of a single object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateObjectUpdate {
    pub type_name: String,
    pub key: FieldValues,
    /// Ignored when `delete` is set.
    pub value: ObjectValue,
    pub delete: bool,
}

impl StateObjectUpdate {
    pub fn insert<T, K, V>(type_name: T, key: K, value: V) -> Self
    where
        T: Into<String>,
        K: Into<FieldValues>,
        V: Into<ObjectValue>,
    {
        Self {
            type_name: type_name.into(),
            key: key.into(),
            value: value.into(),
            delete: false,
        }
    }

    pub fn delete<T, K>(type_name: T, key: K) -> Self
    where
        T: Into<String>,
        K: Into<FieldValues>,
    {
        Self {
            type_name: type_name.into(),
            key: key.into(),
            value: ObjectValue::default(),
            delete: true,
        }
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_field_values() {
        assert_eq!(FieldValues::from_values(vec![]), FieldValues::Empty);
        assert_eq!(
            FieldValues::from_values(vec![Value::Int32(1)]),
            FieldValues::Single(Value::Int32(1))
        );
        assert_eq!(
            FieldValues::from_values(vec![Value::Int32(1), Value::Int32(2)]).len(),
            2
        );
    }

    #[test]
    fn value_updates_iterate_stops_early() {
        let updates = MapValueUpdates::new()
            .with("a", 1_i32)
            .with("b", 2_i32)
            .with("c", 3_i32);

        let mut seen = vec![];
        updates
            .iterate(&mut |name, _| {
                seen.push(name.to_string());
                seen.len() < 2
            })
            .unwrap();

        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn partial_values_compare_by_content() {
        let a: ObjectValue = MapValueUpdates::new().with("x", 1_u64).into();
        let b: ObjectValue = MapValueUpdates::new().with("x", 1_u64).into();
        let c: ObjectValue = Value::Uint64(1).into();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
