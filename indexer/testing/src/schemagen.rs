//! Proptest strategies for schemas, values and object updates.
//!
//! Every generated schema compiles, and every generated value and update
//! validates against the schema it was generated for.

use {
    crate::statesim,
    chrono::{DateTime, Utc},
    indexer_schema::{
        view::ObjectCollection as _, EnumType, Field, FieldValues, Kind, MapValueUpdates,
        ModuleSchema, SchemaType, StateObjectType, StateObjectUpdate, Value,
    },
    proptest::{
        collection::{btree_map, btree_set},
        prelude::*,
        sample::{select, subsequence, Index},
        strategy::Union,
    },
    std::{collections::BTreeMap, sync::Arc},
    strum::IntoEnumIterator,
};

/// Latest timestamp generated for time values: 2100-01-01.
const MAX_TIMESTAMP: i64 = 4_102_444_800;

pub fn name() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,15}"
}

pub fn kind() -> impl Strategy<Value = Kind> {
    select(Kind::iter().collect::<Vec<_>>())
}

pub fn key_kind() -> impl Strategy<Value = Kind> {
    select(Kind::iter().filter(Kind::valid_key_kind).collect::<Vec<_>>())
}

fn enum_numeric_kind() -> impl Strategy<Value = Kind> {
    select(
        Kind::iter()
            .filter(Kind::valid_enum_numeric_kind)
            .collect::<Vec<_>>(),
    )
}

// ----------------------------------- types -------------------------------------

/// A field named `name`. Enum fields refer to one of `enum_types`, or
/// become string fields if there is none. Key fields are never nullable.
pub fn field(name: String, enum_types: Vec<String>, key: bool) -> BoxedStrategy<Field> {
    let kind = if key {
        key_kind().boxed()
    } else {
        kind().boxed()
    };

    (kind, any::<bool>(), "[a-z][a-z0-9]{0,9}", any::<Index>())
        .prop_map(move |(kind, nullable, address_prefix, enum_index)| {
            let mut field = Field::new(name.clone(), kind);

            match kind {
                Kind::Address => {
                    field = field.with_address_prefix(address_prefix);
                },
                Kind::Enum if enum_types.is_empty() => {
                    field.kind = Kind::String;
                },
                Kind::Enum => {
                    field = field.with_referenced_type(enum_index.get(&enum_types).clone());
                },
                _ => {},
            }

            if nullable && !key {
                field = field.nullable();
            }

            field
        })
        .boxed()
}

pub fn enum_type(name: String) -> BoxedStrategy<EnumType> {
    (btree_set(self::name(), 1..6), enum_numeric_kind())
        .prop_map(move |(values, numeric_kind)| {
            EnumType::new(name.clone(), values).with_numeric_kind(numeric_kind)
        })
        .boxed()
}

/// An object type named `name` with up to three key fields and a handful of
/// value fields, whose enum fields refer to `enum_types`.
pub fn object_type(name: String, enum_types: Vec<String>) -> BoxedStrategy<StateObjectType> {
    (btree_set(self::name(), 0..7), any::<Index>(), any::<bool>())
        .prop_flat_map(move |(field_names, split, retain_deletions)| {
            let num_keys = split.index(field_names.len().min(3) + 1);

            let fields = field_names
                .into_iter()
                .enumerate()
                .map(|(i, field_name)| field(field_name, enum_types.clone(), i < num_keys))
                .collect::<Vec<_>>();

            (Just(name.clone()), fields, Just(num_keys), Just(retain_deletions))
        })
        .prop_map(|(name, mut key_fields, num_keys, retain_deletions)| {
            let value_fields = key_fields.split_off(num_keys);

            StateObjectType::new(name)
                .with_key_fields(key_fields)
                .with_value_fields(value_fields)
                .with_retain_deletions(retain_deletions)
        })
        .boxed()
}

/// A module schema with at least one object type and up to two enum types.
pub fn module_schema() -> BoxedStrategy<ModuleSchema> {
    (btree_set(name(), 1..8), any::<Index>())
        .prop_flat_map(|(names, split)| {
            let names = names.into_iter().collect::<Vec<_>>();
            let num_enums = split.index(names.len().min(3));
            let (enum_names, object_names) = names.split_at(num_enums);

            let enum_types = enum_names
                .iter()
                .map(|name| enum_type(name.clone()))
                .collect::<Vec<_>>();

            let object_types = object_names
                .iter()
                .map(|name| object_type(name.clone(), enum_names.to_vec()))
                .collect::<Vec<_>>();

            (enum_types, object_types)
        })
        .prop_map(|(enum_types, object_types)| {
            let types = enum_types
                .into_iter()
                .map(SchemaType::from)
                .chain(object_types.into_iter().map(SchemaType::from));

            ModuleSchema::compile(types).expect("generated schema is valid")
        })
        .boxed()
}

/// Schemas of one to three modules, by module name.
pub fn app_schema() -> BoxedStrategy<BTreeMap<String, Arc<ModuleSchema>>> {
    btree_map(name(), module_schema().prop_map(Arc::new), 1..4).boxed()
}

// ----------------------------------- values ------------------------------------

pub fn value_for_kind(kind: Kind, enum_values: Vec<String>) -> BoxedStrategy<Value> {
    match kind {
        Kind::String => "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String).boxed(),
        Kind::Bytes => prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(Value::Bytes)
            .boxed(),
        Kind::Int8 => any::<i8>().prop_map(Value::Int8).boxed(),
        Kind::Int16 => any::<i16>().prop_map(Value::Int16).boxed(),
        Kind::Int32 => any::<i32>().prop_map(Value::Int32).boxed(),
        Kind::Int64 => any::<i64>().prop_map(Value::Int64).boxed(),
        Kind::Uint8 => any::<u8>().prop_map(Value::Uint8).boxed(),
        Kind::Uint16 => any::<u16>().prop_map(Value::Uint16).boxed(),
        Kind::Uint32 => any::<u32>().prop_map(Value::Uint32).boxed(),
        Kind::Uint64 => any::<u64>().prop_map(Value::Uint64).boxed(),
        // Finite only, so values always equal themselves.
        Kind::Float32 => (-1e6_f32..1e6_f32).prop_map(Value::Float32).boxed(),
        Kind::Float64 => (-1e12_f64..1e12_f64).prop_map(Value::Float64).boxed(),
        Kind::IntegerString => any::<i64>()
            .prop_map(|n| Value::String(n.to_string()))
            .boxed(),
        Kind::DecimalString => (any::<i64>(), 0_u32..10_000)
            .prop_map(|(whole, fraction)| Value::String(format!("{whole}.{fraction}")))
            .boxed(),
        Kind::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        Kind::Time => (0..MAX_TIMESTAMP)
            .prop_filter_map("timestamp in range", |secs| {
                DateTime::<Utc>::from_timestamp(secs, 0).map(Value::Time)
            })
            .boxed(),
        Kind::Duration => any::<i64>().prop_map(Value::Duration).boxed(),
        Kind::Address => prop::collection::vec(any::<u8>(), 1..33)
            .prop_map(Value::Bytes)
            .boxed(),
        Kind::Enum if enum_values.is_empty() => Just(Value::Null).boxed(),
        Kind::Enum => select(enum_values).prop_map(Value::String).boxed(),
        Kind::Json => any::<i32>()
            .prop_map(|n| Value::Json(format!(r#"{{"n":{n}}}"#)))
            .boxed(),
    }
}

pub fn value_for_field(field: &Field, schema: &ModuleSchema) -> BoxedStrategy<Value> {
    let enum_values = field
        .referenced_type
        .as_deref()
        .and_then(|name| schema.lookup_enum_type(name))
        .map(|enum_type| enum_type.values.iter().map(|value| value.name.clone()).collect())
        .unwrap_or_default();

    let value = value_for_kind(field.kind, enum_values);

    if field.nullable {
        prop_oneof![1 => Just(Value::Null), 4 => value].boxed()
    } else {
        value
    }
}

pub fn field_values(fields: &[Field], schema: &ModuleSchema) -> BoxedStrategy<FieldValues> {
    fields
        .iter()
        .map(|field| value_for_field(field, schema))
        .collect::<Vec<_>>()
        .prop_map(FieldValues::from_values)
        .boxed()
}

pub fn key_for_object_type(
    object_type: &StateObjectType,
    schema: &ModuleSchema,
) -> BoxedStrategy<FieldValues> {
    field_values(&object_type.key_fields, schema)
}

pub fn value_for_object_type(
    object_type: &StateObjectType,
    schema: &ModuleSchema,
) -> BoxedStrategy<FieldValues> {
    field_values(&object_type.value_fields, schema)
}

/// New values for a non-empty subset of the value fields.
pub fn value_updates(
    object_type: &StateObjectType,
    schema: &ModuleSchema,
) -> BoxedStrategy<MapValueUpdates> {
    let fields = object_type
        .value_fields
        .iter()
        .map(|field| (field.name.clone(), value_for_field(field, schema)))
        .collect::<Vec<_>>();

    if fields.is_empty() {
        return Just(MapValueUpdates::new()).boxed();
    }

    let len = fields.len();

    subsequence(fields, 1..=len)
        .prop_flat_map(|chosen| {
            let (names, values): (Vec<_>, Vec<_>) = chosen.into_iter().unzip();
            (Just(names), values)
        })
        .prop_map(|(names, values)| MapValueUpdates(names.into_iter().zip(values).collect()))
        .boxed()
}

// ----------------------------------- updates -----------------------------------

pub fn insert(
    object_type: &StateObjectType,
    schema: &ModuleSchema,
) -> BoxedStrategy<StateObjectUpdate> {
    let name = object_type.name.clone();

    (
        key_for_object_type(object_type, schema),
        value_for_object_type(object_type, schema),
    )
        .prop_map(move |(key, value)| StateObjectUpdate::insert(name.clone(), key, value))
        .boxed()
}

/// Inserts, and now and then a delete, of arbitrary keys.
pub fn state_object_update(
    object_type: &StateObjectType,
    schema: &ModuleSchema,
) -> BoxedStrategy<StateObjectUpdate> {
    let name = object_type.name.clone();
    let delete = key_for_object_type(object_type, schema)
        .prop_map(move |key| StateObjectUpdate::delete(name.clone(), key));

    prop_oneof![4 => insert(object_type, schema), 1 => delete].boxed()
}

/// Updates that make sense against the current state of `collection`: new
/// inserts anywhere, and deletes and partial updates of objects that exist.
pub fn state_object_update_for_collection(
    collection: &statesim::ObjectCollection,
) -> BoxedStrategy<StateObjectUpdate> {
    let object_type = collection.object_type().clone();
    let schema = collection.schema().clone();

    let existing = collection
        .live_objects()
        .map(|object| object.key.clone())
        .collect::<Vec<_>>();

    if existing.is_empty() {
        return insert(&object_type, &schema);
    }

    let name = object_type.name.clone();

    let delete = select(existing.clone())
        .prop_map(move |key| StateObjectUpdate::delete(name.clone(), key))
        .boxed();

    let mut options = vec![(3, insert(&object_type, &schema)), (1, delete)];

    if !object_type.value_fields.is_empty() {
        let name = object_type.name.clone();

        let partial = (select(existing), value_updates(&object_type, &schema))
            .prop_map(move |(key, updates)| StateObjectUpdate::insert(name.clone(), key, updates))
            .boxed();

        options.push((2, partial));
    }

    Union::new_weighted(options).boxed()
}

// ----------------------------------- tests -----------------------------------
