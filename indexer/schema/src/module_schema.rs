use {
    crate::{EnumType, SchemaError, SchemaResult, SchemaType, StateObjectType, TypeSet},
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::collections::{btree_map::Entry, BTreeMap},
};

/// The compiled schema of one module: a name-sorted set of object and enum
/// types that is valid against itself.
///
/// A `ModuleSchema` can only be obtained through [`ModuleSchema::compile`]
/// (or by deserializing, which compiles), so holding one means it's valid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleSchema {
    types: BTreeMap<String, SchemaType>,
}

impl ModuleSchema {
    /// Build a schema from a list of types. Fails if two types share a name,
    /// or if any type is invalid in the context of the others.
    pub fn compile<I>(types: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = SchemaType>,
    {
        let mut map = BTreeMap::new();

        for ty in types {
            match map.entry(ty.name().to_string()) {
                Entry::Vacant(entry) => {
                    entry.insert(ty);
                },
                Entry::Occupied(entry) => {
                    return Err(SchemaError::SchemaValidation(format!(
                        "duplicate type name `{}`",
                        entry.key()
                    )));
                },
            }
        }

        let schema = Self { types: map };
        schema.validate()?;

        Ok(schema)
    }

    pub fn validate(&self) -> SchemaResult<()> {
        self.types.values().try_for_each(|ty| ty.validate(self))
    }

    pub fn lookup_state_object_type(&self, name: &str) -> Option<&StateObjectType> {
        self.types.get(name).and_then(SchemaType::as_state_object)
    }

    pub fn lookup_enum_type(&self, name: &str) -> Option<&EnumType> {
        self.types.get(name).and_then(SchemaType::as_enum)
    }

    /// Object types in name order.
    pub fn state_object_types(&self) -> impl Iterator<Item = &StateObjectType> {
        self.types.values().filter_map(SchemaType::as_state_object)
    }

    /// Enum types in name order.
    pub fn enum_types(&self) -> impl Iterator<Item = &EnumType> {
        self.types.values().filter_map(SchemaType::as_enum)
    }

    pub fn types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn to_json(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TypeSet for ModuleSchema {
    fn lookup_type(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    fn all_types(&self, visit: &mut dyn FnMut(&SchemaType) -> bool) {
        for ty in self.types.values() {
            if !visit(ty) {
                break;
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound(deserialize = "O: Deserialize<'de>, E: Deserialize<'de>"))]
struct EncodedModuleSchema<O, E> {
    #[serde(default)]
    object_types: Vec<O>,
    #[serde(default)]
    enum_types: Vec<E>,
}

impl Serialize for ModuleSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        EncodedModuleSchema {
            object_types: self.state_object_types().collect(),
            enum_types: self.enum_types().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModuleSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = EncodedModuleSchema::<StateObjectType, EnumType>::deserialize(deserializer)?;

        let types = encoded
            .object_types
            .into_iter()
            .map(SchemaType::from)
            .chain(encoded.enum_types.into_iter().map(SchemaType::from));

        ModuleSchema::compile(types).map_err(de::Error::custom)
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{Field, Kind},
    };

    fn bank_schema() -> ModuleSchema {
        ModuleSchema::compile(vec![
            StateObjectType::new("balances")
                .with_key_fields([
                    Field::new("address", Kind::Address).with_address_prefix("cosmos"),
                    Field::new("denom", Kind::String),
                ])
                .with_value_fields([Field::new("amount", Kind::IntegerString)])
                .into(),
            StateObjectType::new("supply")
                .with_key_fields([Field::new("denom", Kind::String)])
                .with_value_fields([
                    Field::new("amount", Kind::IntegerString),
                    Field::new("status", Kind::Enum).with_referenced_type("status"),
                ])
                .with_retain_deletions(true)
                .into(),
            EnumType::new("status", ["active", "frozen"]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn compile_and_lookup() {
        let schema = bank_schema();

        assert!(schema.lookup_state_object_type("balances").is_some());
        assert!(schema.lookup_state_object_type("status").is_none());
        assert!(schema.lookup_enum_type("status").is_some());
        assert!(schema.lookup_enum_type("missing").is_none());

        let names = schema
            .state_object_types()
            .map(|ty| ty.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["balances", "supply"]);
    }

    #[test]
    fn duplicate_type_names_are_rejected() {
        let res = ModuleSchema::compile(vec![
            StateObjectType::new("foo").into(),
            EnumType::new("foo", ["a"]).into(),
        ]);

        assert!(matches!(res, Err(SchemaError::SchemaValidation(_))));
    }

    #[test]
    fn dangling_enum_reference_is_rejected() {
        let res = ModuleSchema::compile(vec![StateObjectType::new("foo")
            .with_value_fields([Field::new("e", Kind::Enum).with_referenced_type("missing")])
            .into()]);

        assert!(res.is_err());
    }

    #[test]
    fn enum_reference_to_object_type_is_rejected() {
        let res = ModuleSchema::compile(vec![
            StateObjectType::new("bar").into(),
            StateObjectType::new("foo")
                .with_value_fields([Field::new("e", Kind::Enum).with_referenced_type("bar")])
                .into(),
        ]);

        assert!(res.is_err());
    }

    #[test]
    fn json_round_trip() {
        let schema = bank_schema();
        let json = schema.to_json().unwrap();

        assert_eq!(ModuleSchema::from_json(&json).unwrap(), schema);
    }

    #[test]
    fn decoding_validates() {
        let json = r#"{
            "object_types": [
                { "name": "foo", "key_fields": [{ "name": "f", "kind": "float64" }] }
            ]
        }"#;

        assert!(ModuleSchema::from_json(json).is_err());
    }

    #[test]
    fn decoding_enum_and_object_types() {
        let json = r#"{
            "object_types": [
                {
                    "name": "foo",
                    "key_fields": [{ "name": "id", "kind": "uint32" }],
                    "value_fields": [
                        { "name": "color", "kind": "enum", "referenced_type": "color" }
                    ]
                }
            ],
            "enum_types": [
                {
                    "name": "color",
                    "values": [{ "name": "red", "value": 0 }, { "name": "green", "value": 1 }]
                }
            ]
        }"#;

        let expected = ModuleSchema::compile(vec![
            StateObjectType::new("foo")
                .with_key_fields([Field::new("id", Kind::Uint32)])
                .with_value_fields([Field::new("color", Kind::Enum).with_referenced_type("color")])
                .into(),
            EnumType::new("color", ["red", "green"]).into(),
        ])
        .unwrap();

        assert_eq!(ModuleSchema::from_json(json).unwrap(), expected);
    }

    #[test]
    fn missing_type_lists_default_to_empty() {
        let json = r#"{ "object_types": [{ "name": "foo" }] }"#;
        let expected = ModuleSchema::compile(vec![StateObjectType::new("foo").into()]).unwrap();

        assert_eq!(ModuleSchema::from_json(json).unwrap(), expected);
        assert_eq!(ModuleSchema::from_json("{}").unwrap(), ModuleSchema::default());
    }

    #[test]
    fn all_types_stops_early() {
        let schema = bank_schema();
        let mut count = 0;

        schema.all_types(&mut |_| {
            count += 1;
            false
        });

        assert_eq!(count, 1);
    }
}
