use {
    crate::{EnumType, SchemaResult, StateObjectType},
    serde::{Deserialize, Serialize},
};

/// A named type of a module schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    StateObject(StateObjectType),
    Enum(EnumType),
}

impl SchemaType {
    pub fn name(&self) -> &str {
        match self {
            SchemaType::StateObject(object_type) => &object_type.name,
            SchemaType::Enum(enum_type) => &enum_type.name,
        }
    }

    pub fn validate(&self, type_set: &dyn TypeSet) -> SchemaResult<()> {
        match self {
            SchemaType::StateObject(object_type) => object_type.validate(type_set),
            SchemaType::Enum(enum_type) => enum_type.validate(),
        }
    }

    pub fn as_state_object(&self) -> Option<&StateObjectType> {
        match self {
            SchemaType::StateObject(object_type) => Some(object_type),
            SchemaType::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            SchemaType::Enum(enum_type) => Some(enum_type),
            SchemaType::StateObject(_) => None,
        }
    }
}

impl From<StateObjectType> for SchemaType {
    fn from(object_type: StateObjectType) -> Self {
        SchemaType::StateObject(object_type)
    }
}

impl From<EnumType> for SchemaType {
    fn from(enum_type: EnumType) -> Self {
        SchemaType::Enum(enum_type)
    }
}

/// A set of types that fields may refer to.
pub trait TypeSet {
    fn lookup_type(&self, name: &str) -> Option<&SchemaType>;

    /// Visit every type in a deterministic order; stops when `visit` returns
    /// `false`.
    fn all_types(&self, visit: &mut dyn FnMut(&SchemaType) -> bool);
}

/// A type set containing no types.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTypeSet;

impl TypeSet for EmptyTypeSet {
    fn lookup_type(&self, _name: &str) -> Option<&SchemaType> {
        None
    }

    fn all_types(&self, _visit: &mut dyn FnMut(&SchemaType) -> bool) {}
}
