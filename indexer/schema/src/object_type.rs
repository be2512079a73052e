use {
    crate::{
        field::validate_fields, validate_name, Field, FieldValues, ObjectValue, SchemaError,
        SchemaResult, StateObjectUpdate, TypeSet,
    },
    serde::{Deserialize, Serialize},
};

/// A table-like type of module state: an ordered key, an ordered value, and
/// a deletion policy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StateObjectType {
    pub name: String,
    /// Zero key fields makes this type a singleton.
    #[serde(default)]
    pub key_fields: Vec<Field>,
    #[serde(default)]
    pub value_fields: Vec<Field>,
    /// If set, indexers may keep deleted objects around, flagged as deleted,
    /// instead of removing them.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retain_deletions: bool,
}

impl StateObjectType {
    pub fn new<N>(name: N) -> Self
    where
        N: Into<String>,
    {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_key_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        self.key_fields = fields.into_iter().collect();
        self
    }

    pub fn with_value_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        self.value_fields = fields.into_iter().collect();
        self
    }

    pub fn with_retain_deletions(mut self, retain_deletions: bool) -> Self {
        self.retain_deletions = retain_deletions;
        self
    }

    pub fn is_singleton(&self) -> bool {
        self.key_fields.is_empty()
    }

    pub fn value_field(&self, name: &str) -> Option<&Field> {
        self.value_fields.iter().find(|field| field.name == name)
    }

    pub fn validate(&self, type_set: &dyn TypeSet) -> SchemaResult<()> {
        validate_name(&self.name).map_err(|err| SchemaError::object_type(&self.name, err))?;

        for field in &self.key_fields {
            if !field.kind.valid_key_kind() {
                return Err(SchemaError::object_type(
                    &self.name,
                    format!(
                        "key field `{}` has kind {}, which cannot be used in a key",
                        field.name, field.kind
                    ),
                ));
            }

            if field.nullable {
                return Err(SchemaError::object_type(
                    &self.name,
                    format!("key field `{}` cannot be nullable", field.name),
                ));
            }
        }

        validate_fields(self.key_fields.iter().chain(&self.value_fields), type_set)
            .map_err(|err| SchemaError::object_type(&self.name, err))
    }

    pub fn validate_key(&self, key: &FieldValues, type_set: &dyn TypeSet) -> SchemaResult<()> {
        validate_field_values(&self.name, "key", &self.key_fields, key, type_set)
    }

    pub fn validate_value(&self, value: &ObjectValue, type_set: &dyn TypeSet) -> SchemaResult<()> {
        match value {
            ObjectValue::Fields(values) => {
                validate_field_values(&self.name, "value", &self.value_fields, values, type_set)
            },
            ObjectValue::Updates(updates) => {
                let mut result = Ok(());

                updates.iterate(&mut |name, value| {
                    result = match self.value_field(name) {
                        Some(field) => field.validate_value(value, type_set),
                        None => Err(SchemaError::update(
                            &self.name,
                            format!("unknown value field `{name}`"),
                        )),
                    };
                    result.is_ok()
                })?;

                result
            },
        }
    }

    pub fn validate_object_update(
        &self,
        update: &StateObjectUpdate,
        type_set: &dyn TypeSet,
    ) -> SchemaResult<()> {
        if update.type_name != self.name {
            return Err(SchemaError::update(
                &self.name,
                format!("update is for type `{}`", update.type_name),
            ));
        }

        self.validate_key(&update.key, type_set)?;

        if update.delete {
            return Ok(());
        }

        self.validate_value(&update.value, type_set)
    }
}

fn validate_field_values(
    object_type: &str,
    position: &str,
    fields: &[Field],
    values: &FieldValues,
    type_set: &dyn TypeSet,
) -> SchemaResult<()> {
    match (fields, values) {
        ([], _) => Ok(()),
        ([field], FieldValues::Single(value)) => field.validate_value(value, type_set),
        ([_], _) => Err(SchemaError::update(
            object_type,
            format!("expected a single {position} value"),
        )),
        (fields, FieldValues::Multiple(values)) => {
            if fields.len() != values.len() {
                return Err(SchemaError::update(
                    object_type,
                    format!(
                        "expected {} {position} values, got {}",
                        fields.len(),
                        values.len()
                    ),
                ));
            }

            fields
                .iter()
                .zip(values)
                .try_for_each(|(field, value)| field.validate_value(value, type_set))
        },
        (fields, _) => Err(SchemaError::update(
            object_type,
            format!("expected {} {position} values as a sequence", fields.len()),
        )),
    }
}

// ----------------------------------- tests -----------------------------------
