use {
    crate::{validate_name, Kind, SchemaError, SchemaResult, SchemaType, TypeSet, Value},
    serde::{Deserialize, Serialize},
};

/// A named, kinded, optionally nullable value descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    /// Human-readable prefix of the address codec, e.g. `cosmos`. Required
    /// for, and only allowed on, [`Kind::Address`] fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    /// Name of the enum type this field refers to. Required for, and only
    /// allowed on, [`Kind::Enum`] fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_type: Option<String>,
}

impl Field {
    pub fn new<N>(name: N, kind: Kind) -> Self
    where
        N: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            address_prefix: None,
            referenced_type: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_address_prefix<P>(mut self, prefix: P) -> Self
    where
        P: Into<String>,
    {
        self.address_prefix = Some(prefix.into());
        self
    }

    pub fn with_referenced_type<T>(mut self, enum_type: T) -> Self
    where
        T: Into<String>,
    {
        self.referenced_type = Some(enum_type.into());
        self
    }

    pub fn validate(&self, type_set: &dyn TypeSet) -> SchemaResult<()> {
        validate_name(&self.name).map_err(|err| SchemaError::field(&self.name, err))?;

        self.kind
            .validate()
            .map_err(|err| SchemaError::field(&self.name, err))?;

        match (&self.kind, &self.address_prefix) {
            (Kind::Address, None) => {
                return Err(SchemaError::field(
                    &self.name,
                    "address field is missing an address prefix",
                ));
            },
            (Kind::Address, Some(prefix)) if !is_valid_address_prefix(prefix) => {
                return Err(SchemaError::field(
                    &self.name,
                    format!("illegal address prefix `{prefix}`"),
                ));
            },
            (Kind::Address, Some(_)) => {},
            (kind, Some(_)) => {
                return Err(SchemaError::field(
                    &self.name,
                    format!("address prefix is only allowed on address fields, found kind {kind}"),
                ));
            },
            (_, None) => {},
        }

        match (&self.kind, &self.referenced_type) {
            (Kind::Enum, None) => {
                return Err(SchemaError::field(
                    &self.name,
                    "enum field is missing a referenced type",
                ));
            },
            (Kind::Enum, Some(name)) => match type_set.lookup_type(name) {
                Some(SchemaType::Enum(_)) => {},
                Some(_) => {
                    return Err(SchemaError::field(
                        &self.name,
                        format!("referenced type `{name}` is not an enum type"),
                    ));
                },
                None => {
                    return Err(SchemaError::field(
                        &self.name,
                        format!("referenced enum type `{name}` not found"),
                    ));
                },
            },
            (kind, Some(_)) => {
                return Err(SchemaError::field(
                    &self.name,
                    format!("referenced type is only allowed on enum fields, found kind {kind}"),
                ));
            },
            (_, None) => {},
        }

        Ok(())
    }

    /// Validate a value for this field. Assumes the field itself is valid.
    pub fn validate_value(&self, value: &Value, type_set: &dyn TypeSet) -> SchemaResult<()> {
        if value.is_null() {
            if self.nullable {
                return Ok(());
            }

            return Err(SchemaError::field_value(
                &self.name,
                "null value for a non-nullable field",
            ));
        }

        self.kind
            .validate_value(value)
            .map_err(|err| SchemaError::field_value(&self.name, err))?;

        if let (Kind::Enum, Some(name), Value::String(variant)) =
            (&self.kind, &self.referenced_type, value)
        {
            let Some(SchemaType::Enum(enum_type)) = type_set.lookup_type(name) else {
                return Err(SchemaError::field_value(
                    &self.name,
                    format!("referenced enum type `{name}` not found"),
                ));
            };

            enum_type
                .validate_value(variant)
                .map_err(|err| SchemaError::field_value(&self.name, err))?;
        }

        Ok(())
    }
}

/// Address prefixes follow the bech32 human-readable part rules we care
/// about: non-empty, lowercase ASCII letters and digits.
fn is_valid_address_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.len() <= 83
        && prefix
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Validate a list of fields: every field is valid and names are unique.
pub(crate) fn validate_fields<'a, I>(fields: I, type_set: &dyn TypeSet) -> SchemaResult<()>
where
    I: IntoIterator<Item = &'a Field>,
{
    let mut seen = std::collections::BTreeSet::new();

    for field in fields {
        field.validate(type_set)?;

        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::field(&field.name, "duplicate field name"));
        }
    }

    Ok(())
}

// ----------------------------------- tests -----------------------------------
