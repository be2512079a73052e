use {
    crate::{validate_name, Kind, SchemaError, SchemaResult},
    serde::{Deserialize, Serialize},
    std::collections::BTreeSet,
};

/// A named set of `(name, value)` pairs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<EnumValueDefinition>,
    /// The integer kind the numeric values are encoded with. Defaults to
    /// [`Kind::Int32`].
    #[serde(default = "default_numeric_kind")]
    pub numeric_kind: Kind,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDefinition {
    pub name: String,
    pub value: i32,
}

fn default_numeric_kind() -> Kind {
    Kind::Int32
}

impl EnumType {
    /// Create an enum type whose values are numbered from zero in the given
    /// order.
    pub fn new<N, I, V>(name: N, values: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .zip(0..)
                .map(|(name, value)| EnumValueDefinition {
                    name: name.into(),
                    value,
                })
                .collect(),
            numeric_kind: default_numeric_kind(),
        }
    }

    pub fn with_numeric_kind(mut self, numeric_kind: Kind) -> Self {
        self.numeric_kind = numeric_kind;
        self
    }

    pub fn validate(&self) -> SchemaResult<()> {
        validate_name(&self.name).map_err(|err| SchemaError::enum_type(&self.name, err))?;

        if self.values.is_empty() {
            return Err(SchemaError::enum_type(
                &self.name,
                "enum type must have at least one value",
            ));
        }

        if !self.numeric_kind.valid_enum_numeric_kind() {
            return Err(SchemaError::enum_type(
                &self.name,
                format!("invalid numeric kind {}", self.numeric_kind),
            ));
        }

        let mut names = BTreeSet::new();
        let mut numbers = BTreeSet::new();

        for value in &self.values {
            validate_name(&value.name).map_err(|err| SchemaError::enum_type(&self.name, err))?;

            if !names.insert(value.name.as_str()) {
                return Err(SchemaError::enum_type(
                    &self.name,
                    format!("duplicate enum value name `{}`", value.name),
                ));
            }

            if !numbers.insert(value.value) {
                return Err(SchemaError::enum_type(
                    &self.name,
                    format!("duplicate enum numeric value {}", value.value),
                ));
            }

            if !fits_numeric_kind(value.value, self.numeric_kind) {
                return Err(SchemaError::enum_type(
                    &self.name,
                    format!(
                        "enum value `{}` = {} does not fit in {}",
                        value.name, value.value, self.numeric_kind
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Check that `name` is one of this enum's values.
    pub fn validate_value(&self, name: &str) -> SchemaResult<()> {
        if self.get_value_by_name(name).is_none() {
            return Err(SchemaError::enum_type(
                &self.name,
                format!("`{name}` is not a value of this enum"),
            ));
        }

        Ok(())
    }

    pub fn get_value_by_name(&self, name: &str) -> Option<&EnumValueDefinition> {
        self.values.iter().find(|value| value.name == name)
    }

    pub fn get_value_by_number(&self, number: i32) -> Option<&EnumValueDefinition> {
        self.values.iter().find(|value| value.value == number)
    }
}

fn fits_numeric_kind(value: i32, kind: Kind) -> bool {
    match kind {
        Kind::Int8 => i8::try_from(value).is_ok(),
        Kind::Int16 => i16::try_from(value).is_ok(),
        Kind::Int32 => true,
        Kind::Uint8 => u8::try_from(value).is_ok(),
        Kind::Uint16 => u16::try_from(value).is_ok(),
        _ => false,
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    fn def(name: &str, value: i32) -> EnumValueDefinition {
        EnumValueDefinition {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn new_numbers_from_zero() {
        let enum_type = EnumType::new("status", ["pending", "done"]);

        assert_eq!(enum_type.values, vec![def("pending", 0), def("done", 1)]);
        assert_eq!(enum_type.numeric_kind, Kind::Int32);
        enum_type.validate().unwrap();
    }

    #[test_case(EnumType::new("1bad", ["a"]) => false; "bad name")]
    #[test_case(EnumType::new("empty", Vec::<String>::new()) => false; "no values")]
    #[test_case(EnumType::new("dup", ["a", "a"]) => false; "duplicate names")]
    #[test_case(EnumType::new("badvalue", ["a", "b-c"]) => false; "bad value name")]
    #[test_case(EnumType::new("ok", ["a"]).with_numeric_kind(Kind::Uint8) => true; "uint8")]
    #[test_case(EnumType::new("float", ["a"]).with_numeric_kind(Kind::Float32) => false; "float kind")]
    fn validate(enum_type: EnumType) -> bool {
        enum_type.validate().is_ok()
    }

    #[test]
    fn duplicate_numbers() {
        let enum_type = EnumType {
            name: "dup".to_string(),
            values: vec![def("a", 1), def("b", 1)],
            numeric_kind: Kind::Int32,
        };

        assert!(enum_type.validate().is_err());
    }

    #[test]
    fn values_must_fit_numeric_kind() {
        let enum_type = EnumType {
            name: "small".to_string(),
            values: vec![def("a", -1)],
            numeric_kind: Kind::Uint8,
        };

        assert!(enum_type.validate().is_err());
    }

    #[test]
    fn lookups() {
        let enum_type = EnumType::new("status", ["pending", "done"]);

        assert_eq!(enum_type.get_value_by_number(1), Some(&def("done", 1)));
        assert!(enum_type.get_value_by_name("missing").is_none());
        assert!(enum_type.validate_value("pending").is_ok());
        assert!(enum_type.validate_value("missing").is_err());
    }
}
