use {
    crate::{SchemaError, SchemaResult, Value},
    serde::{Deserialize, Serialize},
    std::str::FromStr,
    strum_macros::{AsRefStr, Display, EnumIter, EnumString},
};

/// The primitive value domain of a field.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Kind {
    String,
    Bytes,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    /// Arbitrary-precision signed integer encoded as a decimal string.
    #[serde(rename = "integer")]
    #[strum(serialize = "integer")]
    IntegerString,
    /// Arbitrary-precision decimal encoded as a string, optionally in
    /// exponent form.
    #[serde(rename = "decimal")]
    #[strum(serialize = "decimal")]
    DecimalString,
    Bool,
    Time,
    Duration,
    /// Opaque address bytes, rendered to strings by an address codec.
    Address,
    Enum,
    Json,
}

impl Kind {
    /// Parse a kind from its canonical name.
    pub fn parse(name: &str) -> SchemaResult<Self> {
        Kind::from_str(name).map_err(|_| SchemaError::InvalidKind(name.to_string()))
    }

    /// Kinds are closed over their variants, so a constructed kind is always
    /// valid; invalid kinds are rejected when parsed.
    pub fn validate(&self) -> SchemaResult<()> {
        Ok(())
    }

    /// Whether fields of this kind may be part of an object key.
    pub fn valid_key_kind(&self) -> bool {
        !matches!(
            self,
            Kind::Float32 | Kind::Float64 | Kind::Json | Kind::Duration
        )
    }

    /// Whether this kind may be used as the numeric kind of an enum type.
    pub fn valid_enum_numeric_kind(&self) -> bool {
        matches!(
            self,
            Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Uint8 | Kind::Uint16
        )
    }

    /// Check that `value` uses the representation this kind accepts. Does not
    /// check the value's format; see [`Kind::validate_value`].
    pub fn validate_value_type(&self, value: &Value) -> SchemaResult<()> {
        let ok = matches!(
            (self, value),
            (
                Kind::String | Kind::IntegerString | Kind::DecimalString | Kind::Enum,
                Value::String(_)
            ) | (Kind::Bytes | Kind::Address, Value::Bytes(_))
                | (Kind::Int8, Value::Int8(_))
                | (Kind::Int16, Value::Int16(_))
                | (Kind::Int32, Value::Int32(_))
                | (Kind::Int64, Value::Int64(_))
                | (Kind::Uint8, Value::Uint8(_))
                | (Kind::Uint16, Value::Uint16(_))
                | (Kind::Uint32, Value::Uint32(_))
                | (Kind::Uint64, Value::Uint64(_))
                | (Kind::Float32, Value::Float32(_))
                | (Kind::Float64, Value::Float64(_))
                | (Kind::Bool, Value::Bool(_))
                | (Kind::Time, Value::Time(_))
                | (Kind::Duration, Value::Duration(_))
                | (Kind::Json, Value::Json(_))
        );

        if !ok {
            return Err(SchemaError::value(
                *self,
                format!("unexpected value representation `{}`", value.type_name()),
            ));
        }

        Ok(())
    }

    /// Check the representation and, for string-encoded kinds, the format of
    /// `value`. Enum values are checked against their enum type by
    /// [`Field::validate_value`](crate::Field::validate_value).
    pub fn validate_value(&self, value: &Value) -> SchemaResult<()> {
        self.validate_value_type(value)?;

        match (self, value) {
            (Kind::String, Value::String(s)) if s.contains('\0') => {
                Err(SchemaError::value(*self, "string contains a NUL byte"))
            },
            (Kind::IntegerString, Value::String(s)) if !is_integer_string(s) => Err(
                SchemaError::value(*self, format!("`{s}` is not an integer string")),
            ),
            (Kind::DecimalString, Value::String(s)) if !is_decimal_string(s) => Err(
                SchemaError::value(*self, format!("`{s}` is not a decimal string")),
            ),
            (Kind::Json, Value::Json(s)) => {
                serde_json::from_str::<serde_json::Value>(s)
                    .map_err(|err| SchemaError::value(*self, err))?;
                Ok(())
            },
            _ => Ok(()),
        }
    }

    /// The most natural kind for a value representation. String values map
    /// to [`Kind::String`] and byte values to [`Kind::Bytes`]. Returns `None`
    /// for null.
    pub fn for_value(value: &Value) -> Option<Kind> {
        let kind = match value {
            Value::Null => return None,
            Value::String(_) => Kind::String,
            Value::Bytes(_) => Kind::Bytes,
            Value::Int8(_) => Kind::Int8,
            Value::Int16(_) => Kind::Int16,
            Value::Int32(_) => Kind::Int32,
            Value::Int64(_) => Kind::Int64,
            Value::Uint8(_) => Kind::Uint8,
            Value::Uint16(_) => Kind::Uint16,
            Value::Uint32(_) => Kind::Uint32,
            Value::Uint64(_) => Kind::Uint64,
            Value::Float32(_) => Kind::Float32,
            Value::Float64(_) => Kind::Float64,
            Value::Bool(_) => Kind::Bool,
            Value::Time(_) => Kind::Time,
            Value::Duration(_) => Kind::Duration,
            Value::Json(_) => Kind::Json,
        };

        Some(kind)
    }
}

/// Matches `-?[0-9]+`.
pub fn is_integer_string(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Matches `-?[0-9]+(\.[0-9]+)?([eE][-+]?[0-9]+)?`.
pub fn is_decimal_string(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);

    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some((whole, frac)) => is_digits(whole) && is_digits(frac),
        None => is_digits(mantissa),
    };

    let exponent_ok = match exponent {
        Some(exp) => is_digits(exp.strip_prefix(['-', '+']).unwrap_or(exp)),
        None => true,
    };

    mantissa_ok && exponent_ok
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, strum::IntoEnumIterator, test_case::test_case};

    #[test]
    fn kind_names_round_trip() {
        for kind in Kind::iter() {
            let name = kind.to_string();
            assert_eq!(Kind::parse(&name).unwrap(), kind);

            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{name}\""));
            assert_eq!(serde_json::from_str::<Kind>(&json).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(
            Kind::parse("uint128"),
            Err(SchemaError::InvalidKind(name)) if name == "uint128"
        ));
    }

    #[test_case(Kind::Float32 => false; "float32")]
    #[test_case(Kind::Float64 => false; "float64")]
    #[test_case(Kind::Json => false; "json")]
    #[test_case(Kind::Duration => false; "duration")]
    #[test_case(Kind::String => true; "string")]
    #[test_case(Kind::Address => true; "address")]
    #[test_case(Kind::Enum => true; "enum")]
    #[test_case(Kind::Time => true; "time")]
    fn key_kinds(kind: Kind) -> bool {
        kind.valid_key_kind()
    }

    #[test_case(Kind::IntegerString, Value::from("123") => true; "integer string")]
    #[test_case(Kind::IntegerString, Value::Int64(123) => false; "integer with int64")]
    #[test_case(Kind::Address, Value::Bytes(vec![1, 2]) => true; "address bytes")]
    #[test_case(Kind::Address, Value::from("0x0102") => false; "address string")]
    #[test_case(Kind::Enum, Value::from("foo") => true; "enum string")]
    #[test_case(Kind::Uint64, Value::Uint32(1) => false; "narrower uint")]
    #[test_case(Kind::Json, Value::Json("{}".into()) => true; "json")]
    #[test_case(Kind::Bool, Value::Null => false; "null")]
    fn value_types(kind: Kind, value: Value) -> bool {
        kind.validate_value_type(&value).is_ok()
    }

    #[test_case("0" => true; "zero")]
    #[test_case("-42" => true; "negative")]
    #[test_case("007" => true; "leading zeros")]
    #[test_case("" => false; "empty")]
    #[test_case("-" => false; "sign only")]
    #[test_case("1.0" => false; "fraction")]
    #[test_case("+1" => false; "plus sign")]
    fn integer_strings(s: &str) -> bool {
        is_integer_string(s)
    }

    #[test_case("1" => true; "integer")]
    #[test_case("-1.50" => true; "negative fraction")]
    #[test_case("1.5e10" => true; "exponent")]
    #[test_case("1E-3" => true; "negative upper exponent")]
    #[test_case("1e+3" => true; "plus exponent")]
    #[test_case(".5" => false; "missing whole")]
    #[test_case("1." => false; "missing fraction")]
    #[test_case("1e" => false; "missing exponent")]
    #[test_case("abc" => false; "letters")]
    fn decimal_strings(s: &str) -> bool {
        is_decimal_string(s)
    }

    #[test]
    fn json_must_parse() {
        assert!(Kind::Json.validate_value(&Value::Json("[1,2]".into())).is_ok());
        assert!(Kind::Json.validate_value(&Value::Json("{".into())).is_err());
    }

    #[test]
    fn strings_reject_nul() {
        assert!(Kind::String.validate_value(&Value::from("a\0b")).is_err());
    }
}
