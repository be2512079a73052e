use {crate::Kind, thiserror::Error};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid kind: `{0}`")]
    InvalidKind(String),

    #[error("invalid name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid field `{field}`: {reason}")]
    FieldValidation { field: String, reason: String },

    #[error("invalid enum type `{enum_type}`: {reason}")]
    EnumValidation { enum_type: String, reason: String },

    #[error("invalid object type `{object_type}`: {reason}")]
    ObjectTypeValidation { object_type: String, reason: String },

    #[error("invalid module schema: {0}")]
    SchemaValidation(String),

    #[error("invalid value for kind {kind}: {reason}")]
    ValueValidation { kind: Kind, reason: String },

    #[error("invalid value for field `{field}`: {reason}")]
    FieldValue { field: String, reason: String },

    #[error("invalid object update for type `{object_type}`: {reason}")]
    ObjectUpdate { object_type: String, reason: String },

    #[error("address codec error: {0}")]
    Address(String),

    #[error("view error: {0}")]
    View(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    pub fn field<F, R>(field: F, reason: R) -> Self
    where
        F: Into<String>,
        R: ToString,
    {
        Self::FieldValidation {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    pub fn object_type<T, R>(object_type: T, reason: R) -> Self
    where
        T: Into<String>,
        R: ToString,
    {
        Self::ObjectTypeValidation {
            object_type: object_type.into(),
            reason: reason.to_string(),
        }
    }

    pub fn enum_type<T, R>(enum_type: T, reason: R) -> Self
    where
        T: Into<String>,
        R: ToString,
    {
        Self::EnumValidation {
            enum_type: enum_type.into(),
            reason: reason.to_string(),
        }
    }

    pub fn value<R>(kind: Kind, reason: R) -> Self
    where
        R: ToString,
    {
        Self::ValueValidation {
            kind,
            reason: reason.to_string(),
        }
    }

    pub fn field_value<F, R>(field: F, reason: R) -> Self
    where
        F: Into<String>,
        R: ToString,
    {
        Self::FieldValue {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    pub fn update<T, R>(object_type: T, reason: R) -> Self
    where
        T: Into<String>,
        R: ToString,
    {
        Self::ObjectUpdate {
            object_type: object_type.into(),
            reason: reason.to_string(),
        }
    }
}

pub type SchemaResult<T> = core::result::Result<T, SchemaError>;
