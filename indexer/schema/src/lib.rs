mod address;
mod compare;
mod enum_type;
mod error;
mod field;
mod kind;
mod module_schema;
mod name;
mod object_type;
mod object_update;
mod type_set;
mod value;
pub mod view;

pub use {
    address::*, compare::*, enum_type::*, error::*, field::*, kind::*, module_schema::*, name::*,
    object_type::*, object_update::*, type_set::*, value::*,
};
