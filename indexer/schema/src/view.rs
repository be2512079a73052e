//! Read-only views of indexed application state.
//!
//! Targets that can serve their state back expose it through these traits,
//! which lets tests compare a target against the simulator's reference state
//! without knowing how the target stores it.

use crate::{FieldValues, ModuleSchema, SchemaResult, StateObjectType, StateObjectUpdate};

pub type BoxedIter<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

pub trait AppState: Send + Sync {
    fn get_module(&self, module_name: &str) -> SchemaResult<Option<Box<dyn ModuleState + '_>>>;

    /// Modules in name order.
    fn modules(&self) -> SchemaResult<BoxedIter<'_, Box<dyn ModuleState + '_>>>;

    fn num_modules(&self) -> SchemaResult<usize>;
}

pub trait ModuleState {
    fn module_name(&self) -> &str;

    fn module_schema(&self) -> &ModuleSchema;

    fn get_object_collection(
        &self,
        object_type: &str,
    ) -> SchemaResult<Option<Box<dyn ObjectCollection + '_>>>;

    /// Collections in object type name order.
    fn object_collections(&self) -> SchemaResult<BoxedIter<'_, Box<dyn ObjectCollection + '_>>>;

    fn num_object_collections(&self) -> SchemaResult<usize>;
}

pub trait ObjectCollection {
    fn object_type(&self) -> &StateObjectType;

    /// The current state of the object under `key`, as an insert update.
    /// Objects deleted under retain-deletions come back with `delete` set.
    fn get_object(&self, key: &FieldValues) -> SchemaResult<Option<StateObjectUpdate>>;

    /// Every object in key order.
    fn all_state(&self) -> SchemaResult<BoxedIter<'_, StateObjectUpdate>>;

    fn len(&self) -> SchemaResult<usize>;

    fn is_empty(&self) -> SchemaResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T> ModuleState for &T
where
    T: ModuleState + ?Sized,
{
    fn module_name(&self) -> &str {
        (**self).module_name()
    }

    fn module_schema(&self) -> &ModuleSchema {
        (**self).module_schema()
    }

    fn get_object_collection(
        &self,
        object_type: &str,
    ) -> SchemaResult<Option<Box<dyn ObjectCollection + '_>>> {
        (**self).get_object_collection(object_type)
    }

    fn object_collections(&self) -> SchemaResult<BoxedIter<'_, Box<dyn ObjectCollection + '_>>> {
        (**self).object_collections()
    }

    fn num_object_collections(&self) -> SchemaResult<usize> {
        (**self).num_object_collections()
    }
}

impl<T> ObjectCollection for &T
where
    T: ObjectCollection + ?Sized,
{
    fn object_type(&self) -> &StateObjectType {
        (**self).object_type()
    }

    fn get_object(&self, key: &FieldValues) -> SchemaResult<Option<StateObjectUpdate>> {
        (**self).get_object(key)
    }

    fn all_state(&self) -> SchemaResult<BoxedIter<'_, StateObjectUpdate>> {
        (**self).all_state()
    }

    fn len(&self) -> SchemaResult<usize> {
        (**self).len()
    }
}
