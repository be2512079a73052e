//! An authoritative in-memory model of indexed application state.
//!
//! Object updates are validated against the module schema and applied the
//! way a well-behaved indexer target would apply them, so the model can serve
//! as the expected state when checking real targets.

use {
    indexer_appdata::{AppDataError, AppDataResult, ModuleInitializationData, ObjectUpdateData},
    indexer_schema::{
        object_key_string,
        view::{self, AppState, BoxedIter, ModuleState},
        FieldValues, ModuleSchema, ObjectValue, SchemaError, SchemaResult, StateObjectType,
        StateObjectUpdate, ValueUpdates,
    },
    serde::{Deserialize, Serialize},
    std::{collections::BTreeMap, sync::Arc},
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSimOptions {
    /// Whether object types flagged with `retain_deletions` keep deleted
    /// objects around. If unset, deletions always remove.
    #[serde(default)]
    pub can_retain_deletions: bool,
}

// ------------------------------ object collection ------------------------------

/// The objects of one object type, by canonical key string.
#[derive(Debug, Clone)]
pub struct ObjectCollection {
    object_type: StateObjectType,
    schema: Arc<ModuleSchema>,
    options: StateSimOptions,
    objects: BTreeMap<String, StateObjectUpdate>,
}

impl ObjectCollection {
    pub fn new(
        object_type: StateObjectType,
        schema: Arc<ModuleSchema>,
        options: StateSimOptions,
    ) -> Self {
        Self {
            object_type,
            schema,
            options,
            objects: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<ModuleSchema> {
        &self.schema
    }

    /// Objects that currently exist, i.e. are not flagged as deleted.
    pub fn live_objects(&self) -> impl Iterator<Item = &StateObjectUpdate> {
        self.objects.values().filter(|object| !object.delete)
    }

    pub fn apply_update(&mut self, update: &StateObjectUpdate) -> SchemaResult<()> {
        self.object_type
            .validate_object_update(update, self.schema.as_ref())?;

        let key = object_key_string(&self.object_type, &update.key)?;

        if update.delete {
            if self.object_type.retain_deletions && self.options.can_retain_deletions {
                if let Some(existing) = self.objects.get_mut(&key) {
                    existing.delete = true;
                }
            } else {
                self.objects.remove(&key);
            }

            return Ok(());
        }

        let values = match &update.value {
            _ if self.object_type.value_fields.is_empty() => FieldValues::Empty,
            ObjectValue::Fields(values) => values.clone(),
            ObjectValue::Updates(updates) => {
                let existing = self
                    .objects
                    .get(&key)
                    .filter(|existing| !existing.delete)
                    .ok_or_else(|| {
                        SchemaError::update(
                            &self.object_type.name,
                            format!("partial update of missing object `{key}`"),
                        )
                    })?;

                merge_value_updates(&self.object_type, &existing.value, updates.as_ref())?
            },
        };

        self.objects.insert(key, StateObjectUpdate {
            type_name: self.object_type.name.clone(),
            key: update.key.clone(),
            value: ObjectValue::Fields(values),
            delete: false,
        });

        Ok(())
    }
}

fn merge_value_updates(
    object_type: &StateObjectType,
    existing: &ObjectValue,
    updates: &dyn ValueUpdates,
) -> SchemaResult<FieldValues> {
    let ObjectValue::Fields(existing) = existing else {
        return Err(SchemaError::update(
            &object_type.name,
            "stored object has no full value",
        ));
    };

    let mut values = existing.to_values();

    if values.len() != object_type.value_fields.len() {
        return Err(SchemaError::update(
            &object_type.name,
            format!(
                "stored object has {} values, expected {}",
                values.len(),
                object_type.value_fields.len()
            ),
        ));
    }

    updates.iterate(&mut |name, value| {
        if let Some(index) = object_type
            .value_fields
            .iter()
            .position(|field| field.name == name)
        {
            values[index] = value.clone();
        }
        true
    })?;

    Ok(FieldValues::from_values(values))
}

impl view::ObjectCollection for ObjectCollection {
    fn object_type(&self) -> &StateObjectType {
        &self.object_type
    }

    fn get_object(&self, key: &FieldValues) -> SchemaResult<Option<StateObjectUpdate>> {
        let key = object_key_string(&self.object_type, key)?;

        Ok(self.objects.get(&key).cloned())
    }

    fn all_state(&self) -> SchemaResult<BoxedIter<'_, StateObjectUpdate>> {
        Ok(Box::new(self.objects.values().cloned()))
    }

    fn len(&self) -> SchemaResult<usize> {
        Ok(self.objects.len())
    }
}

// ----------------------------------- module ------------------------------------

/// The state of one module: a collection per object type of its schema.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    schema: Arc<ModuleSchema>,
    collections: BTreeMap<String, ObjectCollection>,
}

impl Module {
    pub fn new(name: String, schema: Arc<ModuleSchema>, options: StateSimOptions) -> Self {
        let collections = schema
            .state_object_types()
            .map(|object_type| {
                let collection =
                    ObjectCollection::new(object_type.clone(), schema.clone(), options);
                (object_type.name.clone(), collection)
            })
            .collect();

        Self {
            name,
            schema,
            collections,
        }
    }

    pub fn collection(&self, object_type: &str) -> Option<&ObjectCollection> {
        self.collections.get(object_type)
    }

    pub fn collections(&self) -> impl Iterator<Item = &ObjectCollection> {
        self.collections.values()
    }

    pub fn apply_update(&mut self, update: &StateObjectUpdate) -> SchemaResult<()> {
        let Some(collection) = self.collections.get_mut(&update.type_name) else {
            return Err(SchemaError::update(
                &update.type_name,
                format!("module `{}` has no such object type", self.name),
            ));
        };

        collection.apply_update(update)
    }
}

impl ModuleState for Module {
    fn module_name(&self) -> &str {
        &self.name
    }

    fn module_schema(&self) -> &ModuleSchema {
        &self.schema
    }

    fn get_object_collection(
        &self,
        object_type: &str,
    ) -> SchemaResult<Option<Box<dyn view::ObjectCollection + '_>>> {
        Ok(self
            .collections
            .get(object_type)
            .map(|collection| Box::new(collection) as Box<dyn view::ObjectCollection + '_>))
    }

    fn object_collections(
        &self,
    ) -> SchemaResult<BoxedIter<'_, Box<dyn view::ObjectCollection + '_>>> {
        Ok(Box::new(self.collections.values().map(|collection| {
            Box::new(collection) as Box<dyn view::ObjectCollection + '_>
        })))
    }

    fn num_object_collections(&self) -> SchemaResult<usize> {
        Ok(self.collections.len())
    }
}

// ------------------------------------- app -------------------------------------

#[derive(Debug, Clone, Default)]
pub struct App {
    options: StateSimOptions,
    modules: BTreeMap<String, Module>,
}

impl App {
    pub fn new(options: StateSimOptions) -> Self {
        Self {
            options,
            modules: BTreeMap::new(),
        }
    }

    pub fn initialize_module(&mut self, data: &ModuleInitializationData) -> AppDataResult<()> {
        if self.modules.contains_key(&data.module_name) {
            return Err(AppDataError::Generic(format!(
                "module `{}` is already initialized",
                data.module_name
            )));
        }

        let module = Module::new(data.module_name.clone(), data.schema.clone(), self.options);
        self.modules.insert(data.module_name.clone(), module);

        Ok(())
    }

    /// Apply every update in order. Stops at the first invalid one; updates
    /// before it stay applied.
    pub fn apply_update(&mut self, data: &ObjectUpdateData) -> AppDataResult<()> {
        let Some(module) = self.modules.get_mut(&data.module_name) else {
            return Err(AppDataError::Generic(format!(
                "module `{}` is not initialized",
                data.module_name
            )));
        };

        for update in &data.updates {
            module.apply_update(update)?;
        }

        Ok(())
    }

    pub fn module(&self, module_name: &str) -> Option<&Module> {
        self.modules.get(module_name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }
}

impl AppState for App {
    fn get_module(&self, module_name: &str) -> SchemaResult<Option<Box<dyn ModuleState + '_>>> {
        Ok(self
            .modules
            .get(module_name)
            .map(|module| Box::new(module) as Box<dyn ModuleState + '_>))
    }

    fn modules(&self) -> SchemaResult<BoxedIter<'_, Box<dyn ModuleState + '_>>> {
        Ok(Box::new(
            self.modules
                .values()
                .map(|module| Box::new(module) as Box<dyn ModuleState + '_>),
        ))
    }

    fn num_modules(&self) -> SchemaResult<usize> {
        Ok(self.modules.len())
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::fixtures::bank_schema,
        indexer_schema::{view::ObjectCollection as _, MapValueUpdates, Value},
    };

    fn app(can_retain_deletions: bool) -> App {
        let mut app = App::new(StateSimOptions {
            can_retain_deletions,
        });

        app.initialize_module(&ModuleInitializationData {
            module_name: "bank".to_string(),
            schema: Arc::new(bank_schema().unwrap()),
        })
        .unwrap();

        app
    }

    fn apply(app: &mut App, updates: Vec<StateObjectUpdate>) -> AppDataResult<()> {
        app.apply_update(&ObjectUpdateData {
            module_name: "bank".to_string(),
            updates,
        })
    }

    fn balance(address: &str, denom: &str) -> FieldValues {
        FieldValues::from(vec![Value::from(address), Value::from(denom)])
    }

    fn get(app: &App, object_type: &str, key: &FieldValues) -> Option<StateObjectUpdate> {
        app.module("bank")
            .unwrap()
            .collection(object_type)
            .unwrap()
            .get_object(key)
            .unwrap()
    }

    #[test]
    fn insert_overwrite_and_delete() {
        let mut app = app(false);

        apply(&mut app, vec![
            StateObjectUpdate::insert("balance", balance("bob", "foo"), Value::Uint64(100)),
            StateObjectUpdate::insert("balance", balance("bob", "foo"), Value::Uint64(50)),
            StateObjectUpdate::insert("balance", balance("alice", "foo"), Value::Uint64(1)),
        ])
        .unwrap();

        assert_eq!(
            get(&app, "balance", &balance("bob", "foo")).unwrap().value,
            ObjectValue::from(Value::Uint64(50))
        );

        apply(&mut app, vec![StateObjectUpdate::delete("balance", balance("bob", "foo"))]).unwrap();

        assert!(get(&app, "balance", &balance("bob", "foo")).is_none());
        assert_eq!(app.module("bank").unwrap().collection("balance").unwrap().len().unwrap(), 1);
    }

    #[test]
    fn reapplying_is_idempotent() {
        let mut app = app(false);
        let updates = vec![StateObjectUpdate::insert(
            "balance",
            balance("bob", "foo"),
            Value::Uint64(100),
        )];

        apply(&mut app, updates.clone()).unwrap();
        let once = app.clone();
        apply(&mut app, updates).unwrap();

        assert_eq!(crate::diff_app_states(&once, &app).unwrap(), "");
    }

    fn params(send_enabled: bool) -> StateObjectUpdate {
        StateObjectUpdate::insert("params", FieldValues::Empty, vec![
            Value::from(send_enabled),
            Value::from("initial"),
        ])
    }

    #[test]
    fn partial_updates_merge_into_existing_values() {
        let mut app = app(false);

        apply(&mut app, vec![
            params(true),
            StateObjectUpdate::insert(
                "params",
                FieldValues::Empty,
                MapValueUpdates::new().with("send_enabled", false),
            ),
        ])
        .unwrap();

        assert_eq!(
            get(&app, "params", &FieldValues::Empty).unwrap().value,
            ObjectValue::from(vec![Value::from(false), Value::from("initial")])
        );
    }

    #[test]
    fn partial_update_of_missing_object_fails() {
        let mut app = app(false);

        let res = apply(&mut app, vec![StateObjectUpdate::insert(
            "params",
            FieldValues::Empty,
            MapValueUpdates::new().with("send_enabled", false),
        )]);

        assert!(res.is_err());
    }

    #[test]
    fn retained_deletions_stay_flagged() {
        let mut app = app(true);

        apply(&mut app, vec![
            params(true),
            StateObjectUpdate::delete("params", FieldValues::Empty),
        ])
        .unwrap();

        let stored = get(&app, "params", &FieldValues::Empty).unwrap();
        assert!(stored.delete);
        assert_eq!(stored.value, params(true).value);

        // A deleted object can't be partially updated, but can be recreated.
        assert!(apply(&mut app, vec![StateObjectUpdate::insert(
            "params",
            FieldValues::Empty,
            MapValueUpdates::new().with("send_enabled", false),
        )])
        .is_err());

        apply(&mut app, vec![params(false)]).unwrap();
        assert!(!get(&app, "params", &FieldValues::Empty).unwrap().delete);

        // Without the capability, the same type is removed.
        let mut app = self::app(false);
        apply(&mut app, vec![
            params(true),
            StateObjectUpdate::delete("params", FieldValues::Empty),
        ])
        .unwrap();

        assert!(get(&app, "params", &FieldValues::Empty).is_none());
    }

    #[test]
    fn invalid_updates_are_rejected() {
        let mut app = app(false);

        // Wrong value kind.
        assert!(apply(&mut app, vec![StateObjectUpdate::insert(
            "balance",
            balance("bob", "foo"),
            Value::from("lots"),
        )])
        .is_err());

        // Unknown object type.
        assert!(apply(&mut app, vec![StateObjectUpdate::insert(
            "delegation",
            Value::from("bob"),
            Value::Uint64(1),
        )])
        .is_err());

        // Unknown module.
        assert!(app
            .apply_update(&ObjectUpdateData {
                module_name: "staking".to_string(),
                updates: vec![],
            })
            .is_err());
    }

    #[test]
    fn modules_are_initialized_once() {
        let mut app = app(false);

        assert!(app
            .initialize_module(&ModuleInitializationData {
                module_name: "bank".to_string(),
                schema: Arc::new(bank_schema().unwrap()),
            })
            .is_err());
        assert_eq!(app.num_modules().unwrap(), 1);
    }
}
