use {
    crate::statesim::{self, StateSimOptions},
    indexer_appdata::{AppDataResult, Listener, ObjectUpdateData},
    indexer_core::{IndexerRegistry, IndexerResult, InitParams, InitResult},
    indexer_schema::{
        view::{AppState, BoxedIter, ModuleState},
        SchemaError, SchemaResult,
    },
    serde::Deserialize,
    std::sync::{Arc, Mutex, RwLock},
};

pub const MEMORY_TARGET_TYPE: &str = "memory";

#[derive(Deserialize, Debug, Clone, Copy, Default)]
#[serde(default)]
pub struct MemoryTargetConfig {
    #[serde(flatten)]
    pub state_sim_options: StateSimOptions,
}

pub fn register_memory_target(registry: &mut IndexerRegistry) -> IndexerResult<()> {
    registry.register(MEMORY_TARGET_TYPE, init_memory_target)
}

/// An indexer target keeping its state in a [`statesim::App`].
///
/// Module initializations are applied right away; object updates are
/// buffered and applied when the block commits. It always starts out empty,
/// and the state is exposed as the target's view.
pub fn init_memory_target(params: InitParams) -> AppDataResult<InitResult> {
    let config: MemoryTargetConfig = match params.config {
        serde_json::Value::Null => MemoryTargetConfig::default(),
        config => serde_json::from_value(config)?,
    };

    #[cfg(feature = "tracing")]
    tracing::info!(target_name = %params.target_name, ?config, "Starting memory target");

    let state = Arc::new(RwLock::new(statesim::App::new(config.state_sim_options)));
    let pending = Arc::new(Mutex::new(Vec::<ObjectUpdateData>::new()));

    let listener = Listener::new()
        .with_initialize_module_data({
            let state = state.clone();
            move |data| state.write()?.initialize_module(data)
        })
        .with_on_object_update({
            let pending = pending.clone();
            move |data| {
                pending.lock()?.push(data.clone());
                Ok(())
            }
        })
        .with_commit({
            let state = state.clone();
            move |_| {
                let updates = std::mem::take(&mut *pending.lock()?);
                let mut state = state.write()?;

                for data in &updates {
                    state.apply_update(data)?;
                }

                Ok(None)
            }
        });

    Ok(InitResult::new(listener, 0).with_view(Arc::new(MemoryView(state))))
}

/// Read access to a memory target's state. Every lookup works on a snapshot
/// taken at call time.
#[derive(Debug, Clone)]
pub struct MemoryView(Arc<RwLock<statesim::App>>);

impl MemoryView {
    pub fn snapshot(&self) -> SchemaResult<statesim::App> {
        self.0
            .read()
            .map(|state| state.clone())
            .map_err(|err| SchemaError::View(err.to_string()))
    }
}

impl AppState for MemoryView {
    fn get_module(&self, module_name: &str) -> SchemaResult<Option<Box<dyn ModuleState + '_>>> {
        Ok(self
            .snapshot()?
            .module(module_name)
            .cloned()
            .map(|module| Box::new(module) as Box<dyn ModuleState + '_>))
    }

    fn modules(&self) -> SchemaResult<BoxedIter<'_, Box<dyn ModuleState + '_>>> {
        let modules = self.snapshot()?.modules().cloned().collect::<Vec<_>>();

        Ok(Box::new(
            modules
                .into_iter()
                .map(|module| Box::new(module) as Box<dyn ModuleState + '_>),
        ))
    }

    fn num_modules(&self) -> SchemaResult<usize> {
        self.snapshot()?.num_modules()
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::fixtures::{bank_schema, BANK},
        indexer_appdata::{CancelSignal, CommitData, ModuleInitializationData},
        indexer_schema::{FieldValues, HexAddressCodec, StateObjectUpdate, Value},
        serde_json::json,
    };

    fn params(config: serde_json::Value) -> InitParams {
        InitParams {
            target_name: "mem".to_string(),
            config,
            cancel: CancelSignal::never(),
            address_codec: Arc::new(HexAddressCodec),
        }
    }

    #[test]
    fn updates_apply_on_commit() {
        let res = init_memory_target(params(serde_json::Value::Null)).unwrap();
        let view = res.view.unwrap();

        assert_eq!(res.last_block_persisted, 0);

        res.listener
            .send_packet(ModuleInitializationData {
                module_name: BANK.to_string(),
                schema: Arc::new(bank_schema().unwrap()),
            })
            .unwrap();
        res.listener
            .send_packet(ObjectUpdateData {
                module_name: BANK.to_string(),
                updates: vec![StateObjectUpdate::insert(
                    "supply",
                    Value::from("foo"),
                    Value::Uint64(100),
                )],
            })
            .unwrap();

        let supply = |view: &dyn AppState| {
            let module = view.get_module(BANK).unwrap().unwrap();
            let collection = module.get_object_collection("supply").unwrap().unwrap();
            collection.get_object(&FieldValues::from(Value::from("foo"))).unwrap()
        };

        assert_eq!(view.num_modules().unwrap(), 1);
        assert!(supply(view.as_ref()).is_none());

        res.listener.send_packet(CommitData).unwrap();

        assert!(supply(view.as_ref()).is_some());
    }

    #[test]
    fn config_is_parsed() {
        assert!(init_memory_target(params(json!({ "can_retain_deletions": true }))).is_ok());
        assert!(init_memory_target(params(json!({ "can_retain_deletions": "yes" }))).is_err());
    }
}
