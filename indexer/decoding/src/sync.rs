use {
    crate::DecoderResolver,
    indexer_appdata::{
        AppDataResult, KvPairData, KvPairUpdate, Listener, ModuleFilter, ModuleInitializationData,
        ObjectUpdateData,
    },
    std::collections::{BTreeMap, BTreeSet},
};

/// Access to the current raw state of every module.
pub trait SyncSource: Send + Sync {
    /// Visit every key-value pair of `module_name` in key order. Stops at the
    /// first error.
    fn iterate_all_kv_pairs(
        &self,
        module_name: &str,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> AppDataResult<()>,
    ) -> AppDataResult<()>;
}

/// A [`SyncSource`] holding module state in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySyncSource {
    modules: BTreeMap<String, BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemorySyncSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<M, K, V>(&mut self, module_name: M, key: K, value: V)
    where
        M: Into<String>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        self.modules
            .entry(module_name.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn remove(&mut self, module_name: &str, key: &[u8]) {
        if let Some(module) = self.modules.get_mut(module_name) {
            module.remove(key);
        }
    }

    /// Apply raw changes the way the state machine would.
    pub fn apply(&mut self, data: &KvPairData) {
        for module in &data.updates {
            for update in &module.updates {
                if update.remove {
                    self.remove(&module.module_name, &update.key);
                } else {
                    self.set(&module.module_name, update.key.clone(), update.value.clone());
                }
            }
        }
    }
}

impl SyncSource for MemorySyncSource {
    fn iterate_all_kv_pairs(
        &self,
        module_name: &str,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> AppDataResult<()>,
    ) -> AppDataResult<()> {
        let Some(module) = self.modules.get(module_name) else {
            return Ok(());
        };

        module.iter().try_for_each(|(key, value)| visit(key, value))
    }
}

#[derive(Clone, Default)]
pub struct SyncOptions {
    pub module_filter: Option<ModuleFilter>,
    /// Modules the listener already got initialization data for.
    pub skip_initialized: BTreeSet<String>,
}

/// Replay the current state of every module known to `resolver` into
/// `listener`, as if it had been produced by the stream.
///
/// Each module is initialized (unless listed in `skip_initialized`), then its
/// key-value pairs are decoded and delivered as object updates. Historical
/// blocks, transactions and events are not replayed.
pub fn sync(
    listener: &Listener,
    source: &dyn SyncSource,
    resolver: &dyn DecoderResolver,
    options: &SyncOptions,
) -> AppDataResult<()> {
    if !listener.wants_object_updates() {
        return Ok(());
    }

    resolver.all_decoders(&mut |module_name, codec| {
        if let Some(filter) = &options.module_filter {
            if !filter(module_name) {
                return Ok(());
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!(module = module_name, "Syncing module state");

        if let Some(initialize_module_data) = &listener.initialize_module_data {
            if !options.skip_initialized.contains(module_name) {
                initialize_module_data(&ModuleInitializationData {
                    module_name: module_name.to_string(),
                    schema: codec.schema.clone(),
                })?;
            }
        }

        let (Some(kv_decoder), Some(on_object_update)) =
            (&codec.kv_decoder, &listener.on_object_update)
        else {
            return Ok(());
        };

        source.iterate_all_kv_pairs(module_name, &mut |key, value| {
            let updates = kv_decoder(&KvPairUpdate::set(key, value))?;

            if updates.is_empty() {
                return Ok(());
            }

            on_object_update(&ObjectUpdateData {
                module_name: module_name.to_string(),
                updates,
            })
        })
    })
}

// ----------------------------------- tests -----------------------------------
