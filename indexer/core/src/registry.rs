use {
    crate::{IndexerError, IndexerResult},
    indexer_appdata::{AppDataResult, CancelSignal, Listener},
    indexer_schema::{view::AppState, AddressCodec},
    std::{collections::BTreeMap, fmt, sync::Arc},
};

/// Creates an indexer target from its config.
pub type InitFn = Arc<dyn Fn(InitParams) -> AppDataResult<InitResult> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct InitParams {
    pub target_name: String,
    /// The `config` section of the target, untouched.
    pub config: serde_json::Value,
    /// Fires when indexing is shutting down.
    pub cancel: CancelSignal,
    pub address_codec: Arc<dyn AddressCodec>,
}

pub struct InitResult {
    pub listener: Listener,
    /// The last block the target has fully persisted: `0` if it has nothing
    /// yet, `-1` if it doesn't persist state at all.
    pub last_block_persisted: i64,
    /// A read-only view of the indexed state, if the target offers one.
    pub view: Option<Arc<dyn AppState>>,
}

impl InitResult {
    pub fn new(listener: Listener, last_block_persisted: i64) -> Self {
        Self {
            listener,
            last_block_persisted,
            view: None,
        }
    }

    pub fn with_view(mut self, view: Arc<dyn AppState>) -> Self {
        self.view = Some(view);
        self
    }
}

impl fmt::Debug for InitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitResult")
            .field("listener", &self.listener)
            .field("last_block_persisted", &self.last_block_persisted)
            .field("view", &self.view.is_some())
            .finish()
    }
}

/// The indexer types available to `start_indexing`, by name.
#[derive(Clone, Default)]
pub struct IndexerRegistry {
    inits: BTreeMap<String, InitFn>,
}

impl IndexerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T, F>(&mut self, ty: T, init: F) -> IndexerResult<()>
    where
        T: Into<String>,
        F: Fn(InitParams) -> AppDataResult<InitResult> + Send + Sync + 'static,
    {
        let ty = ty.into();

        if self.inits.contains_key(&ty) {
            return Err(IndexerError::DuplicateIndexerType(ty));
        }

        self.inits.insert(ty, Arc::new(init));

        Ok(())
    }

    pub fn get(&self, ty: &str) -> Option<&InitFn> {
        self.inits.get(ty)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.inits.keys().map(String::as_str)
    }
}

impl fmt::Debug for IndexerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inits.keys()).finish()
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: InitParams) -> AppDataResult<InitResult> {
        Ok(InitResult::new(Listener::new(), -1))
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut registry = IndexerRegistry::new();

        registry.register("postgres", noop).unwrap();
        registry.register("memory", noop).unwrap();

        assert!(matches!(
            registry.register("memory", noop),
            Err(IndexerError::DuplicateIndexerType(ty)) if ty == "memory"
        ));
        assert_eq!(registry.types().collect::<Vec<_>>(), vec!["memory", "postgres"]);
        assert!(registry.get("sqlite").is_none());
    }
}
