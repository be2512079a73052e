use {
    indexer_appdata::{AppDataResult, KvPairUpdate},
    indexer_schema::{ModuleSchema, StateObjectUpdate},
    std::{fmt, sync::Arc},
};

/// Turns one raw key-value change into zero or more logical updates.
pub type KvDecoder =
    Arc<dyn Fn(&KvPairUpdate) -> AppDataResult<Vec<StateObjectUpdate>> + Send + Sync>;

/// Everything needed to index a module: its schema, and optionally a decoder
/// for its raw state.
#[derive(Clone)]
pub struct ModuleCodec {
    pub schema: Arc<ModuleSchema>,
    pub kv_decoder: Option<KvDecoder>,
}

impl ModuleCodec {
    pub fn new(schema: ModuleSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            kv_decoder: None,
        }
    }

    pub fn with_kv_decoder<F>(mut self, decoder: F) -> Self
    where
        F: Fn(&KvPairUpdate) -> AppDataResult<Vec<StateObjectUpdate>> + Send + Sync + 'static,
    {
        self.kv_decoder = Some(Arc::new(decoder));
        self
    }
}

impl fmt::Debug for ModuleCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCodec")
            .field("schema", &self.schema)
            .field("kv_decoder", &self.kv_decoder.is_some())
            .finish()
    }
}

/// Implemented by state machine modules that can describe their own state.
pub trait HasModuleCodec: Send + Sync {
    fn module_codec(&self) -> AppDataResult<ModuleCodec>;
}
