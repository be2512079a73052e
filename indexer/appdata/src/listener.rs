use {
    crate::{
        AppDataResult, CommitData, EventData, KvPairData, ModuleInitializationData,
        ObjectUpdateData, Packet, PacketBatch, StartBlockData, TxData,
    },
    std::{fmt, sync::Arc},
};

pub type Callback<T> = Arc<dyn Fn(&T) -> AppDataResult<()> + Send + Sync>;

/// Returned by a commit callback when the commit finishes asynchronously.
/// Calling it blocks until the commit is done.
pub type CommitCompletion = Box<dyn FnOnce() -> AppDataResult<()> + Send>;

pub type CommitCallback =
    Arc<dyn Fn(&CommitData) -> AppDataResult<Option<CommitCompletion>> + Send + Sync>;

pub type BatchCallback = Arc<dyn Fn(&PacketBatch) -> AppDataResult<()> + Send + Sync>;

/// The receiving end of the app-data stream: a set of optional callbacks, one
/// per packet kind. An unset callback means the listener isn't interested in
/// that kind of packet, which lets upstream stages skip producing it.
///
/// Callbacks get borrowed data and must clone whatever they want to keep.
#[derive(Clone, Default)]
pub struct Listener {
    pub initialize_module_data: Option<Callback<ModuleInitializationData>>,
    pub start_block: Option<Callback<StartBlockData>>,
    pub on_tx: Option<Callback<TxData>>,
    pub on_event: Option<Callback<EventData>>,
    pub on_kv_pair: Option<Callback<KvPairData>>,
    pub on_object_update: Option<Callback<ObjectUpdateData>>,
    pub commit: Option<CommitCallback>,
    /// If set, batches are delivered whole instead of packet by packet.
    pub on_batch: Option<BatchCallback>,
}

impl Listener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initialize_module_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&ModuleInitializationData) -> AppDataResult<()> + Send + Sync + 'static,
    {
        self.initialize_module_data = Some(Arc::new(f));
        self
    }

    pub fn with_start_block<F>(mut self, f: F) -> Self
    where
        F: Fn(&StartBlockData) -> AppDataResult<()> + Send + Sync + 'static,
    {
        self.start_block = Some(Arc::new(f));
        self
    }

    pub fn with_on_tx<F>(mut self, f: F) -> Self
    where
        F: Fn(&TxData) -> AppDataResult<()> + Send + Sync + 'static,
    {
        self.on_tx = Some(Arc::new(f));
        self
    }

    pub fn with_on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&EventData) -> AppDataResult<()> + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(f));
        self
    }

    pub fn with_on_kv_pair<F>(mut self, f: F) -> Self
    where
        F: Fn(&KvPairData) -> AppDataResult<()> + Send + Sync + 'static,
    {
        self.on_kv_pair = Some(Arc::new(f));
        self
    }

    pub fn with_on_object_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&ObjectUpdateData) -> AppDataResult<()> + Send + Sync + 'static,
    {
        self.on_object_update = Some(Arc::new(f));
        self
    }

    pub fn with_commit<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommitData) -> AppDataResult<Option<CommitCompletion>> + Send + Sync + 'static,
    {
        self.commit = Some(Arc::new(f));
        self
    }

    pub fn with_on_batch<F>(mut self, f: F) -> Self
    where
        F: Fn(&PacketBatch) -> AppDataResult<()> + Send + Sync + 'static,
    {
        self.on_batch = Some(Arc::new(f));
        self
    }

    /// Deliver a single packet. Commits block until they complete.
    pub fn send_packet<P>(&self, packet: P) -> AppDataResult<()>
    where
        P: Into<Packet>,
    {
        packet.into().apply(self)
    }

    pub fn send_batch(&self, batch: &PacketBatch) -> AppDataResult<()> {
        batch.apply(self)
    }

    /// Whether the listener wants logical state: either module schemas or
    /// object updates.
    pub fn wants_object_updates(&self) -> bool {
        self.initialize_module_data.is_some() || self.on_object_update.is_some()
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("initialize_module_data", &self.initialize_module_data.is_some())
            .field("start_block", &self.start_block.is_some())
            .field("on_tx", &self.on_tx.is_some())
            .field("on_event", &self.on_event.is_some())
            .field("on_kv_pair", &self.on_kv_pair.is_some())
            .field("on_object_update", &self.on_object_update.is_some())
            .field("commit", &self.commit.is_some())
            .field("on_batch", &self.on_batch.is_some())
            .finish()
    }
}
