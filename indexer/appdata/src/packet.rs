use {
    crate::{AppDataResult, Listener},
    indexer_schema::{ModuleSchema, StateObjectUpdate},
    serde::{Deserialize, Serialize},
    std::{fmt, sync::Arc},
};

/// A lazily computed payload. Producers hand out a thunk so that targets that
/// never look at raw bytes or JSON don't pay for encoding them.
pub struct Lazy<T>(Arc<dyn Fn() -> AppDataResult<T> + Send + Sync>);

impl<T> Lazy<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> AppDataResult<T> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn get(&self) -> AppDataResult<T> {
        (self.0)()
    }
}

impl<T> Lazy<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A payload that's already computed.
    pub fn ready(value: T) -> Self {
        Self::new(move || Ok(value.clone()))
    }
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lazy(..)")
    }
}

pub type ToBytes = Lazy<Vec<u8>>;

pub type ToJson = Lazy<serde_json::Value>;

pub type ToEventAttributes = Lazy<Vec<EventAttribute>>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

/// Announces a module and its schema. Sent once per module before any of its
/// data.
#[derive(Debug, Clone)]
pub struct ModuleInitializationData {
    pub module_name: String,
    pub schema: Arc<ModuleSchema>,
}

#[derive(Debug, Clone, Default)]
pub struct StartBlockData {
    pub height: u64,
    pub header_bytes: Option<ToBytes>,
    pub header_json: Option<ToJson>,
}

impl StartBlockData {
    pub fn new(height: u64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TxData {
    pub block_number: u64,
    pub tx_index: u32,
    pub hash: Option<ToBytes>,
    pub bytes: Option<ToBytes>,
    pub json: Option<ToJson>,
}

/// Where in the block an event was emitted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockStage {
    #[default]
    Unknown,
    PreBlock,
    BeginBlock,
    TxProcessing,
    EndBlock,
}

#[derive(Debug, Clone, Default)]
pub struct Event {
    pub block_number: u64,
    pub block_stage: BlockStage,
    /// 1-based index of the transaction that emitted the event; 0 if emitted
    /// outside of a transaction.
    pub tx_index: u32,
    /// 1-based index of the message within the transaction; 0 if not emitted
    /// by a message.
    pub msg_index: u32,
    /// 1-based index of the event within its scope.
    pub event_index: u32,
    pub kind: String,
    pub data: Option<ToJson>,
    pub attributes: Option<ToEventAttributes>,
}

#[derive(Debug, Clone, Default)]
pub struct EventData {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KvPairUpdate {
    pub key: Vec<u8>,
    /// Ignored when `remove` is set.
    pub value: Vec<u8>,
    pub remove: bool,
}

impl KvPairUpdate {
    pub fn set<K, V>(key: K, value: V) -> Self
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        Self {
            key: key.into(),
            value: value.into(),
            remove: false,
        }
    }

    pub fn remove<K>(key: K) -> Self
    where
        K: Into<Vec<u8>>,
    {
        Self {
            key: key.into(),
            value: vec![],
            remove: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleKvPairUpdate {
    pub module_name: String,
    pub updates: Vec<KvPairUpdate>,
}

/// Raw key-value changes, grouped by module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KvPairData {
    pub updates: Vec<ModuleKvPairUpdate>,
}

/// Logical changes to the state objects of one module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectUpdateData {
    pub module_name: String,
    pub updates: Vec<StateObjectUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitData;

/// One unit of the app-data stream.
#[derive(Debug, Clone)]
pub enum Packet {
    ModuleInitialization(ModuleInitializationData),
    StartBlock(StartBlockData),
    Tx(TxData),
    Event(EventData),
    KvPair(KvPairData),
    ObjectUpdate(ObjectUpdateData),
    Commit(CommitData),
}

impl Packet {
    /// Invoke the callback of `listener` that matches this packet, if it's
    /// set. Applying a commit waits for its completion.
    pub fn apply(&self, listener: &Listener) -> AppDataResult<()> {
        match self {
            Packet::ModuleInitialization(data) => call(&listener.initialize_module_data, data),
            Packet::StartBlock(data) => call(&listener.start_block, data),
            Packet::Tx(data) => call(&listener.on_tx, data),
            Packet::Event(data) => call(&listener.on_event, data),
            Packet::KvPair(data) => call(&listener.on_kv_pair, data),
            Packet::ObjectUpdate(data) => call(&listener.on_object_update, data),
            Packet::Commit(data) => {
                let Some(commit) = &listener.commit else {
                    return Ok(());
                };

                match commit(data)? {
                    Some(completion) => completion(),
                    None => Ok(()),
                }
            },
        }
    }

    /// Everything but commits may be part of a batch.
    pub fn is_batchable(&self) -> bool {
        !matches!(self, Packet::Commit(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Packet::ModuleInitialization(_) => "module_initialization",
            Packet::StartBlock(_) => "start_block",
            Packet::Tx(_) => "tx",
            Packet::Event(_) => "event",
            Packet::KvPair(_) => "kv_pair",
            Packet::ObjectUpdate(_) => "object_update",
            Packet::Commit(_) => "commit",
        }
    }
}

fn call<T>(
    callback: &Option<Arc<dyn Fn(&T) -> AppDataResult<()> + Send + Sync>>,
    data: &T,
) -> AppDataResult<()> {
    match callback {
        Some(callback) => callback(data),
        None => Ok(()),
    }
}

macro_rules! impl_into_packet {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Packet {
                fn from(data: $ty) -> Self {
                    Packet::$variant(data)
                }
            }
        )*
    };
}

impl_into_packet! {
    ModuleInitializationData => ModuleInitialization,
    StartBlockData           => StartBlock,
    TxData                   => Tx,
    EventData                => Event,
    KvPairData               => KvPair,
    ObjectUpdateData         => ObjectUpdate,
    CommitData               => Commit,
}
