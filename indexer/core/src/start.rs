use {
    crate::{
        catch_up_gate, sanity_gate, ConfigInput, IndexerError, IndexerRegistry, IndexerResult,
        InitParams,
    },
    crossbeam::sync::WaitGroup,
    indexer_appdata::{async_listener_mux, AsyncListenerOptions, CancelSignal, Listener},
    indexer_decoding::{decoding_middleware, DecoderResolver, MiddlewareOptions, SyncSource},
    indexer_schema::{view::AppState, AddressCodec, HexAddressCodec},
    std::{collections::BTreeMap, fmt, sync::Arc},
};

pub struct StartIndexingOptions {
    pub config: ConfigInput,
    pub resolver: Arc<dyn DecoderResolver>,
    /// Needed to catch up targets that start out empty past genesis.
    pub sync_source: Option<Arc<dyn SyncSource>>,
    pub registry: IndexerRegistry,
    pub cancel: CancelSignal,
    /// Defaults to [`HexAddressCodec`].
    pub address_codec: Option<Arc<dyn AddressCodec>>,
    /// Released once every worker thread has exited.
    pub done_wait_group: Option<WaitGroup>,
}

impl StartIndexingOptions {
    pub fn new<C>(config: C, resolver: Arc<dyn DecoderResolver>, registry: IndexerRegistry) -> Self
    where
        C: Into<ConfigInput>,
    {
        Self {
            config: config.into(),
            resolver,
            sync_source: None,
            registry,
            cancel: CancelSignal::never(),
            address_codec: None,
            done_wait_group: None,
        }
    }

    pub fn with_sync_source(mut self, sync_source: Arc<dyn SyncSource>) -> Self {
        self.sync_source = Some(sync_source);
        self
    }

    /// Shut every worker down once `cancel` fires. A signal from
    /// [`cancel_pair`](indexer_appdata::cancel_pair) also fires when its
    /// `Canceller` is dropped, so keep the `Canceller` alive while indexing.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_address_codec(mut self, address_codec: Arc<dyn AddressCodec>) -> Self {
        self.address_codec = Some(address_codec);
        self
    }

    pub fn with_done_wait_group(mut self, done_wait_group: WaitGroup) -> Self {
        self.done_wait_group = Some(done_wait_group);
        self
    }
}

/// The entry point of the app-data stream, wired to every configured target.
pub struct IndexingTarget {
    pub listener: Listener,
    /// Views of the targets that offer one, by target name.
    pub views: BTreeMap<String, Arc<dyn AppState>>,
    pub last_block_persisted: BTreeMap<String, i64>,
}

impl fmt::Debug for IndexingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexingTarget")
            .field("listener", &self.listener)
            .field("views", &self.views.keys().collect::<Vec<_>>())
            .field("last_block_persisted", &self.last_block_persisted)
            .finish()
    }
}

/// Initialize every configured target and wire them behind a single
/// listener.
///
/// Each target runs on its own worker behind the decoding middleware, which
/// itself runs on a worker fed by the returned listener. Commit waits for
/// every target. The first `StartBlockData` is checked against what the
/// targets last persisted, and empty targets are caught up from the sync
/// source before they see it.
pub fn start_indexing(options: StartIndexingOptions) -> IndexerResult<IndexingTarget> {
    let StartIndexingOptions {
        config,
        resolver,
        sync_source,
        registry,
        cancel,
        address_codec,
        done_wait_group,
    } = options;

    let config = config.parse()?;
    let address_codec = address_codec.unwrap_or_else(|| Arc::new(HexAddressCodec));

    let mut listeners = Vec::with_capacity(config.target.len());
    let mut views = BTreeMap::new();
    let mut last_block_persisted = BTreeMap::new();

    for (name, target) in config.target {
        if target.filter.as_ref().is_some_and(|filter| !filter.is_empty()) {
            return Err(IndexerError::FilterNotSupported { target: name });
        }

        let Some(init) = registry.get(&target.ty) else {
            return Err(IndexerError::UnknownIndexerType {
                target: name,
                ty: target.ty,
            });
        };

        let res = init(InitParams {
            target_name: name.clone(),
            config: target.config,
            cancel: cancel.clone(),
            address_codec: address_codec.clone(),
        })
        .map_err(|source| IndexerError::Init {
            target: name.clone(),
            source,
        })?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            target_name = %name,
            ty = %target.ty,
            last_block_persisted = res.last_block_persisted,
            "Initialized indexer target"
        );

        let listener = match &sync_source {
            Some(source) if res.last_block_persisted == 0 => {
                catch_up_gate(name.clone(), res.listener, source.clone(), resolver.clone())
            },
            _ => res.listener,
        };

        if let Some(view) = res.view {
            views.insert(name.clone(), view);
        }

        last_block_persisted.insert(name, res.last_block_persisted);
        listeners.push(listener);
    }

    let options = AsyncListenerOptions {
        buffer_size: config.channel_buffer_size,
        cancel,
        done_wait_group,
        name: "indexer-target".to_string(),
    };

    let targets = async_listener_mux(listeners, options.clone())?;
    let decoded = decoding_middleware(targets, resolver, MiddlewareOptions::default())?;
    let root = async_listener_mux(vec![decoded], AsyncListenerOptions {
        name: "indexer-root".to_string(),
        ..options
    })?;

    let listener = sanity_gate(root, last_block_persisted.clone(), sync_source.is_some());

    Ok(IndexingTarget {
        listener,
        views,
        last_block_persisted,
    })
}

// ----------------------------------- tests -----------------------------------
