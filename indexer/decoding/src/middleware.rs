use {
    crate::{DecoderResolver, ModuleCodec},
    indexer_appdata::{
        AppDataResult, Callback, KvPairData, Listener, ModuleFilter, ModuleInitializationData,
        ModuleKvPairUpdate, ObjectUpdateData,
    },
    std::{
        collections::BTreeMap,
        sync::{Arc, Mutex},
    },
};

#[derive(Clone, Default)]
pub struct MiddlewareOptions {
    /// Modules rejected by the filter are neither initialized nor decoded.
    pub module_filter: Option<ModuleFilter>,
}

/// Codecs resolved so far, by module. `None` marks a module that has no codec
/// or is filtered out, so it's never looked up again.
type CodecMemo = BTreeMap<String, Option<ModuleCodec>>;

/// Put a decoding stage in front of `target`: key-value packets are decoded
/// into object updates using the codecs found by `resolver`.
///
/// If `target` listens to neither module initialization nor object updates,
/// it's returned unchanged. Otherwise every module known upfront is
/// initialized right away. Modules first seen in the stream are resolved
/// lazily, and initialized just before their first updates. Raw key-value
/// packets are still passed on to `target` if it wants them.
pub fn decoding_middleware(
    target: Listener,
    resolver: Arc<dyn DecoderResolver>,
    options: MiddlewareOptions,
) -> AppDataResult<Listener> {
    if !target.wants_object_updates() {
        return Ok(target);
    }

    let filter = options.module_filter;
    let mut memo = CodecMemo::new();

    resolver.all_decoders(&mut |module_name, codec| {
        if !passes(&filter, module_name) {
            return Ok(());
        }

        memo.insert(module_name.to_string(), Some(codec.clone()));
        initialize(&target.initialize_module_data, module_name, codec)
    })?;

    let memo = Arc::new(Mutex::new(memo));
    let initialize_module_data = target.initialize_module_data.clone();
    let on_object_update = target.on_object_update.clone();
    let on_kv_pair = target.on_kv_pair.clone();

    let decode: Callback<KvPairData> = Arc::new(move |data: &KvPairData| {
        if let Some(on_kv_pair) = &on_kv_pair {
            on_kv_pair(data)?;
        }

        for update in &data.updates {
            let codec = resolve(
                &memo,
                resolver.as_ref(),
                &filter,
                &initialize_module_data,
                &update.module_name,
            )?;

            let Some(codec) = codec else {
                continue;
            };

            decode_module_updates(&codec, update, &on_object_update)?;
        }

        Ok(())
    });

    Ok(Listener {
        on_kv_pair: Some(decode),
        ..target
    })
}

fn passes(filter: &Option<ModuleFilter>, module_name: &str) -> bool {
    filter.as_ref().map_or(true, |filter| filter(module_name))
}

fn initialize(
    initialize_module_data: &Option<Callback<ModuleInitializationData>>,
    module_name: &str,
    codec: &ModuleCodec,
) -> AppDataResult<()> {
    match initialize_module_data {
        Some(initialize_module_data) => initialize_module_data(&ModuleInitializationData {
            module_name: module_name.to_string(),
            schema: codec.schema.clone(),
        }),
        None => Ok(()),
    }
}

/// The memoized codec of `module_name`, resolving (and initializing) it on
/// first sight.
fn resolve(
    memo: &Mutex<CodecMemo>,
    resolver: &dyn DecoderResolver,
    filter: &Option<ModuleFilter>,
    initialize_module_data: &Option<Callback<ModuleInitializationData>>,
    module_name: &str,
) -> AppDataResult<Option<ModuleCodec>> {
    if let Some(codec) = memo.lock()?.get(module_name) {
        return Ok(codec.clone());
    }

    let codec = if passes(filter, module_name) {
        resolver.lookup_decoder(module_name)?
    } else {
        None
    };

    if let Some(codec) = &codec {
        #[cfg(feature = "tracing")]
        tracing::info!(module = module_name, "Resolved decoder for new module");

        initialize(initialize_module_data, module_name, codec)?;
    }

    memo.lock()?.insert(module_name.to_string(), codec.clone());

    Ok(codec)
}

fn decode_module_updates(
    codec: &ModuleCodec,
    update: &ModuleKvPairUpdate,
    on_object_update: &Option<Callback<ObjectUpdateData>>,
) -> AppDataResult<()> {
    let (Some(kv_decoder), Some(on_object_update)) = (&codec.kv_decoder, on_object_update) else {
        return Ok(());
    };

    let mut updates = Vec::with_capacity(update.updates.len());

    for kv_pair in &update.updates {
        updates.extend(kv_decoder(kv_pair)?);
    }

    if updates.is_empty() {
        return Ok(());
    }

    on_object_update(&ObjectUpdateData {
        module_name: update.module_name.clone(),
        updates,
    })
}

// ----------------------------------- tests -----------------------------------
