use {
    crate::{IndexerError, IndexerResult},
    indexer_appdata::{
        AppDataError, AppDataResult, Callback, Listener, ModuleInitializationData, StartBlockData,
    },
    indexer_decoding::{sync, DecoderResolver, SyncOptions, SyncSource},
    std::{
        collections::{BTreeMap, BTreeSet},
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, Mutex,
        },
    },
};

/// Check that a target that last persisted `last_persisted` can resume at
/// block `height`.
///
/// `-1` means the target doesn't persist anything, so it can start anywhere.
/// `0` means it's empty: past genesis it has to catch up first, which takes
/// a sync source. Otherwise the target must be exactly one block behind.
pub fn check_resume(
    target: &str,
    last_persisted: i64,
    height: u64,
    has_sync_source: bool,
) -> IndexerResult<()> {
    match last_persisted {
        -1 => Ok(()),
        0 if height > 1 && !has_sync_source => Err(IndexerError::MissingSyncSource {
            target: target.to_string(),
            height,
        }),
        0 => Ok(()),
        last if height > 0 && last == height as i64 - 1 => Ok(()),
        _ => Err(IndexerError::Consistency {
            target: target.to_string(),
            last_persisted,
            height,
        }),
    }
}

/// Check every target against the first block of the stream before letting
/// it through. A failed check is returned right away from the
/// `StartBlockData` callback.
pub(crate) fn sanity_gate(
    listener: Listener,
    last_block_persisted: BTreeMap<String, i64>,
    has_sync_source: bool,
) -> Listener {
    let checked = AtomicBool::new(false);
    let inner = listener.start_block.clone();

    let start_block: Callback<StartBlockData> = Arc::new(move |data: &StartBlockData| {
        if !checked.load(Ordering::SeqCst) {
            for (target, last_persisted) in &last_block_persisted {
                if let Err(err) =
                    check_resume(target, *last_persisted, data.height, has_sync_source)
                {
                    #[cfg(feature = "tracing")]
                    tracing::error!(%err, "Indexer target can't resume");

                    return Err(AppDataError::from(err));
                }
            }

            checked.store(true, Ordering::SeqCst);
        }

        match &inner {
            Some(inner) => inner(data),
            None => Ok(()),
        }
    });

    Listener {
        start_block: Some(start_block),
        ..listener
    }
}

#[derive(Default)]
struct CatchUp {
    done: bool,
    initialized: BTreeSet<String>,
}

/// Bring an empty target up to date with the current state before it sees
/// its first block.
///
/// At the first `StartBlockData` past genesis, every module is synced from
/// `source` into `listener`, skipping the initialization of modules it has
/// already been told about. Only then is the block forwarded.
pub(crate) fn catch_up_gate(
    target_name: String,
    listener: Listener,
    source: Arc<dyn SyncSource>,
    resolver: Arc<dyn DecoderResolver>,
) -> Listener {
    let state = Arc::new(Mutex::new(CatchUp::default()));

    let initialize_module_data = listener.initialize_module_data.clone().map(|inner| {
        let state = state.clone();
        let callback: Callback<ModuleInitializationData> =
            Arc::new(move |data: &ModuleInitializationData| {
                state.lock()?.initialized.insert(data.module_name.clone());
                inner(data)
            });
        callback
    });

    let target = listener.clone();

    let start_block: Callback<StartBlockData> = Arc::new(move |data: &StartBlockData| {
        let skip_initialized = {
            let mut state = state.lock()?;
            if state.done {
                None
            } else {
                state.done = true;
                Some(std::mem::take(&mut state.initialized))
            }
        };

        if let Some(skip_initialized) = skip_initialized {
            if data.height > 1 {
                catch_up(
                    &target_name,
                    &target,
                    source.as_ref(),
                    resolver.as_ref(),
                    skip_initialized,
                )?;
            }
        }

        match &target.start_block {
            Some(inner) => inner(data),
            None => Ok(()),
        }
    });

    Listener {
        initialize_module_data,
        start_block: Some(start_block),
        ..listener
    }
}

fn catch_up(
    target_name: &str,
    target: &Listener,
    source: &dyn SyncSource,
    resolver: &dyn DecoderResolver,
    skip_initialized: BTreeSet<String>,
) -> AppDataResult<()> {
    #[cfg(feature = "tracing")]
    tracing::info!(target_name, "Catching up indexer target");

    let options = SyncOptions {
        module_filter: None,
        skip_initialized,
    };

    sync(target, source, resolver, &options)
        .map_err(|err| AppDataError::Sync(format!("target `{target_name}`: {err}")))?;

    #[cfg(feature = "tracing")]
    tracing::info!(target_name, "Indexer target caught up");

    Ok(())
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        indexer_appdata::{KvPairUpdate, ObjectUpdateData},
        indexer_decoding::{MemorySyncSource, ModuleCodec, StaticDecoderResolver},
        indexer_schema::{Field, Kind, ModuleSchema, StateObjectType, StateObjectUpdate, Value},
        test_case::test_case,
    };

    #[test_case(-1, 0, false, true ; "not persisting at genesis")]
    #[test_case(-1, 50, false, true ; "not persisting anywhere")]
    #[test_case(0, 0, false, true ; "empty at genesis")]
    #[test_case(0, 1, false, true ; "empty at first block")]
    #[test_case(0, 7, true, true ; "empty with sync source")]
    #[test_case(6, 7, false, true ; "one block behind")]
    #[test_case(7, 7, false, false ; "block already persisted")]
    #[test_case(3, 7, true, false ; "gap")]
    #[test_case(5, 0, false, false ; "persisted past genesis")]
    #[test_case(-2, 1, false, false ; "garbage")]
    fn resume_rules(last_persisted: i64, height: u64, has_sync_source: bool, ok: bool) {
        let res = check_resume("target", last_persisted, height, has_sync_source);

        assert_eq!(res.is_ok(), ok, "{res:?}");
    }

    #[test]
    fn empty_target_without_source() {
        assert!(matches!(
            check_resume("pg", 0, 7, false),
            Err(IndexerError::MissingSyncSource { target, height: 7 }) if target == "pg"
        ));
    }

    #[test]
    fn sanity_gate_checks_the_first_block_only() {
        let blocks = Arc::new(Mutex::new(vec![]));
        let listener = sanity_gate(
            Listener::new().with_start_block({
                let blocks = blocks.clone();
                move |data| {
                    blocks.lock().unwrap().push(data.height);
                    Ok(())
                }
            }),
            BTreeMap::from([("a".to_string(), 4), ("b".to_string(), -1)]),
            false,
        );

        let err = listener.send_packet(StartBlockData::new(9)).unwrap_err();
        assert!(matches!(
            err,
            AppDataError::Other(err) if matches!(
                err.downcast_ref::<IndexerError>(),
                Some(IndexerError::Consistency { last_persisted: 4, height: 9, .. })
            )
        ));

        listener.send_packet(StartBlockData::new(5)).unwrap();
        listener.send_packet(StartBlockData::new(9)).unwrap();

        assert_eq!(*blocks.lock().unwrap(), vec![5, 9]);
    }

    fn resolver() -> StaticDecoderResolver {
        let schema = ModuleSchema::compile(vec![StateObjectType::new("supply")
            .with_key_fields([Field::new("denom", Kind::String)])
            .with_value_fields([Field::new("amount", Kind::Uint64)])
            .into()])
        .unwrap();

        let codec = ModuleCodec::new(schema).with_kv_decoder(|kv: &KvPairUpdate| {
            let denom = String::from_utf8_lossy(&kv.key).to_string();
            let amount = u64::from_be_bytes(kv.value.as_slice().try_into().unwrap());
            Ok(vec![StateObjectUpdate::insert(
                "supply",
                Value::from(denom),
                Value::Uint64(amount),
            )])
        });

        StaticDecoderResolver::new([("bank", codec)])
    }

    fn recorder(log: Arc<Mutex<Vec<String>>>) -> Listener {
        Listener::new()
            .with_initialize_module_data({
                let log = log.clone();
                move |data| {
                    log.lock().unwrap().push(format!("init {}", data.module_name));
                    Ok(())
                }
            })
            .with_on_object_update({
                let log = log.clone();
                move |data: &ObjectUpdateData| {
                    let key = data.updates[0].key.to_values();
                    let denom = key[0].as_str().unwrap();
                    log.lock().unwrap().push(format!("update {denom}"));
                    Ok(())
                }
            })
            .with_start_block(move |data| {
                log.lock().unwrap().push(format!("block {}", data.height));
                Ok(())
            })
    }

    fn gated(log: Arc<Mutex<Vec<String>>>) -> Listener {
        let mut source = MemorySyncSource::new();
        source.set("bank", b"uatom".to_vec(), 100_u64.to_be_bytes().to_vec());

        catch_up_gate(
            "mem".to_string(),
            recorder(log),
            Arc::new(source),
            Arc::new(resolver()),
        )
    }

    #[test]
    fn catches_up_before_the_first_block() {
        let log = Arc::new(Mutex::new(vec![]));
        let listener = gated(log.clone());

        listener.send_packet(StartBlockData::new(2)).unwrap();
        listener.send_packet(StartBlockData::new(3)).unwrap();

        assert_eq!(*log.lock().unwrap(), vec![
            "init bank",
            "update uatom",
            "block 2",
            "block 3",
        ]);
    }

    #[test]
    fn skips_modules_already_initialized() {
        let log = Arc::new(Mutex::new(vec![]));
        let listener = gated(log.clone());

        listener
            .send_packet(ModuleInitializationData {
                module_name: "bank".to_string(),
                schema: resolver().lookup_decoder("bank").unwrap().unwrap().schema,
            })
            .unwrap();
        listener.send_packet(StartBlockData::new(2)).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["init bank", "update uatom", "block 2"]);
    }

    #[test]
    fn no_catch_up_at_genesis() {
        let log = Arc::new(Mutex::new(vec![]));
        let listener = gated(log.clone());

        listener.send_packet(StartBlockData::new(1)).unwrap();
        listener.send_packet(StartBlockData::new(2)).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["block 1", "block 2"]);
    }
}
