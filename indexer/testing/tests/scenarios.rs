use {
    indexer_appdata::{
        module_filter, CommitData, KvPairData, KvPairUpdate, Listener, ModuleInitializationData,
        ModuleKvPairUpdate, ObjectUpdateData, StartBlockData,
    },
    indexer_core::{
        start_indexing, IndexerConfig, IndexerRegistry, IndexingConfig, IndexingTarget,
        InitParams, InitResult, StartIndexingOptions,
    },
    indexer_decoding::{
        decoding_middleware, DecoderResolver, MemorySyncSource, MiddlewareOptions,
        StaticDecoderResolver,
    },
    indexer_schema::{view::AppState, FieldValues, ObjectValue, StateObjectUpdate, Value},
    indexer_testing::{
        fixtures::{balance_kv, bank_codec, bank_schema, supply_kv, BANK},
        memory_target::{register_memory_target, MEMORY_TARGET_TYPE},
    },
    serde_json::json,
    std::{
        collections::BTreeMap,
        sync::{Arc, Mutex},
        thread,
        time::Duration,
    },
};

const RECORDER: &str = "recorder";

/// Lines recorded by every `recorder` target, by target name.
#[derive(Clone, Default)]
struct Log(Arc<Mutex<BTreeMap<String, Vec<String>>>>);

impl Log {
    fn push(&self, target: &str, line: String) {
        self.0
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .push(line);
    }

    fn lines(&self, target: &str) -> Vec<String> {
        self.0.lock().unwrap().get(target).cloned().unwrap_or_default()
    }
}

fn describe(update: &StateObjectUpdate) -> String {
    let key = update
        .key
        .to_values()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    format!("update {} {key}", update.type_name)
}

/// A listener writing a line per callback into `log`, sleeping `delay` on
/// every object update.
fn recorder(log: Log, name: String, delay: Duration) -> Listener {
    let push = Arc::new(move |line: String| log.push(&name, line));

    Listener::new()
        .with_initialize_module_data({
            let push = push.clone();
            move |data| {
                push(format!("init {}", data.module_name));
                Ok(())
            }
        })
        .with_start_block({
            let push = push.clone();
            move |data| {
                push(format!("start {}", data.height));
                Ok(())
            }
        })
        .with_on_kv_pair({
            let push = push.clone();
            move |data| {
                for update in &data.updates {
                    push(format!("kv {} x{}", update.module_name, update.updates.len()));
                }
                Ok(())
            }
        })
        .with_on_object_update({
            let push = push.clone();
            move |data| {
                thread::sleep(delay);
                for update in &data.updates {
                    push(describe(update));
                }
                Ok(())
            }
        })
        .with_commit(move |_| {
            push("commit".to_string());
            Ok(None)
        })
}

/// Knows the memory target and `recorder` targets, whose config takes
/// `delay_ms` and `last_block_persisted`.
fn registry(log: Log) -> IndexerRegistry {
    let mut registry = IndexerRegistry::new();

    registry
        .register(RECORDER, move |params: InitParams| {
            let delay = params.config.get("delay_ms").and_then(|v| v.as_u64()).unwrap_or(0);
            let last_block_persisted = params
                .config
                .get("last_block_persisted")
                .and_then(|v| v.as_i64())
                .unwrap_or(0);

            let listener = recorder(
                log.clone(),
                params.target_name,
                Duration::from_millis(delay),
            );

            Ok(InitResult::new(listener, last_block_persisted))
        })
        .unwrap();

    register_memory_target(&mut registry).unwrap();

    registry
}

fn recorder_config(config: serde_json::Value) -> IndexerConfig {
    IndexerConfig::new(RECORDER).with_config(config)
}

fn bank_resolver() -> Arc<dyn DecoderResolver> {
    Arc::new(StaticDecoderResolver::new([(BANK, bank_codec().unwrap())]))
}

fn start(
    config: IndexingConfig,
    resolver: Arc<dyn DecoderResolver>,
    sync_source: Option<MemorySyncSource>,
    log: &Log,
) -> IndexingTarget {
    let mut options = StartIndexingOptions::new(config, resolver, registry(log.clone()));

    if let Some(sync_source) = sync_source {
        options = options.with_sync_source(Arc::new(sync_source));
    }

    start_indexing(options).unwrap()
}

fn kv_data(module_name: &str, updates: Vec<KvPairUpdate>) -> KvPairData {
    KvPairData {
        updates: vec![ModuleKvPairUpdate {
            module_name: module_name.to_string(),
            updates,
        }],
    }
}

fn balance(view: &dyn AppState, address: &str, denom: &str) -> Option<FieldValues> {
    let module = view.get_module(BANK).unwrap()?;
    let collection = module.get_object_collection("balance").unwrap()?;
    let key = FieldValues::from(vec![Value::from(address), Value::from(denom)]);

    collection
        .get_object(&key)
        .unwrap()
        .map(|object| match object.value {
            ObjectValue::Fields(values) => values,
            ObjectValue::Updates(_) => panic!("stored a partial update"),
        })
}

#[test]
fn module_initialization_reaches_the_target_once() {
    let log = Log::default();
    let config = IndexingConfig::default().with_target("a", recorder_config(json!({})));
    let target = start(config, Arc::new(StaticDecoderResolver::default()), None, &log);

    target
        .listener
        .send_packet(ModuleInitializationData {
            module_name: BANK.to_string(),
            schema: Arc::new(bank_schema().unwrap()),
        })
        .unwrap();
    target.listener.send_packet(StartBlockData::new(1)).unwrap();
    target.listener.send_packet(CommitData).unwrap();

    assert_eq!(log.lines("a"), ["init bank", "start 1", "commit"]);
}

#[test]
fn raw_state_is_decoded_into_object_updates() {
    let log = Log::default();
    let config = IndexingConfig::default().with_target("a", recorder_config(json!({})));
    let target = start(config, bank_resolver(), None, &log);

    target.listener.send_packet(StartBlockData::new(1)).unwrap();
    target
        .listener
        .send_packet(kv_data(BANK, vec![supply_kv("foo", 100), balance_kv("bob", "foo", 100)]))
        .unwrap();
    target.listener.send_packet(CommitData).unwrap();

    assert_eq!(log.lines("a"), [
        "init bank",
        "start 1",
        "kv bank x2",
        r#"update supply "foo""#,
        r#"update balance "bob","foo""#,
        "commit",
    ]);
}

#[test]
fn view_reflects_committed_blocks() {
    let log = Log::default();
    let config =
        IndexingConfig::default().with_target("mem", IndexerConfig::new(MEMORY_TARGET_TYPE));
    let target = start(config, bank_resolver(), None, &log);
    let view = target.views.get("mem").unwrap().clone();

    target.listener.send_packet(StartBlockData::new(1)).unwrap();
    target
        .listener
        .send_packet(kv_data(BANK, vec![supply_kv("foo", 100), balance_kv("bob", "foo", 100)]))
        .unwrap();
    target.listener.send_packet(CommitData).unwrap();

    assert_eq!(
        balance(view.as_ref(), "bob", "foo"),
        Some(FieldValues::from(Value::Uint64(100)))
    );

    target.listener.send_packet(StartBlockData::new(2)).unwrap();
    target
        .listener
        .send_packet(kv_data(BANK, vec![
            balance_kv("bob", "foo", 50),
            balance_kv("alice", "foo", 50),
        ]))
        .unwrap();
    target.listener.send_packet(CommitData).unwrap();

    assert_eq!(
        balance(view.as_ref(), "alice", "foo"),
        Some(FieldValues::from(Value::Uint64(50)))
    );
    assert_eq!(
        balance(view.as_ref(), "bob", "foo"),
        Some(FieldValues::from(Value::Uint64(50)))
    );
}

#[test]
fn empty_target_catches_up_before_its_first_block() {
    let log = Log::default();

    let mut source = MemorySyncSource::new();
    source.set(BANK, b"supply/foo".to_vec(), b"100".to_vec());
    source.set(BANK, b"balance/bob/foo".to_vec(), b"100".to_vec());

    let config = IndexingConfig::default().with_target("a", recorder_config(json!({})));
    let target = start(config, bank_resolver(), Some(source), &log);

    target.listener.send_packet(StartBlockData::new(2)).unwrap();
    target.listener.send_packet(CommitData).unwrap();

    assert_eq!(log.lines("a"), [
        "init bank",
        r#"update balance "bob","foo""#,
        r#"update supply "foo""#,
        "start 2",
        "commit",
    ]);
}

#[test]
fn commit_waits_for_every_target() {
    let log = Log::default();
    let config = IndexingConfig::default()
        .with_target("slow", recorder_config(json!({ "delay_ms": 50 })))
        .with_target("fast", recorder_config(json!({ "delay_ms": 5 })));
    let target = start(config, Arc::new(StaticDecoderResolver::default()), None, &log);

    target.listener.send_packet(StartBlockData::new(1)).unwrap();

    for i in 0..100 {
        target
            .listener
            .send_packet(ObjectUpdateData {
                module_name: BANK.to_string(),
                updates: vec![StateObjectUpdate::insert(
                    "supply",
                    Value::String(format!("denom{i}")),
                    Value::Uint64(i),
                )],
            })
            .unwrap();
    }

    target.listener.send_packet(CommitData).unwrap();

    let expected = std::iter::once("start 1".to_string())
        .chain((0..100).map(|i| format!(r#"update supply "denom{i}""#)))
        .chain(std::iter::once("commit".to_string()))
        .collect::<Vec<_>>();

    assert_eq!(log.lines("slow"), expected);
    assert_eq!(log.lines("fast"), expected);
}

#[test]
fn module_filter_drops_other_modules() {
    let log = Log::default();
    let listener = module_filter(
        recorder(log.clone(), "a".to_string(), Duration::ZERO),
        |module: &str| module == BANK,
    );

    let resolver = Arc::new(StaticDecoderResolver::new([
        (BANK, bank_codec().unwrap()),
        ("staking", bank_codec().unwrap()),
    ]));

    let listener = decoding_middleware(listener, resolver, MiddlewareOptions::default()).unwrap();

    listener
        .send_packet(KvPairData {
            updates: vec![
                ModuleKvPairUpdate {
                    module_name: BANK.to_string(),
                    updates: vec![supply_kv("foo", 1)],
                },
                ModuleKvPairUpdate {
                    module_name: "staking".to_string(),
                    updates: vec![supply_kv("bar", 2), supply_kv("baz", 3)],
                },
            ],
        })
        .unwrap();

    assert_eq!(log.lines("a"), [
        "init bank",
        "kv bank x1",
        r#"update supply "foo""#,
    ]);
}

#[test]
fn resuming_out_of_order_fails_the_first_block() {
    let log = Log::default();
    let config = IndexingConfig::default()
        .with_target("a", recorder_config(json!({ "last_block_persisted": 5 })));
    let target = start(config, bank_resolver(), None, &log);

    assert!(target.listener.send_packet(StartBlockData::new(9)).is_err());
    assert!(target.listener.send_packet(StartBlockData::new(6)).is_ok());
}
