use {
    crate::ModuleCodec,
    indexer_appdata::{AppDataError, KvPairUpdate},
    indexer_schema::{Field, Kind, ModuleSchema, StateObjectUpdate, StateObjectType, Value},
};

/// A codec for a module storing `denom => big-endian u64 supply`.
pub fn supply_codec() -> ModuleCodec {
    let schema = ModuleSchema::compile(vec![StateObjectType::new("supply")
        .with_key_fields([Field::new("denom", Kind::String)])
        .with_value_fields([Field::new("amount", Kind::Uint64)])
        .into()])
    .unwrap();

    ModuleCodec::new(schema).with_kv_decoder(|update: &KvPairUpdate| {
        let denom = String::from_utf8(update.key.clone())
            .map_err(|err| AppDataError::decoding("supply", err))?;

        // Keys starting with `_` are internal bookkeeping, not objects.
        if denom.starts_with('_') {
            return Ok(vec![]);
        }

        if update.remove {
            return Ok(vec![StateObjectUpdate::delete("supply", Value::from(denom))]);
        }

        let bytes: [u8; 8] = update
            .value
            .as_slice()
            .try_into()
            .map_err(|_| AppDataError::decoding("supply", "amount must be 8 bytes"))?;

        Ok(vec![StateObjectUpdate::insert(
            "supply",
            Value::from(denom),
            Value::Uint64(u64::from_be_bytes(bytes)),
        )])
    })
}
