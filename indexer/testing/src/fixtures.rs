//! A small bank-like module used throughout the tests.
//!
//! Raw state is keyed by `/`-separated paths: `supply/{denom}` and
//! `balance/{address}/{denom}` hold ASCII decimal amounts. The `params`
//! singleton is never written through raw state.

use {
    indexer_appdata::{AppDataError, AppDataResult, KvPairUpdate},
    indexer_decoding::ModuleCodec,
    indexer_schema::{
        Field, FieldValues, Kind, ModuleSchema, SchemaResult, StateObjectType,
        StateObjectUpdate, Value,
    },
};

pub const BANK: &str = "bank";

pub fn bank_schema() -> SchemaResult<ModuleSchema> {
    ModuleSchema::compile(vec![
        StateObjectType::new("balance")
            .with_key_fields([
                Field::new("address", Kind::String),
                Field::new("denom", Kind::String),
            ])
            .with_value_fields([Field::new("amount", Kind::Uint64)])
            .into(),
        StateObjectType::new("supply")
            .with_key_fields([Field::new("denom", Kind::String)])
            .with_value_fields([Field::new("amount", Kind::Uint64)])
            .into(),
        StateObjectType::new("params")
            .with_value_fields([
                Field::new("send_enabled", Kind::Bool),
                Field::new("memo", Kind::String).nullable(),
            ])
            .with_retain_deletions(true)
            .into(),
    ])
}

pub fn bank_codec() -> SchemaResult<ModuleCodec> {
    Ok(ModuleCodec::new(bank_schema()?).with_kv_decoder(decode_bank_kv))
}

pub fn decode_bank_kv(kv: &KvPairUpdate) -> AppDataResult<Vec<StateObjectUpdate>> {
    let key = std::str::from_utf8(&kv.key).map_err(|err| AppDataError::decoding(BANK, err))?;

    let (type_name, key) = match key.split('/').collect::<Vec<_>>().as_slice() {
        ["supply", denom] => ("supply", FieldValues::from(Value::from(*denom))),
        ["balance", address, denom] => (
            "balance",
            FieldValues::from(vec![Value::from(*address), Value::from(*denom)]),
        ),
        _ => return Ok(vec![]),
    };

    if kv.remove {
        return Ok(vec![StateObjectUpdate::delete(type_name, key)]);
    }

    let amount = std::str::from_utf8(&kv.value)
        .ok()
        .and_then(|amount| amount.parse::<u64>().ok())
        .ok_or_else(|| AppDataError::decoding(BANK, format!("invalid amount for `{type_name}`")))?;

    Ok(vec![StateObjectUpdate::insert(type_name, key, Value::Uint64(amount))])
}

pub fn supply_kv(denom: &str, amount: u64) -> KvPairUpdate {
    KvPairUpdate::set(format!("supply/{denom}").into_bytes(), amount.to_string().into_bytes())
}

pub fn balance_kv(address: &str, denom: &str, amount: u64) -> KvPairUpdate {
    KvPairUpdate::set(
        format!("balance/{address}/{denom}").into_bytes(),
        amount.to_string().into_bytes(),
    )
}

// ----------------------------------- tests -----------------------------------
