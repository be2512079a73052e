use {
    crate::{
        BatchCallback, Callback, KvPairData, Listener, ModuleInitializationData, ObjectUpdateData,
        Packet, PacketBatch,
    },
    std::sync::Arc,
};

pub type ModuleFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Only let module-scoped data of modules matching `filter` through to
/// `listener`. Blocks, transactions, events and commits always pass.
///
/// Key-value data is filtered per module entry; if no entry is left the
/// packet is dropped entirely.
pub fn module_filter<F>(listener: Listener, filter: F) -> Listener
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    let filter: ModuleFilter = Arc::new(filter);

    let initialize_module_data = listener.initialize_module_data.clone().map(|inner| {
        let filter = filter.clone();
        let callback: Callback<ModuleInitializationData> =
            Arc::new(move |data: &ModuleInitializationData| {
                if filter(&data.module_name) {
                    inner(data)?;
                }
                Ok(())
            });
        callback
    });

    let on_kv_pair = listener.on_kv_pair.clone().map(|inner| {
        let filter = filter.clone();
        let callback: Callback<KvPairData> = Arc::new(move |data: &KvPairData| {
            if let Some(filtered) = filter_kv_pairs(data, filter.as_ref()) {
                inner(&filtered)?;
            }
            Ok(())
        });
        callback
    });

    let on_object_update = listener.on_object_update.clone().map(|inner| {
        let filter = filter.clone();
        let callback: Callback<ObjectUpdateData> = Arc::new(move |data: &ObjectUpdateData| {
            if filter(&data.module_name) {
                inner(data)?;
            }
            Ok(())
        });
        callback
    });

    let on_batch = listener.on_batch.clone().map(|inner| {
        let filter = filter.clone();
        let callback: BatchCallback = Arc::new(move |batch: &PacketBatch| {
            let packets = batch
                .packets()
                .iter()
                .filter_map(|packet| filter_packet(packet, filter.as_ref()))
                .collect::<Vec<_>>();

            if packets.is_empty() {
                return Ok(());
            }

            inner(&PacketBatch::new(packets)?)
        });
        callback
    });

    Listener {
        initialize_module_data,
        on_kv_pair,
        on_object_update,
        on_batch,
        ..listener
    }
}

/// The part of `packet` that passes `filter`, if any.
pub fn filter_packet(
    packet: &Packet,
    filter: &(dyn Fn(&str) -> bool + Send + Sync),
) -> Option<Packet> {
    match packet {
        Packet::ModuleInitialization(data) if !filter(&data.module_name) => None,
        Packet::ObjectUpdate(data) if !filter(&data.module_name) => None,
        Packet::KvPair(data) => filter_kv_pairs(data, filter).map(Packet::KvPair),
        packet => Some(packet.clone()),
    }
}

fn filter_kv_pairs(
    data: &KvPairData,
    filter: &(dyn Fn(&str) -> bool + Send + Sync),
) -> Option<KvPairData> {
    let updates = data
        .updates
        .iter()
        .filter(|update| filter(&update.module_name))
        .cloned()
        .collect::<Vec<_>>();

    if updates.is_empty() {
        return None;
    }

    Some(KvPairData { updates })
}

// ----------------------------------- tests -----------------------------------
