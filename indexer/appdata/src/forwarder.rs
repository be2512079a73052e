use {
    crate::{AppDataResult, Callback, CommitCompletion, CommitData, Listener, Packet},
    std::sync::Arc,
};

/// A listener that turns every callback back into a [`Packet`] and hands it
/// to `f`. Batches are unpacked into their packets.
pub fn packet_forwarder<F>(f: F) -> Listener
where
    F: Fn(Packet) -> AppDataResult<()> + Send + Sync + 'static,
{
    let f = Arc::new(f);

    let commit = {
        let f = f.clone();
        move |data: &CommitData| -> AppDataResult<Option<CommitCompletion>> {
            f(Packet::Commit(*data))?;
            Ok(None)
        }
    };

    Listener {
        initialize_module_data: Some(forward(&f)),
        start_block: Some(forward(&f)),
        on_tx: Some(forward(&f)),
        on_event: Some(forward(&f)),
        on_kv_pair: Some(forward(&f)),
        on_object_update: Some(forward(&f)),
        commit: Some(Arc::new(commit)),
        on_batch: None,
    }
}

fn forward<T, F>(f: &Arc<F>) -> Callback<T>
where
    T: Clone + Into<Packet> + 'static,
    F: Fn(Packet) -> AppDataResult<()> + Send + Sync + 'static,
{
    let f = f.clone();

    Arc::new(move |data: &T| f(data.clone().into()))
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{PacketBatch, StartBlockData, TxData},
        std::sync::Mutex,
    };

    #[test]
    fn forwards_everything_in_order() {
        let seen = Arc::new(Mutex::new(vec![]));

        let listener = packet_forwarder({
            let seen = seen.clone();
            move |packet| {
                seen.lock().unwrap().push(packet.kind());
                Ok(())
            }
        });

        let batch = PacketBatch::new(vec![
            StartBlockData::new(1).into(),
            TxData::default().into(),
        ])
        .unwrap();

        listener.send_batch(&batch).unwrap();
        listener.send_packet(CommitData).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["start_block", "tx", "commit"]);
    }
}
