use {
    crate::{
        AppDataResult, BatchCallback, Callback, CommitCallback, CommitCompletion, CommitData,
        Listener, PacketBatch,
    },
    std::sync::Arc,
};

/// Combine listeners into one that calls each of them in order.
///
/// Every callback stops at the first error. A callback of the combined
/// listener is only set if at least one of the listeners sets it.
///
/// Commit calls every listener's commit callback, then returns a single
/// completion that runs every returned completion (even after one of them
/// fails) and reports the first error.
pub fn listener_mux(listeners: Vec<Listener>) -> Listener {
    let commits = listeners
        .iter()
        .filter_map(|listener| listener.commit.clone())
        .collect::<Vec<_>>();

    let commit: Option<CommitCallback> = if commits.is_empty() {
        None
    } else {
        Some(Arc::new(move |data: &CommitData| -> AppDataResult<Option<CommitCompletion>> {
            let mut completions = Vec::new();

            for commit in &commits {
                if let Some(completion) = commit(data)? {
                    completions.push(completion);
                }
            }

            if completions.is_empty() {
                return Ok(None);
            }

            let completion: CommitCompletion = Box::new(move || run_all(completions));

            Ok(Some(completion))
        }))
    };

    let on_batch: Option<BatchCallback> =
        if listeners.iter().any(|listener| listener.on_batch.is_some()) {
            let listeners = listeners.clone();

            Some(Arc::new(move |batch: &PacketBatch| {
                listeners
                    .iter()
                    .try_for_each(|listener| batch.apply(listener))
            }))
        } else {
            None
        };

    Listener {
        initialize_module_data: mux_callback(&listeners, |l| &l.initialize_module_data),
        start_block: mux_callback(&listeners, |l| &l.start_block),
        on_tx: mux_callback(&listeners, |l| &l.on_tx),
        on_event: mux_callback(&listeners, |l| &l.on_event),
        on_kv_pair: mux_callback(&listeners, |l| &l.on_kv_pair),
        on_object_update: mux_callback(&listeners, |l| &l.on_object_update),
        commit,
        on_batch,
    }
}

fn mux_callback<T, G>(listeners: &[Listener], get: G) -> Option<Callback<T>>
where
    T: 'static,
    G: Fn(&Listener) -> &Option<Callback<T>>,
{
    let callbacks = listeners
        .iter()
        .filter_map(|listener| get(listener).clone())
        .collect::<Vec<_>>();

    match callbacks.len() {
        0 => None,
        1 => callbacks.into_iter().next(),
        _ => Some(Arc::new(move |data: &T| {
            callbacks.iter().try_for_each(|callback| callback(data))
        })),
    }
}

/// Run every completion and return the first error.
pub(crate) fn run_all(completions: Vec<CommitCompletion>) -> AppDataResult<()> {
    let mut result = Ok(());

    for completion in completions {
        if let Err(err) = completion() {
            if result.is_ok() {
                result = Err(err);
            }
        }
    }

    result
}

// ----------------------------------- tests -----------------------------------
