use {
    crate::{
        listener_mux, mux::run_all, AppDataError, AppDataResult, BatchCallback, Callback,
        CancelSignal, CommitCallback, CommitCompletion, CommitData, Listener, Packet, PacketBatch,
    },
    crossbeam::{
        channel::{self, Receiver, Sender},
        select,
        sync::WaitGroup,
    },
    std::{sync::Arc, thread},
};

pub const DEFAULT_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone)]
pub struct AsyncListenerOptions {
    /// Capacity of the queue in front of the worker. Senders block while it's
    /// full.
    pub buffer_size: usize,
    pub cancel: CancelSignal,
    /// Dropped by the worker when it exits, so whoever holds the other end
    /// can wait for every worker to finish.
    pub done_wait_group: Option<WaitGroup>,
    /// Used for the worker thread's name and in logs.
    pub name: String,
}

impl Default for AsyncListenerOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            cancel: CancelSignal::never(),
            done_wait_group: None,
            name: "async-listener".to_string(),
        }
    }
}

enum Job {
    Packet(Packet),
    Batch(PacketBatch),
}

/// Run `listener` on its own worker thread behind a bounded queue.
///
/// The returned listener only enqueues. The worker applies packets in the
/// order they were enqueued. If a callback fails, the error is latched and
/// every later packet is dropped until the next commit, which reports the
/// error on `commit_done` and stops the worker. Otherwise each commit is
/// applied and its result sent on `commit_done`.
///
/// Once the worker sees cancellation it exits without invoking any further
/// callback. Enqueuing into a stopped worker fails with
/// [`AppDataError::ListenerStopped`].
pub fn async_listener(
    listener: Listener,
    options: AsyncListenerOptions,
    commit_done: Sender<AppDataResult<()>>,
) -> AppDataResult<Listener> {
    let (tx, rx) = channel::bounded(options.buffer_size);

    let AsyncListenerOptions {
        cancel,
        done_wait_group,
        name,
        ..
    } = options;

    let proxy = proxy_listener(&listener, tx);

    thread::Builder::new().name(name.clone()).spawn(move || {
        run_worker(&name, listener, rx, &cancel, &commit_done);

        // Release the wait group only after everything else is torn down.
        drop(commit_done);
        drop(done_wait_group);
    })?;

    Ok(proxy)
}

fn run_worker(
    name: &str,
    listener: Listener,
    rx: Receiver<Job>,
    cancel: &CancelSignal,
    commit_done: &Sender<AppDataResult<()>>,
) {
    #[cfg(feature = "tracing")]
    tracing::debug!(worker = name, "Async listener started");

    let mut latched: Option<AppDataError> = None;

    loop {
        // `None` if cancelled, or if every sender is gone.
        let job = select! {
            recv(cancel.receiver()) -> _ => None,
            recv(rx) -> job => job.ok(),
        };

        let Some(job) = job else {
            break;
        };

        if cancel.is_cancelled() {
            break;
        }

        #[cfg(feature = "metrics")]
        metrics::counter!("indexer.packets.total", "worker" => name.to_string()).increment(1);

        match job {
            Job::Packet(Packet::Commit(data)) => {
                if let Some(err) = latched.take() {
                    #[cfg(feature = "tracing")]
                    tracing::error!(worker = name, %err, "Reporting latched error at commit");

                    commit_done.send(Err(err)).ok();
                    break;
                }

                #[cfg(feature = "metrics")]
                let started = std::time::Instant::now();

                let res = Packet::Commit(data).apply(&listener);

                #[cfg(feature = "metrics")]
                {
                    metrics::counter!("indexer.commits.total", "worker" => name.to_string())
                        .increment(1);
                    metrics::histogram!("indexer.commit.duration", "worker" => name.to_string())
                        .record(started.elapsed().as_secs_f64());
                }

                let failed = res.is_err();

                if commit_done.send(res).is_err() || failed {
                    break;
                }
            },
            Job::Packet(packet) => {
                if latched.is_none() {
                    latched = packet.apply(&listener).err().map(|err| latch(name, err));
                }
            },
            Job::Batch(batch) => {
                if latched.is_none() {
                    latched = batch.apply(&listener).err().map(|err| latch(name, err));
                }
            },
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(worker = name, "Async listener stopped");
}

#[cfg_attr(not(any(feature = "tracing", feature = "metrics")), allow(unused_variables))]
fn latch(name: &str, err: AppDataError) -> AppDataError {
    #[cfg(feature = "tracing")]
    tracing::warn!(worker = name, %err, "Callback failed; skipping packets until commit");

    #[cfg(feature = "metrics")]
    metrics::counter!("indexer.callback.errors.total", "worker" => name.to_string()).increment(1);

    err
}

/// A listener that forwards every packet `listener` is interested in to the
/// worker queue. Commits are always forwarded.
fn proxy_listener(listener: &Listener, tx: Sender<Job>) -> Listener {
    let commit: CommitCallback = {
        let tx = tx.clone();
        Arc::new(move |data: &CommitData| -> AppDataResult<Option<CommitCompletion>> {
            enqueue(&tx, Job::Packet(Packet::Commit(*data)))?;
            Ok(None)
        })
    };

    let on_batch: BatchCallback = {
        let tx = tx.clone();
        Arc::new(move |batch: &PacketBatch| enqueue(&tx, Job::Batch(batch.clone())))
    };

    Listener {
        initialize_module_data: forward(&listener.initialize_module_data, &tx),
        start_block: forward(&listener.start_block, &tx),
        on_tx: forward(&listener.on_tx, &tx),
        on_event: forward(&listener.on_event, &tx),
        on_kv_pair: forward(&listener.on_kv_pair, &tx),
        on_object_update: forward(&listener.on_object_update, &tx),
        commit: Some(commit),
        on_batch: Some(on_batch),
    }
}

fn forward<T>(callback: &Option<Callback<T>>, tx: &Sender<Job>) -> Option<Callback<T>>
where
    T: Clone + Into<Packet> + 'static,
{
    callback.as_ref()?;

    let tx = tx.clone();

    Some(Arc::new(move |data: &T| {
        enqueue(&tx, Job::Packet(data.clone().into()))
    }))
}

fn enqueue(tx: &Sender<Job>, job: Job) -> AppDataResult<()> {
    tx.send(job).map_err(|_| AppDataError::ListenerStopped)
}

/// Run each listener behind its own [`async_listener`], fanned out by
/// [`listener_mux`].
///
/// Commit is a barrier: its completion waits until every worker has
/// acknowledged the commit, draining every acknowledgement even when one of
/// them reports an error, and returns the first error. Waiting returns
/// [`AppDataError::Cancelled`] if cancellation happens first.
pub fn async_listener_mux(
    listeners: Vec<Listener>,
    options: AsyncListenerOptions,
) -> AppDataResult<Listener> {
    let mut proxies = Vec::with_capacity(listeners.len());
    let mut acks = Vec::with_capacity(listeners.len());

    for (index, listener) in listeners.into_iter().enumerate() {
        let (done_tx, done_rx) = channel::unbounded();

        let options = AsyncListenerOptions {
            name: format!("{}-{index}", options.name),
            ..options.clone()
        };

        proxies.push(async_listener(listener, options, done_tx)?);
        acks.push(done_rx);
    }

    let mut mux = listener_mux(proxies);

    let enqueue_commit = mux.commit.take();
    let acks = Arc::new(acks);
    let cancel = options.cancel;

    mux.commit = Some(Arc::new(
        move |data: &CommitData| -> AppDataResult<Option<CommitCompletion>> {
            let mut completions: Vec<CommitCompletion> = Vec::new();

            if let Some(enqueue_commit) = &enqueue_commit {
                completions.extend(enqueue_commit(data)?);
            }

            let acks = acks.clone();
            let cancel = cancel.clone();

            completions.push(Box::new(move || wait_for_acks(&acks, &cancel)));

            let completion: CommitCompletion = Box::new(move || run_all(completions));

            Ok(Some(completion))
        },
    ));

    Ok(mux)
}

fn wait_for_acks(acks: &[Receiver<AppDataResult<()>>], cancel: &CancelSignal) -> AppDataResult<()> {
    let mut result = Ok(());

    for ack in acks {
        let res = select! {
            recv(ack) -> res => res.unwrap_or(Err(AppDataError::ListenerStopped)),
            recv(cancel.receiver()) -> _ => Err(AppDataError::Cancelled),
        };

        if cancel.is_cancelled() {
            return Err(AppDataError::Cancelled);
        }

        if let Err(err) = res {
            if result.is_ok() {
                result = Err(err);
            }
        }
    }

    result
}

// ----------------------------------- tests -----------------------------------
