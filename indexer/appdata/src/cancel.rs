use {
    crossbeam::channel::{self, Receiver, Sender, TryRecvError},
    std::sync::{Arc, Mutex, PoisonError},
};

/// Create a connected cancellation pair.
///
/// The signal fires as soon as the last clone of the [`Canceller`] is
/// dropped, so the caller must hold on to one for as long as the workers
/// observing the signal are meant to run.
pub fn cancel_pair() -> (Canceller, CancelSignal) {
    let (tx, rx) = channel::bounded(0);

    let canceller = Canceller {
        sender: Arc::new(Mutex::new(Some(tx))),
    };

    let signal = CancelSignal {
        receiver: rx,
        _keep_alive: None,
    };

    (canceller, signal)
}

/// Triggers cancellation. Cancelling is idempotent.
///
/// Dropping every clone of a `Canceller` counts as cancelling: the channel
/// behind [`CancelSignal`] gets disconnected and every worker watching it
/// shuts down. Use [`CancelSignal::never`] when nothing should ever cancel.
#[derive(Debug, Clone)]
pub struct Canceller {
    sender: Arc<Mutex<Option<Sender<()>>>>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Observes cancellation. Nothing is ever sent on the inner channel; it gets
/// disconnected on cancel, which wakes up every `select!` waiting on
/// [`CancelSignal::receiver`].
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: Receiver<()>,
    _keep_alive: Option<Arc<Sender<()>>>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (tx, rx) = channel::bounded(0);

        Self {
            receiver: rx,
            _keep_alive: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// For use in `crossbeam::select!`: a receive on it completes (with an
    /// error) once cancelled.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::never()
    }
}

// ----------------------------------- tests -----------------------------------
