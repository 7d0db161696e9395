use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Weak,
};
use std::time::Duration;

/// Published whenever the platform reports a ducking state toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuckingStateChanged {
    pub is_ducked: bool,
}

/// Identity of a callback subscription, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&DuckingStateChanged) + Send + Sync>;

/// Observer registry for ducking state notifications.
///
/// Dispatch is synchronous on the caller's thread, in registration order.
/// Handlers run outside the registry lock and may subscribe or unsubscribe.
///
/// Callback subscribe:
///   let id = events.subscribe(|ev| println!("{}", ev.is_ducked));
///   events.unsubscribe(id);
///
/// Channel subscribe:
///   let sub = events.subscribe_channel();
///   let ev = sub.recv_timeout(Duration::from_millis(100));
pub struct DuckingEvents {
    inner: Arc<Inner>,
}

impl Default for DuckingEvents {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DuckingEvents {
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                subs: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DuckingStateChanged) + Send + Sync + 'static,
    {
        let id = self.inner.add(Sink::Callback(Arc::new(handler)));
        SubscriptionId(id)
    }

    /// Returns `false` if the id was not registered.
    #[inline]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove(id.0)
    }

    /// Channel-backed subscription. Unregisters itself on drop.
    pub fn subscribe_channel(&self) -> DuckingSubscription {
        let (tx, rx) = crossbeam_channel::unbounded::<DuckingStateChanged>();
        let id = self.inner.add(Sink::Channel(tx));

        DuckingSubscription {
            hub: Arc::downgrade(&self.inner),
            id,
            rx,
        }
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subs.lock().len()
    }

    /// Delivers `event` to every current subscriber.
    ///
    /// Returns the number of subscribers reached. Zero subscribers is not an error.
    pub fn dispatch(&self, event: DuckingStateChanged) -> usize {
        self.inner.dispatch(event)
    }
}

/// Receiving end of [`DuckingEvents::subscribe_channel`].
pub struct DuckingSubscription {
    hub: Weak<Inner>,
    id: u64,
    rx: Receiver<DuckingStateChanged>,
}

impl DuckingSubscription {
    #[inline]
    pub fn try_recv(&self) -> Option<DuckingStateChanged> {
        self.rx.try_recv().ok()
    }

    /// `None` on timeout or if the registry is gone.
    #[inline]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<DuckingStateChanged> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    #[inline]
    pub fn drain_into(&self, out: &mut Vec<DuckingStateChanged>) -> usize {
        let mut n = 0usize;
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
            n += 1;
        }
        n
    }
}

impl Drop for DuckingSubscription {
    fn drop(&mut self) {
        let Some(hub) = self.hub.upgrade() else { return };
        hub.remove(self.id);
    }
}

#[derive(Clone)]
enum Sink {
    Callback(Handler),
    Channel(Sender<DuckingStateChanged>),
}

#[derive(Clone)]
struct Subscriber {
    id: u64,
    sink: Sink,
}

struct Inner {
    next_id: AtomicU64,
    subs: Mutex<Vec<Subscriber>>,
}

impl Inner {
    fn add(&self, sink: Sink) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subs.lock().push(Subscriber { id, sink });
        id
    }

    fn remove(&self, id: u64) -> bool {
        let mut subs = self.subs.lock();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    fn dispatch(&self, event: DuckingStateChanged) -> usize {
        let snapshot = self.subs.lock().clone();
        if snapshot.is_empty() {
            return 0;
        }

        let mut delivered = 0usize;
        let mut dead: Vec<u64> = Vec::new();

        for s in snapshot.iter() {
            match &s.sink {
                Sink::Callback(handler) => {
                    handler(&event);
                    delivered += 1;
                }
                Sink::Channel(tx) => {
                    if tx.send(event).is_ok() {
                        delivered += 1;
                    } else {
                        dead.push(s.id);
                    }
                }
            }
        }

        if !dead.is_empty() {
            self.subs.lock().retain(|s| !dead.contains(&s.id));
        }

        delivered
    }
}
