//! `LocalBus`: in-process topic bus with a dedicated delivery thread.
//!
//! Publishing only enqueues; a single background thread drains the queue
//! and calls subscribers in publish order.  That mirrors a network broker
//! closely enough that the cooperative side never runs a subscriber
//! callback on its own stack.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::{BusError, BusResult, Envelope, Handler, MessageChannel};

type Subscribers = Arc<RwLock<HashMap<String, Vec<Handler>>>>;

enum Command {
    Deliver(Envelope),
    /// Acknowledged once everything queued before it has been delivered.
    Flush(Sender<()>),
    Shutdown,
}

pub struct LocalBus {
    tx:          Sender<Command>,
    subscribers: Subscribers,
    delivered:   Arc<AtomicU64>,
    worker:      Mutex<Option<JoinHandle<()>>>,
    worker_id:   ThreadId,
}

impl LocalBus {
    /// Start the delivery thread.
    pub fn new() -> BusResult<LocalBus> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let subscribers: Subscribers = Arc::default();
        let delivered = Arc::new(AtomicU64::new(0));

        let handle = thread::Builder::new()
            .name("cps-bus-delivery".into())
            .spawn({
                let subscribers = Arc::clone(&subscribers);
                let delivered = Arc::clone(&delivered);
                move || delivery_loop(rx, subscribers, delivered)
            })?;
        let worker_id = handle.thread().id();

        Ok(LocalBus {
            tx,
            subscribers,
            delivered,
            worker: Mutex::new(Some(handle)),
            worker_id,
        })
    }

    /// Block until every message published before this call has been
    /// handed to its subscribers.  Messages those subscribers publish in
    /// turn are not waited for.
    ///
    /// Must not be called from a subscriber callback.
    pub fn flush(&self) -> BusResult<()> {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        self.tx.send(Command::Flush(ack_tx)).map_err(|_| BusError::Disconnected)?;
        ack_rx.recv().map_err(|_| BusError::Disconnected)
    }

    /// Number of (message, subscriber) deliveries made so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Stop the delivery thread after it drains the queue.  Idempotent.
    pub fn shutdown(&self) {
        let Some(handle) = self.worker.lock().take() else { return };
        let _ = self.tx.send(Command::Shutdown);
        // A subscriber may drop the last handle from the delivery thread
        // itself; joining there would deadlock.
        if thread::current().id() != self.worker_id {
            let _ = handle.join();
        }
    }
}

impl MessageChannel for LocalBus {
    fn publish(&self, topic: &str, payload: String) -> BusResult<()> {
        trace!(topic, %payload, "publish");
        self.tx
            .send(Command::Deliver(Envelope { topic: topic.to_owned(), payload }))
            .map_err(|_| BusError::Disconnected)
    }

    fn subscribe(&self, topic: &str, handler: Handler) -> BusResult<()> {
        debug!(topic, "subscribe");
        self.subscribers.write().entry(topic.to_owned()).or_default().push(handler);
        Ok(())
    }
}

impl Drop for LocalBus {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn delivery_loop(rx: Receiver<Command>, subscribers: Subscribers, delivered: Arc<AtomicU64>) {
    for command in rx {
        match command {
            Command::Deliver(envelope) => {
                // Clone the handler list so callbacks may subscribe or
                // publish without holding the lock.
                let handlers: Vec<Handler> =
                    subscribers.read().get(&envelope.topic).cloned().unwrap_or_default();
                for handler in &handlers {
                    handler(&envelope);
                    delivered.fetch_add(1, Ordering::Relaxed);
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
            Command::Shutdown => break,
        }
    }
    debug!("bus delivery thread stopped");
}
