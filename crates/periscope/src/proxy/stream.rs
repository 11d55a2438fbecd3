//! Per-owner stream cache.
//!
//! Every service proxy and every remote object instance owns one
//! [`StreamCache`]: a map from member name to the last value pushed by an
//! active subscription. Absence of a slot means "not subscribed", never
//! "value unknown" — a property read that misses here falls back to a
//! direct call and does not write the cache.
//!
//! The subscription's consumer task is the single writer for its slot;
//! updates arrive serialized on the push channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::transport::{StreamEvent, StreamHandle, Transport};

/// One update delivered to a subscription observer.
#[derive(Debug, Clone)]
pub enum StreamUpdate {
    /// A new decoded value was pushed.
    Value(Value),
    /// The channel closed without an explicit unsubscribe. The cache slot
    /// has already been cleared; stale values will not be served.
    Closed,
}

/// Caller-supplied observer invoked on every push.
pub type StreamObserver = Box<dyn Fn(StreamUpdate) + Send + Sync>;

/// Decodes one pushed wire value against the subscribed property's
/// declared return type.
pub(crate) type StreamDecoder = Arc<dyn Fn(&Bytes) -> Result<Value> + Send + Sync>;

/// Member-keyed last-pushed-value slots for one owner.
#[derive(Clone, Default)]
pub struct StreamCache {
    slots: Arc<Mutex<HashMap<String, Value>>>,
}

impl StreamCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The cached value, if a subscription is active for this member.
    pub fn read(&self, member: &str) -> Option<Value> {
        self.lock().get(member).cloned()
    }

    fn store(&self, member: &str, value: Value) {
        self.lock().insert(member.to_string(), value);
    }

    fn clear(&self, member: &str) {
        self.lock().remove(member);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.slots.lock().expect("stream cache mutex poisoned")
    }

    /// Wire an open transport subscription into this cache.
    ///
    /// Spawns the consumer task that decodes each push, updates the slot
    /// and invokes the observer. If the channel closes without an explicit
    /// unsubscribe, the slot is cleared and the observer sees
    /// [`StreamUpdate::Closed`] exactly once.
    pub(crate) fn subscribe(
        &self,
        member: &str,
        handle: StreamHandle,
        decoder: StreamDecoder,
        observer: Option<StreamObserver>,
        transport: Arc<dyn Transport>,
    ) -> Subscription {
        let StreamHandle { id, mut values } = handle;
        let cache = self.clone();
        let slot = member.to_string();

        debug!(member = %slot, stream_id = id, "subscription opened");

        let task = tokio::spawn({
            let cache = cache.clone();
            let slot = slot.clone();
            async move {
                loop {
                    match values.recv().await {
                        Some(StreamEvent::Value(wire)) => match decoder(&wire) {
                            Ok(value) => {
                                cache.store(&slot, value.clone());
                                if let Some(observer) = &observer {
                                    observer(StreamUpdate::Value(value));
                                }
                            }
                            Err(e) => {
                                warn!(member = %slot, stream_id = id, error = %e, "dropping undecodable stream push");
                            }
                        },
                        Some(StreamEvent::Closed) | None => break,
                    }
                }
                // Channel gone without close(): stop serving stale values.
                warn!(member = %slot, stream_id = id, "stream channel closed by peer");
                cache.clear(&slot);
                if let Some(observer) = &observer {
                    observer(StreamUpdate::Closed);
                }
            }
        });

        Subscription {
            member: slot,
            stream_id: id,
            cache,
            transport,
            task,
            closed: AtomicBool::new(false),
        }
    }
}

impl std::fmt::Debug for StreamCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCache")
            .field("slots", &self.lock().len())
            .finish()
    }
}

/// An active value subscription.
///
/// [`close`](Subscription::close) is the explicit unsubscribe; calling it
/// again is a no-op. Dropping the handle without closing leaves the
/// subscription (and its cache slot) active until the channel closes.
pub struct Subscription {
    member: String,
    stream_id: u64,
    cache: StreamCache,
    transport: Arc<dyn Transport>,
    task: JoinHandle<()>,
    closed: AtomicBool,
}

impl Subscription {
    /// Normalized member name this subscription serves.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Server-assigned subscription id.
    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    /// Unsubscribe: stop the consumer, remove the cache slot, and tear the
    /// subscription down at the transport. Safe to call while a push is in
    /// flight; no observer callback fires after this returns. Subsequent
    /// calls are no-ops.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.task.abort();
        self.cache.clear(&self.member);
        debug!(member = %self.member, stream_id = self.stream_id, "subscription closed");
        self.transport.close_stream(self.stream_id).await
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("member", &self.member)
            .field("stream_id", &self.stream_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use crate::transport::{CallObject, CallResult};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    struct NullTransport {
        closes: AtomicUsize,
    }

    #[async_trait]
    impl Transport for NullTransport {
        async fn send_call(&self, _call: CallObject) -> Result<CallResult> {
            Ok(CallResult::void())
        }

        async fn open_stream(&self, _call: CallObject) -> Result<StreamHandle> {
            Err(RpcError::transport("not used"))
        }

        async fn close_stream(&self, _id: u64) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn json_decoder() -> StreamDecoder {
        Arc::new(|wire: &Bytes| Ok(serde_json::from_slice(wire)?))
    }

    async fn settle() {
        // Let the consumer task run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_push_updates_cache_and_observer() {
        let cache = StreamCache::new();
        let transport = Arc::new(NullTransport { closes: AtomicUsize::new(0) });
        let (tx, rx) = mpsc::channel(8);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer: StreamObserver = {
            let seen = Arc::clone(&seen);
            Box::new(move |update| seen.lock().unwrap().push(update))
        };

        let subscription = cache.subscribe(
            "altitude",
            StreamHandle { id: 7, values: rx },
            json_decoder(),
            Some(observer),
            transport.clone(),
        );

        assert_eq!(cache.read("altitude"), None);

        tx.send(StreamEvent::Value(Bytes::from_static(b"1000")))
            .await
            .unwrap();
        settle().await;

        assert_eq!(cache.read("altitude"), Some(serde_json::json!(1000)));
        assert!(matches!(
            seen.lock().unwrap().as_slice(),
            [StreamUpdate::Value(v)] if *v == serde_json::json!(1000)
        ));

        subscription.close().await.unwrap();
        assert_eq!(cache.read("altitude"), None);
    }

    #[tokio::test]
    async fn test_double_close_is_noop() {
        let cache = StreamCache::new();
        let transport = Arc::new(NullTransport { closes: AtomicUsize::new(0) });
        let (_tx, rx) = mpsc::channel(8);

        let subscription = cache.subscribe(
            "altitude",
            StreamHandle { id: 7, values: rx },
            json_decoder(),
            None,
            transport.clone(),
        );

        subscription.close().await.unwrap();
        subscription.close().await.unwrap();
        subscription.close().await.unwrap();

        // Transport teardown ran exactly once.
        assert_eq!(transport.closes.load(Ordering::SeqCst), 1);
        assert!(subscription.is_closed());
    }

    #[tokio::test]
    async fn test_channel_loss_clears_slot_and_notifies_closed() {
        let cache = StreamCache::new();
        let transport = Arc::new(NullTransport { closes: AtomicUsize::new(0) });
        let (tx, rx) = mpsc::channel(8);

        let closes_seen = Arc::new(AtomicUsize::new(0));
        let observer: StreamObserver = {
            let closes_seen = Arc::clone(&closes_seen);
            Box::new(move |update| {
                if matches!(update, StreamUpdate::Closed) {
                    closes_seen.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let _subscription = cache.subscribe(
            "altitude",
            StreamHandle { id: 9, values: rx },
            json_decoder(),
            Some(observer),
            transport.clone(),
        );

        tx.send(StreamEvent::Value(Bytes::from_static(b"42")))
            .await
            .unwrap();
        settle().await;
        assert_eq!(cache.read("altitude"), Some(serde_json::json!(42)));

        // Peer goes away.
        drop(tx);
        settle().await;

        assert_eq!(cache.read("altitude"), None);
        assert_eq!(closes_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_undecodable_push_is_dropped_not_cached() {
        let cache = StreamCache::new();
        let transport = Arc::new(NullTransport { closes: AtomicUsize::new(0) });
        let (tx, rx) = mpsc::channel(8);

        let _subscription = cache.subscribe(
            "altitude",
            StreamHandle { id: 3, values: rx },
            json_decoder(),
            None,
            transport.clone(),
        );

        tx.send(StreamEvent::Value(Bytes::from_static(b"not json")))
            .await
            .unwrap();
        settle().await;

        assert_eq!(cache.read("altitude"), None);
    }
}
