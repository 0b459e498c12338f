//! Event Subscriber Tasks
//!
//! Keeps the local cache close to the shared store for the keys this process
//! already holds. A listener task drains the map's channel and decodes each
//! message; a second task applies decoded events to the cache, so reception
//! never waits on the cache lock.
//!
//! Received events are only ever applied locally, never re-published.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::LocalCache;
use crate::codec::ValueCodec;
use crate::event::{decode_event, MapEvent};
use crate::metrics::MapMetrics;
use crate::store::Subscription;

// == Event Subscriber ==
/// Handle to the listener and apply tasks of one map.
pub struct EventSubscriber {
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl EventSubscriber {
    /// Spawns the listener over an already established subscription, plus
    /// the worker applying its events to `cache`.
    pub fn spawn<C: ValueCodec>(
        subscription: Subscription,
        channel: String,
        cache: Arc<RwLock<LocalCache<C::Value>>>,
        codec: Arc<C>,
        metrics: Arc<MapMetrics>,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (events, pending) = mpsc::unbounded_channel();

        let listener = tokio::spawn(listen(
            subscription,
            channel,
            codec,
            metrics,
            events,
            shutdown_rx,
        ));
        let applier = tokio::spawn(apply_events(pending, cache));

        Self {
            shutdown,
            handles: Mutex::new(vec![listener, applier]),
        }
    }

    // == Shutdown ==
    /// Stops listening, lets the apply worker finish the events it already
    /// holds, and waits for both tasks.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let handles: Vec<JoinHandle<()>> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Subscriber task failed: {}", e);
            }
        }
    }
}

async fn listen<C: ValueCodec>(
    mut subscription: Subscription,
    channel: String,
    codec: Arc<C>,
    metrics: Arc<MapMetrics>,
    events: mpsc::UnboundedSender<MapEvent<C::Value>>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Event listener started on channel '{}'", channel);

    loop {
        tokio::select! {
            // fires on shutdown and when the handle is dropped
            _ = shutdown.changed() => break,
            message = subscription.next() => {
                let Some(message) = message else {
                    warn!("Subscription to '{}' ended", channel);
                    break;
                };
                metrics.record_received();

                match decode_event(&message, codec.as_ref()) {
                    Ok(decoded) => {
                        metrics.record_skipped(decoded.skipped);
                        debug!(
                            "Received {} event ({} entries)",
                            decoded.event.command(),
                            decoded.event.len()
                        );
                        if events.send(decoded.event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        metrics.record_dropped();
                        warn!("Discarding message on '{}': {}", channel, e);
                    }
                }
            }
        }
    }

    info!("Event listener stopped on channel '{}'", channel);
}

async fn apply_events<V: Clone>(
    mut pending: mpsc::UnboundedReceiver<MapEvent<V>>,
    cache: Arc<RwLock<LocalCache<V>>>,
) {
    while let Some(event) = pending.recv().await {
        let mut cache = cache.write().await;
        let affected = apply_event(&mut cache, event);
        debug!("Applied remote event to {} local entries", affected);
    }
}

// == Apply Event ==
/// Applies one remote event to the local cache.
///
/// PUT refreshes keys that are already cached and ignores the rest, DELETE
/// drops cached keys, CLEAR empties the cache. Returns the number of local
/// entries touched.
pub fn apply_event<V: Clone>(cache: &mut LocalCache<V>, event: MapEvent<V>) -> usize {
    match event {
        MapEvent::Put(entries) => entries
            .into_iter()
            .filter(|(key, value)| cache.refresh(key, value.clone()))
            .count(),
        MapEvent::Delete(keys) => keys.iter().filter(|key| cache.invalidate(key)).count(),
        MapEvent::Clear => {
            let affected = cache.len();
            cache.clear();
            affected
        }
    }
}
