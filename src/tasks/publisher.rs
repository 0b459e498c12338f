//! Event Publisher Task
//!
//! Background task that pushes map events to the shared store's pub/sub
//! channel, so write operations never wait on the network for notifications.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::codec::ValueCodec;
use crate::event::{encode_event, MapEvent};
use crate::metrics::MapMetrics;
use crate::store::SharedStore;

enum Job<V> {
    Publish(MapEvent<V>),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

// == Event Publisher ==
/// Handle to the single publisher worker of one map.
///
/// Exactly one task drains the queue, so events reach the store in the order
/// they were enqueued by every caller sharing this publisher.
pub struct EventPublisher<V> {
    queue: mpsc::UnboundedSender<Job<V>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<V: Send + 'static> EventPublisher<V> {
    /// Spawns the publisher worker for `channel`.
    pub fn spawn<C>(
        store: Arc<dyn SharedStore>,
        channel: String,
        codec: Arc<C>,
        metrics: Arc<MapMetrics>,
    ) -> Self
    where
        C: ValueCodec<Value = V>,
    {
        let (queue, jobs) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_publisher(jobs, store, channel, codec, metrics));

        Self {
            queue,
            handle: Mutex::new(Some(handle)),
        }
    }

    // == Publish ==
    /// Enqueues an event without waiting for it to be sent.
    pub fn publish(&self, event: MapEvent<V>) {
        if self.queue.send(Job::Publish(event)).is_err() {
            warn!("Publisher stopped, dropping event");
        }
    }

    // == Flush ==
    /// Waits until every event enqueued before this call has been handed to
    /// the shared store.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.queue.send(Job::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    // == Shutdown ==
    /// Sends the events already queued, then stops the worker.
    pub async fn shutdown(&self) {
        let _ = self.queue.send(Job::Shutdown);
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Publisher task failed: {}", e);
            }
        }
    }
}

async fn run_publisher<C: ValueCodec>(
    mut jobs: mpsc::UnboundedReceiver<Job<C::Value>>,
    store: Arc<dyn SharedStore>,
    channel: String,
    codec: Arc<C>,
    metrics: Arc<MapMetrics>,
) {
    info!("Event publisher started for channel '{}'", channel);

    while let Some(job) = jobs.recv().await {
        match job {
            Job::Publish(event) => {
                let encoded = encode_event(&event, codec.as_ref());
                metrics.record_skipped(encoded.skipped);

                if !event.is_empty() && encoded.skipped == event.len() {
                    warn!(
                        "Every entry of a {} event was dropped, nothing published",
                        event.command()
                    );
                    continue;
                }

                match store.publish(&channel, &encoded.message).await {
                    Ok(()) => {
                        metrics.record_published();
                        debug!("Published {} event ({} entries)", event.command(), event.len());
                    }
                    Err(e) => {
                        metrics.record_publish_failure();
                        error!("Failed to publish {} event: {}", event.command(), e);
                    }
                }
            }
            Job::Flush(ack) => {
                let _ = ack.send(());
            }
            Job::Shutdown => break,
        }
    }

    info!("Event publisher stopped for channel '{}'", channel);
}
