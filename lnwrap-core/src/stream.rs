//! # Stream Adapter
//!
//! Adapts a push-based server stream of raw wire items into the same
//! validated, classified shape as unary calls. Each raw item is resolved
//! against the [`TypeRegistry`], decoded and (optionally) validated; raw
//! errors pass through the status classifier.
//!
//! The adapter is an Open/Completed/Errored state machine: item events are
//! legal only while open, the two terminal transitions are mutually
//! exclusive, and exactly one terminal event is ever delivered. A mid-stream
//! validation failure becomes the stream's single terminal error; the stream
//! never skips a bad item and continues.
//!
//! [`spawn_subscription`] pumps a raw transport stream through an adapter
//! into a bounded channel, handing the consumer a [`Subscription`] with an
//! explicit cancel operation. Decode, validate and classify all run on the
//! pump task; a full channel therefore blocks further delivery, which is the
//! only backpressure mechanism present.

use crate::client::WireMessage;
use crate::message::TypedMessage;
use crate::registry::TypeRegistry;
use crate::status::{self, RpcFailure};
use crate::validation::{self, ValidationError};
use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Default bound of the subscription event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// One event of an adapted stream.
#[derive(Debug)]
pub enum StreamEvent {
    /// The next decoded (and validated, when enabled) message.
    Item(TypedMessage),
    /// The single terminal error of the stream.
    Error(RpcFailure),
    /// Successful stream completion.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdapterState {
    Open,
    Completed,
    Errored,
}

/// The decode + validate + classify pipeline applied to each raw stream
/// input, together with the terminal-event bookkeeping.
pub struct StreamAdapter {
    registry: Arc<TypeRegistry>,
    perform_validation: bool,
    state: AdapterState,
}

impl StreamAdapter {
    pub fn new(registry: Arc<TypeRegistry>, perform_validation: bool) -> Self {
        Self {
            registry,
            perform_validation,
            state: AdapterState::Open,
        }
    }

    /// True once a terminal event has been produced.
    pub fn is_terminal(&self) -> bool {
        self.state != AdapterState::Open
    }

    /// Processes the next raw item. Returns the event to deliver, or `None`
    /// if the stream already terminated.
    pub fn on_item(&mut self, item: WireMessage) -> Option<StreamEvent> {
        if self.is_terminal() {
            warn!(type_name = %item.type_name, "dropping item received after terminal event");
            return None;
        }
        match self.registry.construct(&item.type_name, &item.body) {
            Ok(message) => {
                debug!(message = %message.message_name(), "received streamed message");
                if self.perform_validation {
                    let result = validation::validate(&message);
                    if !result.is_valid() {
                        self.state = AdapterState::Errored;
                        let error = ValidationError::new(result);
                        return Some(StreamEvent::Error(RpcFailure::client(
                            format!(
                                "streamed message '{}' failed validation",
                                message.message_name()
                            ),
                            Box::new(error),
                        )));
                    }
                }
                Some(StreamEvent::Item(message))
            }
            Err(error) => {
                self.state = AdapterState::Errored;
                Some(StreamEvent::Error(RpcFailure::client(
                    format!("could not decode streamed message of type '{}'", item.type_name),
                    Box::new(error),
                )))
            }
        }
    }

    /// Processes a raw transport error, classifying it into the stream's
    /// terminal error.
    pub fn on_error(&mut self, raw: tonic::Status) -> Option<StreamEvent> {
        if self.is_terminal() {
            warn!(code = ?raw.code(), "dropping error received after terminal event");
            return None;
        }
        self.state = AdapterState::Errored;
        Some(StreamEvent::Error(status::classify(raw)))
    }

    /// Processes the raw completion notification.
    pub fn on_completed(&mut self) -> Option<StreamEvent> {
        if self.is_terminal() {
            warn!("dropping completion received after terminal event");
            return None;
        }
        self.state = AdapterState::Completed;
        debug!("stream completed");
        Some(StreamEvent::Completed)
    }
}

/// Handle to a running subscription: an event receiver plus an explicit
/// cancel operation.
///
/// Dropping the subscription also stops the pump, since the event channel
/// closes.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<StreamEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

impl Subscription {
    /// Receives the next stream event. Returns `None` once the pump has
    /// stopped and all buffered events were consumed.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Cancels the subscription. Events already buffered remain readable;
    /// nothing further is pumped.
    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            let _ = token.send(());
        }
    }

    /// Converts the handle into a plain `Stream` of events.
    pub fn into_stream(self) -> ReceiverStream<StreamEvent> {
        ReceiverStream::new(self.events)
    }
}

/// Spawns a pump task feeding `raw` through `adapter` into a bounded
/// channel of [`DEFAULT_EVENT_CAPACITY`] events.
pub fn spawn_subscription<S>(raw: S, adapter: StreamAdapter) -> Subscription
where
    S: Stream<Item = Result<WireMessage, tonic::Status>> + Send + 'static,
{
    spawn_subscription_with_capacity(raw, adapter, DEFAULT_EVENT_CAPACITY)
}

/// Like [`spawn_subscription`] with an explicit channel bound.
pub fn spawn_subscription_with_capacity<S>(
    raw: S,
    mut adapter: StreamAdapter,
    capacity: usize,
) -> Subscription
where
    S: Stream<Item = Result<WireMessage, tonic::Status>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        tokio::pin!(raw);
        loop {
            let next = tokio::select! {
                _ = &mut cancel_rx => {
                    debug!("subscription cancelled");
                    break;
                }
                next = raw.next() => next,
            };
            let event = match next {
                Some(Ok(item)) => adapter.on_item(item),
                Some(Err(raw_error)) => adapter.on_error(raw_error),
                None => adapter.on_completed(),
            };
            let terminal = adapter.is_terminal();
            if let Some(event) = event {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            if terminal {
                break;
            }
        }
    });

    Subscription {
        events: rx,
        cancel: Some(cancel_tx),
    }
}
