//! Push-event subscription
//!
//! The backend pushes inbound frames on a single channel, independent of
//! any pending request. [`EventBridge`] owns at most one subscription to
//! that channel at a time: subscribing again always releases the prior
//! forwarding task first, so no inbound frame can be delivered to the
//! session twice.

use async_channel::Receiver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::bridge::BackendEvent;

/// Message delivered to the session's owning task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Inbound device data pushed by a backend listener
    Inbound(Vec<u8>),
}

/// Handle for one active push subscription
struct Subscription {
    task: JoinHandle<()>,
}

/// Owner of the single backend push-channel subscription
pub struct EventBridge {
    events: Receiver<BackendEvent>,
    subscription: Option<Subscription>,
}

impl EventBridge {
    /// Wrap the backend's push-event receiver. No forwarding happens until
    /// [`subscribe`](Self::subscribe) is called.
    pub fn new(events: Receiver<BackendEvent>) -> Self {
        Self {
            events,
            subscription: None,
        }
    }

    /// Start forwarding inbound frames to `tx`.
    ///
    /// Any prior subscription is released first; re-initializing never
    /// leaves two forwarders on the same channel.
    pub fn subscribe(&mut self, tx: mpsc::UnboundedSender<SessionEvent>) {
        self.release();

        let rx = self.events.clone();
        let task = tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                match event {
                    BackendEvent::InboundFrame { data } => {
                        if tx.send(SessionEvent::Inbound(data)).is_err() {
                            debug!("Session event receiver dropped, stopping forwarder");
                            break;
                        }
                    }
                }
            }
            debug!("Backend push channel closed");
        });

        self.subscription = Some(Subscription { task });
    }

    /// Stop the forwarding task, if any
    pub fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.task.abort();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.release();
    }
}
