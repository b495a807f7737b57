//! Change Hub
//!
//! Routes change events to open subscription channels. Every channel has
//! its own unbounded sender; a channel is removed when its
//! [`Subscription`] is dropped, so callers never need an explicit
//! unsubscribe.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::{ChangeEvent, ChannelSpec};

/// Unique identifier for an open channel
pub type ChannelId = Uuid;

/// Configuration for the change hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrently open channels
    pub max_channels: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { max_channels: 256 }
    }
}

struct ChannelHandle {
    spec: ChannelSpec,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

type ChannelMap = Arc<RwLock<HashMap<ChannelId, ChannelHandle>>>;

/// Fan-out point for change events
#[derive(Clone)]
pub struct ChangeHub {
    channels: ChannelMap,
    config: HubConfig,
}

impl ChangeHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Open a channel
    ///
    /// Fails once `max_channels` channels are open.
    pub fn open(&self, spec: ChannelSpec) -> Result<Subscription, HubError> {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if channels.len() >= self.config.max_channels {
            return Err(HubError::TooManyChannels(self.config.max_channels));
        }

        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();

        tracing::debug!(
            channel_id = %id,
            channel = %spec.name,
            table = %spec.table,
            "Channel opened"
        );

        channels.insert(
            id,
            ChannelHandle {
                spec: spec.clone(),
                sender,
            },
        );

        Ok(Subscription {
            id,
            spec,
            receiver,
            channels: Arc::clone(&self.channels),
        })
    }

    /// Deliver an event to every channel that accepts it
    ///
    /// Returns the number of channels the event reached.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let channels = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let mut sent_count = 0;
        for handle in channels.values() {
            if handle.spec.accepts(event) && handle.sender.send(event.clone()).is_ok() {
                sent_count += 1;
            }
        }

        tracing::trace!(
            table = %event.table,
            kind = %event.kind,
            row_id = %event.row_id,
            channels = sent_count,
            "Change published"
        );

        sent_count
    }

    /// Number of open channels
    pub fn channel_count(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

/// An open change channel
///
/// Dropping the subscription closes the channel.
pub struct Subscription {
    id: ChannelId,
    spec: ChannelSpec,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    channels: ChannelMap,
}

impl Subscription {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    /// Wait for the next event
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        tracing::debug!(channel_id = %self.id, channel = %self.spec.name, "Channel closed");
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("spec", &self.spec)
            .finish()
    }
}

/// Errors that can occur in the change hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many open channels (limit: {0})")]
    TooManyChannels(usize),
}
