//! Cart pub/sub: `cart:update` and `cart:error` fanned out to every subscriber.

use shared::protocol::CartEvent;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventBus {
    events: broadcast::Sender<CartEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self { events }
    }

    /// Returns how many subscribers the event reached. Publishing with no
    /// subscribers is not an error.
    pub fn publish(&self, event: CartEvent) -> usize {
        let channel = event.channel();
        match self.events.send(event) {
            Ok(receivers) => {
                debug!(channel, receivers, "published cart event");
                receivers
            }
            Err(_) => {
                debug!(channel, "cart event published with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    /// Subscribes to a single channel (`cart:update` or `cart:error`).
    pub fn subscribe_channel(&self, channel: &'static str) -> ChannelSubscription {
        ChannelSubscription {
            channel,
            receiver: self.events.subscribe(),
        }
    }
}

pub struct ChannelSubscription {
    channel: &'static str,
    receiver: broadcast::Receiver<CartEvent>,
}

impl ChannelSubscription {
    /// Next event on this channel, or `None` once the bus is gone. A lagging
    /// subscriber skips what it missed.
    pub async fn recv(&mut self) -> Option<CartEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.channel() == self.channel => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = self.channel, skipped, "cart subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`ChannelSubscription::recv`].
    pub fn try_recv(&mut self) -> Option<CartEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.channel() == self.channel => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(channel = self.channel, skipped, "cart subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }
}
