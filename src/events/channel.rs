//! Event channel implementation using crossbeam-channel.
//!
//! Lets the vault report progress to whatever front end drives it without
//! knowing what that front end is. A vault opened without a listener holds a
//! detached sender and never allocates a channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sends events from the vault and its hashing workers.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Send an event. Detached senders and dropped receivers discard it.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }

    /// Whether a channel is attached at all.
    ///
    /// Callers check this before building events that are costly to make,
    /// such as one progress event per hashed file.
    pub fn is_listening(&self) -> bool {
        self.inner.is_some()
    }
}

/// Receives events from the vault.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything queued so far, without blocking
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Constructor for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender {
                inner: Some(sender),
            },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender with no channel behind it.
pub fn null_sender() -> EventSender {
    EventSender::default()
}
