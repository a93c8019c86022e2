//! Event channel built on crossbeam-channel.
//!
//! Workers on the rayon pool publish progress through cloned
//! [`EventSender`]s; the CLI drains the [`EventReceiver`] on its own thread.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Cloneable, thread-safe publishing end
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Publish an event. A dropped receiver just means nobody is listening.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Subscribing end
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event, `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Create an unbounded channel; events are small and workers must
    /// never block on a slow terminal
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone, for runs without progress output
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
