//! Event channel built on crossbeam-channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sending half handed to engine operations. Cheap to clone.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event. A dropped receiver is not an error: progress is optional.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half held by the UI layer
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender whose receiver is already gone
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ApplyEvent, ScanEvent};
    use std::thread;

    #[test]
    fn events_cross_threads_in_order() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Scan(ScanEvent::Completed {
                total_files: 3,
                warnings: 1,
            }));
            sender.send(Event::Apply(ApplyEvent::Started { total_moves: 3 }));
        });
        handle.join().unwrap();

        let received: Vec<Event> = receiver.iter().collect();
        assert_eq!(received.len(), 2);
        assert!(matches!(
            received[0],
            Event::Scan(ScanEvent::Completed { total_files: 3, .. })
        ));
    }

    #[test]
    fn null_sender_does_not_panic() {
        null_sender().send(Event::Apply(ApplyEvent::Started { total_moves: 0 }));
    }
}
