//! # Events Module
//!
//! Progress reporting for long-running operations.
//!
//! The engine's operations are synchronous and blocking; a caller that runs
//! them on a worker thread listens on the receiving end to keep its UI live.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let mut session = OrganizerSession::new(source).with_events(sender);
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Apply(ApplyEvent::Progress(p)) = event {
//!             println!("{}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! session.preview(folder);
//! session.apply();
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
