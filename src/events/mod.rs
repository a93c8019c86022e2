//! # Events Module
//!
//! Progress reporting decoupled from presentation.
//!
//! The engine emits events through a channel so that the CLI (or any other
//! front end) can render progress without the engine knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Extract(ExtractEvent::Progress(p)) = event {
//!             println!("{}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! aggregator.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
