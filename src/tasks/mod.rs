//! Background Tasks Module
//!
//! Workers each map instance runs for its whole lifetime.
//!
//! # Tasks
//! - Event publisher: sends local changes to the map channel in FIFO order
//! - Event subscriber: listens on the map channel and refreshes the local cache

mod publisher;
mod subscriber;

pub use publisher::EventPublisher;
pub use subscriber::{apply_event, EventSubscriber};
