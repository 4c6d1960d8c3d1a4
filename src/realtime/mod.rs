//! Realtime Layer
//!
//! Change notifications for the task collection. The transport belongs to the
//! platform; this layer only parses payloads and manages subscription
//! lifetimes.

mod event;
mod hub;
mod source;

pub use event::{payload_for, ChangeEvent, ChangeKind, EventError};
pub use hub::ChangeHub;
pub use source::{channel_name, ChangeEventSource, Subscription};
