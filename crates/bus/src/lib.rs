//! RWA Guard Alert Bus - In-process async alert distribution
//!
//! Every verification that recommends an action other than `none` publishes
//! one [`OwnershipAlert`]. Delivery is fire-and-forget over a tokio
//! broadcast channel: no acknowledgment, no replay, and publishing with no
//! listener attached is not an error. Downstream enforcement (trading pause,
//! token burn, compliance notification) attaches through [`AlertSubscriber`].

pub mod channel;
pub mod error;
pub mod event;
pub mod subscriber;

pub use channel::AlertPublisher;
pub use error::BusError;
pub use event::OwnershipAlert;
pub use subscriber::{spawn_subscriber, AlertSubscriber, LoggingAlertSubscriber};
