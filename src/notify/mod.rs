//! Notification-on-change subsystem.
//!
//! Watches committed task writes and pushes targeted events to the assigned
//! user's live connections. Three pieces: a pure [`classifier`] that decides
//! whether a write warrants a notification, a stateless [`dispatcher`] that
//! builds and serializes the event, and the [`observer`] hook the store's
//! write path calls after each commit.

pub mod classifier;
pub mod dispatcher;
pub mod observer;

pub use classifier::{MessageVariant, classify};
pub use observer::TaskObserver;
