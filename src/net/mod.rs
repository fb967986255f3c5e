//! Network layer: the REST transport engine and the real-time channel.
//!
//! - [`api`] turns a [`ClientConfig`](crate::config::ClientConfig) into
//!   authenticated REST calls and classifies failures.
//! - [`types`] holds query options, envelopes, pagination and the
//!   rate-limit snapshot.
//! - [`events`] is the socket wire model.
//! - [`socket`] defines the seams the channel manager depends on.
//! - [`channel`] is the connection state machine itself.

pub mod api;
pub mod channel;
pub mod events;
pub mod socket;
pub mod types;
