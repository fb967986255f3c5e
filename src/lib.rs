//! # pelican
//!
//! Typed async client for the Pelican / Pterodactyl panel API.
//!
//! Two REST surfaces share one transport engine: [`PelicanApplication`]
//! for the administrative API (`/api/application`) and [`PelicanClient`]
//! for the self-service API (`/api/client`). A [`ChannelManager`] keeps an
//! authenticated websocket open to a server's daemon for console output,
//! stats and power control.

pub mod application;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod net;

#[cfg(test)]
pub(crate) mod test_support;

pub use application::PelicanApplication;
pub use client::PelicanClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiErrorKind, Error};
pub use net::api::{HttpClient, Mutation};
pub use net::channel::{
    ChannelError, ChannelManager, ChannelOptions, ConnectionState, Listener, listener,
};
pub use net::events::{ChannelEvent, CloseCode, EventKind, PowerAction, ServerStats};
pub use net::types::{Page, Pagination, RateLimit, RequestOptions};
