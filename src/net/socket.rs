//! Collaborator seams of the channel manager.
//!
//! SYSTEM CONTEXT
//! ==============
//! The manager never touches a socket library directly. It asks a
//! [`Connector`] for a [`SocketHandle`] (a pair of unbounded channels), a
//! [`TokenProvider`] for credentials, and a [`ReconnectTimer`] for backoff
//! delays. Production wiring uses [`WsConnector`] (tokio-tungstenite),
//! closures returning tokens, and [`TokioTimer`]; tests inject fakes.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, ORIGIN};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing::debug;

use super::channel::ChannelError;
use super::events::CloseCode;

/// Frame the manager wants written to the socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

impl Outbound {
    #[must_use]
    pub fn close(code: CloseCode) -> Self {
        Self::Close {
            code: code.code(),
            reason: String::new(),
        }
    }
}

/// Something the socket reported. `Closed` is always the last item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Closed { code: u16, reason: String },
}

/// An open socket, seen as two channels.
pub struct SocketHandle {
    pub outgoing: mpsc::UnboundedSender<Outbound>,
    pub incoming: mpsc::UnboundedReceiver<Inbound>,
}

/// Opens sockets. A successful return means the socket is open.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn open(&self, url: &str, origin: &str, token: &str) -> Result<SocketHandle, ChannelError>;
}

/// Supplies a fresh token on every handshake and refresh.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn token(&self) -> Result<String, ChannelError>;
}

#[async_trait::async_trait]
impl<F, Fut> TokenProvider for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ChannelError>> + Send,
{
    async fn token(&self) -> Result<String, ChannelError> {
        (self)().await
    }
}

/// Waits out a reconnect delay.
#[async_trait::async_trait]
pub trait ReconnectTimer: Send + Sync + 'static {
    async fn sleep(&self, delay: Duration);
}

/// [`ReconnectTimer`] backed by the tokio clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;

#[async_trait::async_trait]
impl ReconnectTimer for TokioTimer {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

// =============================================================================
// TUNGSTENITE CONNECTOR
// =============================================================================

/// [`Connector`] over `tokio-tungstenite`.
///
/// The upgrade request carries `Authorization: Bearer <token>` and the panel
/// `Origin`, which the daemon checks before accepting the socket.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

#[async_trait::async_trait]
impl Connector for WsConnector {
    async fn open(&self, url: &str, origin: &str, token: &str) -> Result<SocketHandle, ChannelError> {
        let mut request = url
            .into_client_request()
            .map_err(|error| ChannelError::Connect(error.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|error| ChannelError::Connect(error.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        if !origin.is_empty() {
            let origin = HeaderValue::from_str(origin)
                .map_err(|error| ChannelError::Connect(error.to_string()))?;
            request.headers_mut().insert(ORIGIN, origin);
        }

        let (stream, _) = connect_async(request)
            .await
            .map_err(|error| ChannelError::Connect(error.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Inbound>();

        tokio::spawn(async move {
            while let Some(outbound) = out_rx.recv().await {
                let (message, last) = match outbound {
                    Outbound::Text(text) => (Message::text(text), false),
                    Outbound::Close { code, reason } => (
                        Message::Close(Some(CloseFrame {
                            code: code.into(),
                            reason: reason.into(),
                        })),
                        true,
                    ),
                };
                if sink.send(message).await.is_err() || last {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            let mut code = CloseCode::AbnormalClosure.code();
            let mut reason = String::new();
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(Inbound::Text(text.as_str().to_owned())).is_err() {
                            return;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        if let Some(frame) = frame {
                            code = frame.code.into();
                            reason = frame.reason.as_str().to_owned();
                        } else {
                            code = CloseCode::Normal.code();
                        }
                        break;
                    }
                    Ok(_) => {}
                    Err(error) => {
                        debug!(%error, "socket read failed");
                        break;
                    }
                }
            }
            let _ = in_tx.send(Inbound::Closed { code, reason });
        });

        Ok(SocketHandle {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}
