//! Real-time channel manager for one server console session.
//!
//! DESIGN
//! ======
//! The manager is a small state machine over a single socket:
//!
//! ```text
//! Disconnected --connect()--> Handshaking --auth success--> Open
//!      ^                          |                           |
//!      |<-- daemon error / close -+                           | close (not intentional,
//!      |                                                      |        auto-reconnect on)
//!      |<----------- disconnect() ---- ReconnectScheduled <---+
//!                                           | timer fires
//!                                           +--> connect()
//! ```
//!
//! All connection state lives behind one mutex and is never held across an
//! await. Every handshake bumps a generation counter; socket pumps, token
//! refreshes and reconnect timers carry the generation they were started
//! under and do nothing once it is stale. `disconnect()` bumps it too, which
//! is how an in-flight handshake or a late close event is cancelled.
//!
//! The handshake outcome is a one-shot gate: whichever of auth success,
//! daemon error, socket close or `disconnect()` takes the sender first
//! settles the pending `connect()`; later signals find the slot empty.
//!
//! Listeners run synchronously on the pump task, in registration order,
//! before the next frame is read.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{ChannelEvent, CloseCode, EventKind, PowerAction, SocketFrame};
use super::socket::{Connector, Inbound, Outbound, ReconnectTimer, TokenProvider, TokioTimer, WsConnector};

/// First reconnect delay; doubles per attempt up to the configured cap.
pub const BASE_RECONNECT_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_millis(30_000);

// =============================================================================
// ERRORS & OPTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("websocket authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("websocket closed before authentication completed (code: {code}, reason: {})", reason_or_none(.reason))]
    ClosedBeforeAuth { code: u16, reason: String },
    #[error("websocket handshake aborted by disconnect")]
    Aborted,
    #[error("token provider failed: {0}")]
    Token(String),
    #[error("websocket connect failed: {0}")]
    Connect(String),
}

impl ChannelError {
    /// Close code reported when the socket closed mid-handshake, if it is one
    /// the daemon is known to use.
    #[must_use]
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::ClosedBeforeAuth { code, .. } => CloseCode::from_code(*code),
            _ => None,
        }
    }
}

fn reason_or_none(reason: &str) -> &str {
    if reason.is_empty() { "none" } else { reason }
}

#[derive(Clone, Debug)]
pub struct ChannelOptions {
    socket_url: String,
    origin: String,
    max_reconnect_delay: Duration,
    auto_reconnect: bool,
}

impl ChannelOptions {
    /// `socket_url` is the daemon endpoint handed out with the websocket
    /// credentials; `origin` is the panel URL sent as `Origin`.
    #[must_use]
    pub fn new(socket_url: impl Into<String>, origin: &str) -> Self {
        Self {
            socket_url: socket_url.into(),
            origin: origin.trim_end_matches('/').to_owned(),
            max_reconnect_delay: DEFAULT_MAX_RECONNECT_DELAY,
            auto_reconnect: true,
        }
    }

    #[must_use]
    pub fn max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    #[must_use]
    pub fn socket_url(&self) -> &str {
        &self.socket_url
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Backoff delay before reconnect attempt number `attempts` (zero-based).
#[must_use]
pub fn reconnect_delay(attempts: u32, max: Duration) -> Duration {
    1u32.checked_shl(attempts)
        .and_then(|factor| BASE_RECONNECT_DELAY.checked_mul(factor))
        .map_or(max, |delay| delay.min(max))
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Handshaking,
    Open,
    ReconnectScheduled,
}

/// Event handler. Identity (the `Arc` allocation) is what `on`/`off` compare.
pub type Listener = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(handler: F) -> Listener
where
    F: Fn(&ChannelEvent) + Send + Sync + 'static,
{
    Arc::new(handler)
}

type HandshakeGate = oneshot::Sender<Result<(), ChannelError>>;

struct ConnState {
    phase: ConnectionState,
    socket: Option<mpsc::UnboundedSender<Outbound>>,
    handshake: Option<HandshakeGate>,
    reconnect: Option<JoinHandle<()>>,
    attempts: u32,
    intentional_close: bool,
    generation: u64,
}

struct Inner {
    options: ChannelOptions,
    tokens: Arc<dyn TokenProvider>,
    connector: Arc<dyn Connector>,
    timer: Arc<dyn ReconnectTimer>,
    conn: Mutex<ConnState>,
    listeners: Mutex<BTreeMap<EventKind, Vec<Listener>>>,
}

/// Handle to one logical real-time connection. Clones share the connection.
#[derive(Clone)]
pub struct ChannelManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("socket_url", &self.inner.options.socket_url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ChannelManager {
    /// Manager over a real websocket with the tokio clock driving backoff.
    #[must_use]
    pub fn new(options: ChannelOptions, tokens: impl TokenProvider) -> Self {
        Self::with_collaborators(options, Arc::new(tokens), Arc::new(WsConnector), Arc::new(TokioTimer))
    }

    #[must_use]
    pub fn with_collaborators(
        options: ChannelOptions,
        tokens: Arc<dyn TokenProvider>,
        connector: Arc<dyn Connector>,
        timer: Arc<dyn ReconnectTimer>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                tokens,
                connector,
                timer,
                conn: Mutex::new(ConnState {
                    phase: ConnectionState::Disconnected,
                    socket: None,
                    handshake: None,
                    reconnect: None,
                    attempts: 0,
                    intentional_close: false,
                    generation: 0,
                }),
                listeners: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Open and authenticate the socket.
    ///
    /// Resolves once the daemon acknowledges the token. Returns `Ok(())`
    /// immediately when a socket already exists. When a handshake is already
    /// running this also returns `Ok(())`, before authentication; wait for
    /// `auth success` or poll [`ChannelManager::is_connected`].
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Token`] / [`ChannelError::Connect`] when the token or
    ///   socket cannot be obtained
    /// - [`ChannelError::AuthenticationFailed`] when the daemon rejects the token
    /// - [`ChannelError::ClosedBeforeAuth`] when the socket closes first
    /// - [`ChannelError::Aborted`] when `disconnect()` interrupts the handshake
    ///
    /// None of these schedule a reconnect.
    pub async fn connect(&self) -> Result<(), ChannelError> {
        let generation = {
            let mut conn = self.inner.conn();
            if conn.socket.is_some() || conn.phase == ConnectionState::Handshaking {
                return Ok(());
            }
            if let Some(timer) = conn.reconnect.take() {
                timer.abort();
            }
            conn.intentional_close = false;
            conn.phase = ConnectionState::Handshaking;
            conn.generation += 1;
            conn.generation
        };

        let token = match self.inner.tokens.token().await {
            Ok(token) => token,
            Err(error) => return Err(self.inner.abandon_handshake(generation, error)),
        };
        if !self.inner.is_current(generation) {
            return Err(ChannelError::Aborted);
        }

        let options = &self.inner.options;
        let socket = match self
            .inner
            .connector
            .open(&options.socket_url, &options.origin, &token)
            .await
        {
            Ok(socket) => socket,
            Err(error) => return Err(self.inner.abandon_handshake(generation, error)),
        };

        let (gate_tx, gate_rx) = oneshot::channel();
        {
            let mut conn = self.inner.conn();
            if conn.generation != generation {
                let _ = socket.outgoing.send(Outbound::close(CloseCode::Normal));
                return Err(ChannelError::Aborted);
            }
            conn.socket = Some(socket.outgoing.clone());
            conn.handshake = Some(gate_tx);
        }

        debug!(url = %options.socket_url, "socket open, sending auth");
        let _ = socket
            .outgoing
            .send(Outbound::Text(SocketFrame::auth(&token).to_json()));
        tokio::spawn(pump(Arc::clone(&self.inner), generation, socket.incoming));

        gate_rx.await.unwrap_or(Err(ChannelError::Aborted))
    }

    /// Close the socket, cancel any armed reconnect and stay disconnected.
    ///
    /// A handshake still in flight resolves with [`ChannelError::Aborted`].
    pub fn disconnect(&self) {
        let mut conn = self.inner.conn();
        conn.intentional_close = true;
        if let Some(timer) = conn.reconnect.take() {
            timer.abort();
        }
        if let Some(socket) = conn.socket.take() {
            let _ = socket.send(Outbound::close(CloseCode::Normal));
        }
        if let Some(gate) = conn.handshake.take() {
            let _ = gate.send(Err(ChannelError::Aborted));
        }
        conn.attempts = 0;
        conn.generation += 1;
        if conn.phase != ConnectionState::Disconnected {
            info!(url = %self.inner.options.socket_url, "channel disconnected");
        }
        conn.phase = ConnectionState::Disconnected;
    }

    /// Send a console command. Dropped unless the channel is open.
    pub fn send_command(&self, command: &str) {
        self.inner.send_when_open(&SocketFrame::command(command));
    }

    /// Send a power signal. Dropped unless the channel is open.
    pub fn send_power_action(&self, action: PowerAction) {
        self.inner.send_when_open(&SocketFrame::power(action));
    }

    #[must_use]
    pub fn options(&self) -> &ChannelOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.conn().phase
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.conn().attempts
    }

    // ===== LISTENERS =====

    /// Register `listener` for `kind`. Registering the same listener twice
    /// for one kind has no effect.
    pub fn on(&self, kind: EventKind, listener: &Listener) -> &Self {
        let mut registry = self.inner.listeners();
        let handlers = registry.entry(kind).or_default();
        if !handlers.iter().any(|existing| Arc::ptr_eq(existing, listener)) {
            handlers.push(Arc::clone(listener));
        }
        self
    }

    /// Unregister `listener` from `kind`.
    pub fn off(&self, kind: EventKind, listener: &Listener) -> &Self {
        let mut registry = self.inner.listeners();
        if let Some(handlers) = registry.get_mut(&kind) {
            handlers.retain(|existing| !Arc::ptr_eq(existing, listener));
            if handlers.is_empty() {
                registry.remove(&kind);
            }
        }
        self
    }

    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.listeners().get(&kind).map_or(0, Vec::len)
    }

    /// Whether `kind` currently has a slot in the registry.
    #[must_use]
    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.inner.listeners().contains_key(&kind)
    }
}

// =============================================================================
// SOCKET PUMP
// =============================================================================

async fn pump(inner: Arc<Inner>, generation: u64, mut incoming: mpsc::UnboundedReceiver<Inbound>) {
    while let Some(inbound) = incoming.recv().await {
        match inbound {
            Inbound::Text(raw) => inner.handle_frame(generation, &raw),
            Inbound::Closed { code, reason } => {
                inner.handle_close(generation, code, reason);
                return;
            }
        }
    }
    inner.handle_close(generation, CloseCode::AbnormalClosure.code(), String::new());
}

impl Inner {
    fn conn(&self) -> MutexGuard<'_, ConnState> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, BTreeMap<EventKind, Vec<Listener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.conn().generation == generation
    }

    /// Reset after a handshake that never got a socket. A stale attempt
    /// reports `Aborted` instead of its own error.
    fn abandon_handshake(&self, generation: u64, error: ChannelError) -> ChannelError {
        let mut conn = self.conn();
        if conn.generation != generation {
            return ChannelError::Aborted;
        }
        conn.phase = ConnectionState::Disconnected;
        error
    }

    fn send_when_open(&self, frame: &SocketFrame) {
        let conn = self.conn();
        if conn.phase != ConnectionState::Open {
            debug!(event = %frame.event, "channel not open, frame dropped");
            return;
        }
        if let Some(socket) = &conn.socket {
            let _ = socket.send(Outbound::Text(frame.to_json()));
        }
    }

    fn handle_frame(self: &Arc<Self>, generation: u64, raw: &str) {
        if !self.is_current(generation) {
            return;
        }
        let Some(frame) = SocketFrame::parse(raw) else {
            debug!("dropping unparsable frame");
            return;
        };
        let Some(event) = ChannelEvent::from_frame(&frame) else {
            debug!(event = %frame.event, "dropping unrecognised frame");
            return;
        };

        match &event {
            ChannelEvent::AuthSuccess => self.complete_handshake(generation),
            ChannelEvent::DaemonError(message) => self.reject_handshake(generation, message),
            ChannelEvent::TokenExpiring => self.refresh_token(generation),
            _ => {}
        }
        self.dispatch(&event);
    }

    fn dispatch(&self, event: &ChannelEvent) {
        let handlers = self.listeners().get(&event.kind()).cloned();
        for handler in handlers.into_iter().flatten() {
            handler(event);
        }
    }

    fn complete_handshake(&self, generation: u64) {
        let mut conn = self.conn();
        if conn.generation != generation {
            return;
        }
        conn.phase = ConnectionState::Open;
        conn.attempts = 0;
        if let Some(gate) = conn.handshake.take() {
            info!(url = %self.options.socket_url, "channel authenticated");
            let _ = gate.send(Ok(()));
        }
    }

    /// A daemon error only matters while the handshake gate is pending.
    fn reject_handshake(&self, generation: u64, message: &str) {
        let mut conn = self.conn();
        if conn.generation != generation {
            return;
        }
        let Some(gate) = conn.handshake.take() else {
            return;
        };
        if let Some(socket) = conn.socket.take() {
            let _ = socket.send(Outbound::close(CloseCode::Normal));
        }
        conn.phase = ConnectionState::Disconnected;
        conn.generation += 1;
        let _ = gate.send(Err(ChannelError::AuthenticationFailed(message.to_owned())));
    }

    /// Fetch a fresh token and re-authenticate on the current socket.
    fn refresh_token(self: &Arc<Self>, generation: u64) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let token = match inner.tokens.token().await {
                Ok(token) => token,
                Err(error) => {
                    warn!(%error, "token refresh failed");
                    return;
                }
            };
            let conn = inner.conn();
            if conn.generation != generation {
                return;
            }
            if let Some(socket) = &conn.socket {
                debug!("re-sending auth with refreshed token");
                let _ = socket.send(Outbound::Text(SocketFrame::auth(&token).to_json()));
            }
        });
    }

    fn handle_close(self: &Arc<Self>, generation: u64, code: u16, reason: String) {
        let mut conn = self.conn();
        if conn.generation != generation {
            return;
        }
        conn.socket = None;

        if let Some(gate) = conn.handshake.take() {
            conn.phase = ConnectionState::Disconnected;
            let _ = gate.send(Err(ChannelError::ClosedBeforeAuth { code, reason }));
            return;
        }

        info!(code, reason = %reason, "channel closed");
        if !conn.intentional_close && self.options.auto_reconnect {
            self.schedule_reconnect(&mut conn);
        } else {
            conn.phase = ConnectionState::Disconnected;
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, conn: &mut ConnState) {
        let delay = reconnect_delay(conn.attempts, self.options.max_reconnect_delay);
        conn.attempts = conn.attempts.saturating_add(1);
        conn.phase = ConnectionState::ReconnectScheduled;
        let generation = conn.generation;
        info!(attempt = conn.attempts, delay_ms = delay.as_millis(), "reconnect scheduled");

        let inner = Arc::clone(self);
        conn.reconnect = Some(tokio::spawn(async move {
            inner.timer.sleep(delay).await;
            {
                let mut conn = inner.conn();
                if conn.generation != generation || conn.intentional_close {
                    return;
                }
                conn.reconnect = None;
            }
            let manager = ChannelManager { inner };
            if let Err(error) = manager.connect().await {
                warn!(%error, "reconnect attempt failed");
            }
        }));
    }
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
