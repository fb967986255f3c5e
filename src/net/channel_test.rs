use super::*;
use crate::net::events::NetworkStats;
use crate::net::socket::SocketHandle;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio::time::timeout;

const SOCKET_URL: &str = "wss://node.example:8080/api/servers/abc/ws";
const STATS_JSON: &str = r#"{"memory_bytes":512,"memory_limit_bytes":1024,"cpu_absolute":3.5,"network":{"rx_bytes":1,"tx_bytes":2},"uptime":10,"state":"running","disk_bytes":64}"#;

// =============================================================================
// FAKES
// =============================================================================

/// The daemon side of one opened socket.
struct FakeSocket {
    url: String,
    origin: String,
    token: String,
    frames: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<Inbound>,
}

impl FakeSocket {
    async fn next_outbound(&mut self) -> Outbound {
        timeout(Duration::from_millis(500), self.frames.recv())
            .await
            .expect("outbound frame timed out")
            .expect("socket writer dropped")
    }

    async fn next_text(&mut self) -> String {
        match self.next_outbound().await {
            Outbound::Text(text) => text,
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    async fn assert_silent(&mut self) {
        let next = timeout(Duration::from_millis(80), self.frames.recv()).await;
        assert!(!matches!(next, Ok(Some(_))), "expected no outbound frame, got {next:?}");
    }

    fn push(&self, raw: &str) {
        self.events
            .send(Inbound::Text(raw.to_owned()))
            .expect("pump should be running");
    }

    fn close(&self, code: u16, reason: &str) {
        let _ = self.events.send(Inbound::Closed {
            code,
            reason: reason.to_owned(),
        });
    }
}

struct FakeConnector {
    sockets: mpsc::UnboundedSender<FakeSocket>,
}

#[async_trait::async_trait]
impl Connector for FakeConnector {
    async fn open(&self, url: &str, origin: &str, token: &str) -> Result<SocketHandle, ChannelError> {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        self.sockets
            .send(FakeSocket {
                url: url.to_owned(),
                origin: origin.to_owned(),
                token: token.to_owned(),
                frames: out_rx,
                events: in_tx,
            })
            .map_err(|_| ChannelError::Connect("test harness gone".into()))?;
        Ok(SocketHandle {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}

/// Records every requested delay and sleeps until `fire()`.
struct ManualTimer {
    delays: mpsc::UnboundedSender<Duration>,
    fire: Notify,
}

impl ManualTimer {
    fn fire(&self) {
        self.fire.notify_one();
    }
}

#[async_trait::async_trait]
impl ReconnectTimer for ManualTimer {
    async fn sleep(&self, delay: Duration) {
        let _ = self.delays.send(delay);
        self.fire.notified().await;
    }
}

/// Hands out `token-1`, `token-2`, ...
#[derive(Default)]
struct CountingTokens {
    issued: AtomicUsize,
}

impl CountingTokens {
    fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenProvider for CountingTokens {
    async fn token(&self) -> Result<String, ChannelError> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{n}"))
    }
}

struct Harness {
    manager: ChannelManager,
    sockets: mpsc::UnboundedReceiver<FakeSocket>,
    delays: mpsc::UnboundedReceiver<Duration>,
    timer: Arc<ManualTimer>,
    tokens: Arc<CountingTokens>,
}

impl Harness {
    fn new() -> Self {
        Self::with_tokens_and_options(None, ChannelOptions::new(SOCKET_URL, "https://panel.example/"))
    }

    fn with_tokens_and_options(tokens: Option<Arc<dyn TokenProvider>>, options: ChannelOptions) -> Self {
        let (socket_tx, sockets) = mpsc::unbounded_channel();
        let (delay_tx, delays) = mpsc::unbounded_channel();
        let timer = Arc::new(ManualTimer {
            delays: delay_tx,
            fire: Notify::new(),
        });
        let counting = Arc::new(CountingTokens::default());
        let provider = tokens.unwrap_or_else(|| Arc::clone(&counting) as Arc<dyn TokenProvider>);
        let manager = ChannelManager::with_collaborators(
            options,
            provider,
            Arc::new(FakeConnector { sockets: socket_tx }),
            Arc::clone(&timer) as Arc<dyn ReconnectTimer>,
        );
        Self {
            manager,
            sockets,
            delays,
            timer,
            tokens: counting,
        }
    }

    fn start_connect(&self) -> JoinHandle<Result<(), ChannelError>> {
        let manager = self.manager.clone();
        tokio::spawn(async move { manager.connect().await })
    }

    async fn next_socket(&mut self) -> FakeSocket {
        timeout(Duration::from_millis(500), self.sockets.recv())
            .await
            .expect("socket open timed out")
            .expect("connector dropped")
    }

    async fn assert_no_socket(&mut self) {
        assert!(
            timeout(Duration::from_millis(80), self.sockets.recv()).await.is_err(),
            "expected no socket to be opened"
        );
    }

    async fn next_delay(&mut self) -> Duration {
        timeout(Duration::from_millis(500), self.delays.recv())
            .await
            .expect("reconnect delay timed out")
            .expect("timer dropped")
    }

    async fn assert_no_delay(&mut self) {
        assert!(
            timeout(Duration::from_millis(80), self.delays.recv()).await.is_err(),
            "expected no reconnect timer"
        );
    }

    /// Run a full handshake and hand back the open socket.
    async fn open(&mut self) -> FakeSocket {
        let pending = self.start_connect();
        let mut socket = self.next_socket().await;
        let auth = socket.next_text().await;
        assert!(auth.starts_with(r#"{"event":"auth","args":["token-"#), "{auth}");
        socket.push(r#"{"event":"auth success"}"#);
        join(pending).await.expect("handshake should succeed");
        socket
    }
}

async fn join<T>(handle: JoinHandle<T>) -> T {
    timeout(Duration::from_millis(500), handle)
        .await
        .expect("task timed out")
        .expect("task panicked")
}

async fn wait_until(check: impl Fn() -> bool) {
    for _ in 0..50 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true");
}

/// Listener that forwards every event it sees.
fn forwarding() -> (Listener, mpsc::UnboundedReceiver<ChannelEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = listener(move |event: &ChannelEvent| {
        let _ = tx.send(event.clone());
    });
    (handler, rx)
}

async fn recv_event(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("event timed out")
        .expect("listener dropped")
}

// =============================================================================
// HANDSHAKE
// =============================================================================

#[tokio::test]
async fn connect_sends_auth_and_resolves_on_auth_success() {
    let mut harness = Harness::new();
    let pending = harness.start_connect();

    let mut socket = harness.next_socket().await;
    assert_eq!(socket.url, SOCKET_URL);
    assert_eq!(socket.origin, "https://panel.example");
    assert_eq!(socket.token, "token-1");
    assert_eq!(socket.next_text().await, r#"{"event":"auth","args":["token-1"]}"#);
    assert_eq!(harness.manager.state(), ConnectionState::Handshaking);

    socket.push(r#"{"event":"auth success"}"#);
    join(pending).await.expect("handshake should succeed");

    assert_eq!(harness.manager.state(), ConnectionState::Open);
    assert!(harness.manager.is_connected());
    assert_eq!(harness.manager.reconnect_attempts(), 0);
}

#[tokio::test]
async fn daemon_error_rejects_handshake_without_reconnect() {
    let mut harness = Harness::new();
    let (errors, mut seen) = forwarding();
    harness.manager.on(EventKind::DaemonError, &errors);

    let pending = harness.start_connect();
    let mut socket = harness.next_socket().await;
    socket.next_text().await;
    socket.push(r#"{"event":"daemon error","args":["invalid token"]}"#);

    let result = join(pending).await;
    assert_eq!(result, Err(ChannelError::AuthenticationFailed("invalid token".into())));
    assert_eq!(
        recv_event(&mut seen).await,
        ChannelEvent::DaemonError("invalid token".into())
    );
    assert_eq!(socket.next_outbound().await, Outbound::close(CloseCode::Normal));
    assert_eq!(harness.manager.state(), ConnectionState::Disconnected);

    socket.close(1000, "");
    harness.assert_no_delay().await;
}

#[tokio::test]
async fn close_before_auth_rejects_without_reconnect() {
    let mut harness = Harness::new();
    let pending = harness.start_connect();
    let mut socket = harness.next_socket().await;
    socket.next_text().await;
    socket.close(4001, "");

    let error = join(pending).await.expect_err("handshake should fail");
    assert_eq!(
        error,
        ChannelError::ClosedBeforeAuth {
            code: 4001,
            reason: String::new()
        }
    );
    assert_eq!(error.close_code(), Some(CloseCode::AuthenticationFailed));
    assert!(error.to_string().contains("code: 4001, reason: none"));
    assert_eq!(harness.manager.state(), ConnectionState::Disconnected);
    harness.assert_no_delay().await;
}

#[tokio::test]
async fn token_provider_failure_is_returned_from_connect() {
    let failing: Arc<dyn TokenProvider> =
        Arc::new(|| async { Err::<String, _>(ChannelError::Token("no credentials".into())) });
    let mut harness = Harness::with_tokens_and_options(
        Some(failing),
        ChannelOptions::new(SOCKET_URL, "https://panel.example"),
    );

    let result = harness.manager.connect().await;
    assert_eq!(result, Err(ChannelError::Token("no credentials".into())));
    assert_eq!(harness.manager.state(), ConnectionState::Disconnected);
    harness.assert_no_socket().await;
}

#[tokio::test]
async fn connect_is_a_no_op_while_a_socket_exists() {
    let mut harness = Harness::new();
    let _socket = harness.open().await;

    harness.manager.connect().await.expect("no-op connect");
    assert_eq!(harness.tokens.issued(), 1);
    harness.assert_no_socket().await;
}

#[tokio::test]
async fn connect_during_handshake_returns_before_auth() {
    let mut harness = Harness::new();
    let pending = harness.start_connect();
    let mut socket = harness.next_socket().await;
    socket.next_text().await;

    harness.manager.connect().await.expect("second connect");
    assert_eq!(harness.manager.state(), ConnectionState::Handshaking);
    assert!(!harness.manager.is_connected());
    harness.assert_no_socket().await;

    socket.push(r#"{"event":"auth success"}"#);
    join(pending).await.expect("first connect completes the handshake");
    assert!(harness.manager.is_connected());
    assert_eq!(harness.tokens.issued(), 1);
}

#[tokio::test]
async fn disconnect_during_handshake_aborts_connect() {
    let mut harness = Harness::new();
    let pending = harness.start_connect();
    let mut socket = harness.next_socket().await;
    socket.next_text().await;

    harness.manager.disconnect();

    assert_eq!(join(pending).await, Err(ChannelError::Aborted));
    assert_eq!(socket.next_outbound().await, Outbound::close(CloseCode::Normal));
    socket.push(r#"{"event":"auth success"}"#);
    socket.close(1000, "");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(harness.manager.state(), ConnectionState::Disconnected);
    harness.assert_no_delay().await;
}

#[tokio::test]
async fn disconnect_during_token_fetch_never_opens_a_socket() {
    let release = Arc::new(Notify::new());
    let gate = Arc::clone(&release);
    let slow: Arc<dyn TokenProvider> = Arc::new(move || {
        let gate = Arc::clone(&gate);
        async move {
            gate.notified().await;
            Ok::<_, ChannelError>("late-token".to_owned())
        }
    });
    let mut harness = Harness::with_tokens_and_options(
        Some(slow),
        ChannelOptions::new(SOCKET_URL, "https://panel.example"),
    );

    let pending = harness.start_connect();
    let manager = harness.manager.clone();
    wait_until(|| manager.state() == ConnectionState::Handshaking).await;
    harness.manager.disconnect();
    release.notify_one();

    assert_eq!(join(pending).await, Err(ChannelError::Aborted));
    harness.assert_no_socket().await;
}

// =============================================================================
// RECONNECT
// =============================================================================

#[test]
fn backoff_doubles_from_one_second_and_caps() {
    let max = DEFAULT_MAX_RECONNECT_DELAY;
    let delays: Vec<u128> = (0..6).map(|n| reconnect_delay(n, max).as_millis()).collect();
    assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000]);
    assert_eq!(reconnect_delay(31, max), max);
    assert_eq!(reconnect_delay(32, max), max);
    assert_eq!(reconnect_delay(u32::MAX, max), max);
    assert_eq!(
        reconnect_delay(3, Duration::from_millis(5000)),
        Duration::from_millis(5000)
    );
}

#[tokio::test]
async fn unexpected_close_schedules_reconnect_and_recovers() {
    let mut harness = Harness::new();
    let socket = harness.open().await;

    socket.close(1006, "");
    assert_eq!(harness.next_delay().await, Duration::from_millis(1000));
    assert_eq!(harness.manager.state(), ConnectionState::ReconnectScheduled);
    assert_eq!(harness.manager.reconnect_attempts(), 1);

    harness.timer.fire();
    let mut next = harness.next_socket().await;
    assert_eq!(next.next_text().await, r#"{"event":"auth","args":["token-2"]}"#);
    next.push(r#"{"event":"auth success"}"#);

    let manager = harness.manager.clone();
    wait_until(|| manager.is_connected()).await;
    assert_eq!(harness.manager.reconnect_attempts(), 0);
}

#[tokio::test]
async fn close_with_auto_reconnect_disabled_stays_disconnected() {
    let mut harness = Harness::with_tokens_and_options(
        None,
        ChannelOptions::new(SOCKET_URL, "https://panel.example").auto_reconnect(false),
    );
    let socket = harness.open().await;

    socket.close(1001, "going away");
    let manager = harness.manager.clone();
    wait_until(|| manager.state() == ConnectionState::Disconnected).await;
    harness.assert_no_delay().await;
}

#[tokio::test]
async fn disconnect_cancels_armed_reconnect() {
    let mut harness = Harness::new();
    let socket = harness.open().await;
    socket.close(1006, "");
    harness.next_delay().await;

    harness.manager.disconnect();
    assert_eq!(harness.manager.state(), ConnectionState::Disconnected);
    assert_eq!(harness.manager.reconnect_attempts(), 0);

    harness.timer.fire();
    harness.assert_no_socket().await;
}

#[tokio::test]
async fn close_after_disconnect_does_not_schedule() {
    let mut harness = Harness::new();
    let mut socket = harness.open().await;

    harness.manager.disconnect();
    assert_eq!(socket.next_outbound().await, Outbound::close(CloseCode::Normal));

    socket.close(1000, "");
    harness.assert_no_delay().await;
    assert_eq!(harness.manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn connect_after_disconnect_opens_a_fresh_socket() {
    let mut harness = Harness::new();
    let _first = harness.open().await;
    harness.manager.disconnect();

    let _second = harness.open().await;
    assert_eq!(harness.tokens.issued(), 2);
    assert!(harness.manager.is_connected());
}

// =============================================================================
// OPEN CHANNEL
// =============================================================================

#[tokio::test]
async fn commands_are_dropped_unless_open() {
    let mut harness = Harness::new();
    harness.manager.send_command("before connect");

    let pending = harness.start_connect();
    let mut socket = harness.next_socket().await;
    socket.next_text().await;
    harness.manager.send_command("during handshake");
    socket.assert_silent().await;

    socket.push(r#"{"event":"auth success"}"#);
    join(pending).await.expect("handshake should succeed");

    harness.manager.send_command("say hi");
    harness.manager.send_power_action(PowerAction::Restart);
    assert_eq!(
        socket.next_text().await,
        r#"{"event":"send command","args":["say hi"]}"#
    );
    assert_eq!(
        socket.next_text().await,
        r#"{"event":"set state","args":["restart"]}"#
    );

    harness.manager.disconnect();
    socket.next_outbound().await;
    harness.manager.send_command("after disconnect");
    socket.assert_silent().await;
}

#[tokio::test]
async fn token_expiring_reauthenticates_on_same_socket() {
    let mut harness = Harness::new();
    let (expiring, mut seen) = forwarding();
    harness.manager.on(EventKind::TokenExpiring, &expiring);
    let mut socket = harness.open().await;

    socket.push(r#"{"event":"token expiring"}"#);

    assert_eq!(recv_event(&mut seen).await, ChannelEvent::TokenExpiring);
    assert_eq!(socket.next_text().await, r#"{"event":"auth","args":["token-2"]}"#);
    assert_eq!(harness.manager.state(), ConnectionState::Open);
    harness.assert_no_socket().await;
}

#[tokio::test]
async fn malformed_stats_are_dropped_and_channel_stays_open() {
    let mut harness = Harness::new();
    let (stats, mut seen) = forwarding();
    harness.manager.on(EventKind::Stats, &stats);
    let socket = harness.open().await;

    socket.push(r#"{"event":"stats","args":["{not json"]}"#);
    socket.push(&SocketFrame::new("stats", vec![STATS_JSON.to_owned()]).to_json());

    let ChannelEvent::Stats(snapshot) = recv_event(&mut seen).await else {
        panic!("expected stats event");
    };
    assert_eq!(snapshot.memory_bytes, 512);
    assert!(harness.manager.is_connected());
}

#[tokio::test]
async fn partial_stats_reach_listeners() {
    let mut harness = Harness::new();
    let (stats, mut seen) = forwarding();
    harness.manager.on(EventKind::Stats, &stats);
    let socket = harness.open().await;

    socket.push(r#"{"event":"stats","args":["{\"state\":\"running\"}"]}"#);

    let ChannelEvent::Stats(snapshot) = recv_event(&mut seen).await else {
        panic!("expected stats event");
    };
    assert_eq!(snapshot.state, "running");
    assert_eq!(snapshot.memory_bytes, 0);
    assert_eq!(snapshot.network, NetworkStats::default());
}

#[tokio::test]
async fn unparsable_frames_are_dropped() {
    let mut harness = Harness::new();
    let (console, mut seen) = forwarding();
    harness.manager.on(EventKind::ConsoleOutput, &console);
    let socket = harness.open().await;

    socket.push("definitely not json");
    socket.push(r#"{"event":"console output","args":["ready"]}"#);

    assert_eq!(
        recv_event(&mut seen).await,
        ChannelEvent::ConsoleOutput("ready".into())
    );
    assert!(harness.manager.is_connected());
}

#[tokio::test]
async fn status_passes_power_state_through() {
    let mut harness = Harness::new();
    let (status, mut seen) = forwarding();
    harness.manager.on(EventKind::Status, &status);
    let socket = harness.open().await;

    socket.push(r#"{"event":"status","args":["stopping"]}"#);
    assert_eq!(recv_event(&mut seen).await, ChannelEvent::Status("stopping".into()));
}

// =============================================================================
// LISTENERS
// =============================================================================

#[tokio::test]
async fn listeners_run_in_registration_order_without_duplicates() {
    let mut harness = Harness::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let first_log = Arc::clone(&log);
    let first = listener(move |_: &ChannelEvent| first_log.lock().expect("log").push("first"));
    let second_log = Arc::clone(&log);
    let second = listener(move |_: &ChannelEvent| second_log.lock().expect("log").push("second"));
    let (done, mut seen) = forwarding();

    harness
        .manager
        .on(EventKind::ConsoleOutput, &first)
        .on(EventKind::ConsoleOutput, &second)
        .on(EventKind::ConsoleOutput, &first)
        .on(EventKind::ConsoleOutput, &done);
    assert_eq!(harness.manager.listener_count(EventKind::ConsoleOutput), 3);

    let socket = harness.open().await;
    socket.push(r#"{"event":"console output","args":["line"]}"#);
    recv_event(&mut seen).await;

    assert_eq!(*log.lock().expect("log"), vec!["first", "second"]);
}

#[test]
fn one_listener_can_serve_several_events() {
    let harness = Harness::new();
    let shared = listener(|_: &ChannelEvent| {});
    harness
        .manager
        .on(EventKind::InstallStarted, &shared)
        .on(EventKind::InstallCompleted, &shared);
    assert_eq!(harness.manager.listener_count(EventKind::InstallStarted), 1);
    assert_eq!(harness.manager.listener_count(EventKind::InstallCompleted), 1);
}

#[test]
fn removing_last_listener_frees_the_slot() {
    let harness = Harness::new();
    let a = listener(|_: &ChannelEvent| {});
    let b = listener(|_: &ChannelEvent| {});
    harness.manager.on(EventKind::DaemonMessage, &a).on(EventKind::DaemonMessage, &b);

    harness.manager.off(EventKind::DaemonMessage, &a);
    assert_eq!(harness.manager.listener_count(EventKind::DaemonMessage), 1);
    assert!(harness.manager.has_listeners(EventKind::DaemonMessage));

    harness.manager.off(EventKind::DaemonMessage, &b).off(EventKind::DaemonMessage, &b);
    assert!(!harness.manager.has_listeners(EventKind::DaemonMessage));
}

#[test]
fn options_trim_origin_and_default_backoff() {
    let options = ChannelOptions::new(SOCKET_URL, "https://panel.example///");
    assert_eq!(options.origin(), "https://panel.example");
    assert_eq!(options.socket_url(), SOCKET_URL);
    assert_eq!(options.max_reconnect_delay, Duration::from_secs(30));
    assert!(options.auto_reconnect);
}

// =============================================================================
// TUNGSTENITE CONNECTOR
// =============================================================================

mod live_socket {
    use super::*;
    use axum::Router;
    use axum::extract::WebSocketUpgrade;
    use axum::extract::ws::{CloseFrame, Message, WebSocket};
    use axum::http::HeaderMap;
    use axum::http::header::{AUTHORIZATION, ORIGIN};
    use axum::response::Response;
    use axum::routing::get;

    async fn upgrade(headers: HeaderMap, ws: WebSocketUpgrade) -> Response {
        let header = |name: axum::http::HeaderName| headers.get(name).and_then(|value| value.to_str().ok()).map(ToOwned::to_owned);
        let accepted = header(AUTHORIZATION).as_deref() == Some("Bearer good-token")
            && header(ORIGIN).as_deref() == Some("https://panel.example");
        ws.on_upgrade(move |socket| daemon(socket, accepted))
    }

    async fn daemon(mut socket: WebSocket, accepted: bool) {
        if !accepted {
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: 4001,
                    reason: "unauthorized".into(),
                })))
                .await;
            return;
        }
        while let Some(Ok(message)) = socket.recv().await {
            let Message::Text(text) = message else {
                continue;
            };
            let Some(frame) = SocketFrame::parse(text.as_str()) else {
                continue;
            };
            let reply = match frame.event.as_str() {
                "auth" => SocketFrame {
                    event: "auth success".into(),
                    args: None,
                },
                "send command" => SocketFrame::new(
                    "console output",
                    frame.first_arg().map(ToOwned::to_owned).into_iter().collect(),
                ),
                _ => continue,
            };
            if socket.send(Message::Text(reply.to_json().into())).await.is_err() {
                return;
            }
        }
    }

    async fn spawn_daemon() -> String {
        let tcp = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind daemon");
        let addr = tcp.local_addr().expect("daemon addr");
        tokio::spawn(async move {
            let _ = axum::serve(tcp, Router::new().route("/ws", get(upgrade))).await;
        });
        format!("ws://{addr}/ws")
    }

    fn manager(url: String, token: &'static str) -> ChannelManager {
        ChannelManager::new(ChannelOptions::new(url, "https://panel.example/"), move || async move {
            Ok::<_, ChannelError>(token.to_owned())
        })
    }

    #[tokio::test]
    async fn ws_connector_authenticates_and_round_trips_commands() {
        let url = spawn_daemon().await;
        let manager = manager(url, "good-token");
        let (console, mut seen) = forwarding();
        manager.on(EventKind::ConsoleOutput, &console);

        timeout(Duration::from_secs(2), manager.connect())
            .await
            .expect("connect timed out")
            .expect("handshake should succeed");
        manager.send_command("list");

        assert_eq!(recv_event(&mut seen).await, ChannelEvent::ConsoleOutput("list".into()));
        manager.disconnect();
    }

    #[tokio::test]
    async fn ws_connector_reports_close_before_auth() {
        let url = spawn_daemon().await;
        let manager = manager(url, "stale-token");

        let error = timeout(Duration::from_secs(2), manager.connect())
            .await
            .expect("connect timed out")
            .expect_err("handshake should fail");
        assert_eq!(
            error,
            ChannelError::ClosedBeforeAuth {
                code: 4001,
                reason: "unauthorized".into()
            }
        );
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }
}
