//! In-memory collaborators for driving the sync engine in tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use notiflow_shared::{
    ApiError, LoginResponse, RemoteNotification, ServerFrame, UserProfile, CLOSE_NORMAL,
};
use tokio::sync::{mpsc, watch, Semaphore};
use url::Url;

use crate::alerts::{AlertPermission, AlertSink};
use crate::api_client::FetchGateway;
use crate::error::{Result, SyncError};
use crate::session::Credential;
use crate::sync::SyncSnapshot;
use crate::ws::{
    CloseReason, ConnectionEvent, ConnectionId, ConnectionState, EventSink, Outbound, Transport,
    TransportEvent, WsHandle,
};

pub fn remote(id: &str, title: &str) -> RemoteNotification {
    RemoteNotification {
        id: Some(id.to_string()),
        title: title.to_string(),
        body: format!("{title} body"),
        category: None,
        payload: serde_json::Value::Null,
        created_at: None,
        read: false,
    }
}

pub fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: None,
    }
}

pub fn http_error(status: u16) -> ApiError {
    ApiError::Http {
        status,
        body: String::new(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct GatewayScript {
    logins: VecDeque<Result<LoginResponse, ApiError>>,
    profiles: VecDeque<Result<UserProfile, ApiError>>,
    lists: VecDeque<Result<Vec<RemoteNotification>, ApiError>>,
    failing_reads: HashSet<String>,
    failing_deletes: HashSet<String>,
    calls: Vec<String>,
}

/// Scripted gateway. Unscripted profile calls return `alice`, unscripted list
/// calls return an empty list.
#[derive(Default)]
pub struct FakeGateway {
    script: Mutex<GatewayScript>,
    delete_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_login(&self, result: Result<LoginResponse, ApiError>) {
        lock(&self.script).logins.push_back(result);
    }

    pub fn push_profile(&self, result: Result<UserProfile, ApiError>) {
        lock(&self.script).profiles.push_back(result);
    }

    pub fn push_list(&self, result: Result<Vec<RemoteNotification>, ApiError>) {
        lock(&self.script).lists.push_back(result);
    }

    pub fn fail_mark_read(&self, id: &str) {
        lock(&self.script).failing_reads.insert(id.to_string());
    }

    pub fn fail_delete(&self, id: &str) {
        lock(&self.script).failing_deletes.insert(id.to_string());
    }

    /// Hold every delete call until the returned semaphore gets a permit.
    pub fn hold_deletes(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.delete_gate) = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.script).calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        lock(&self.script)
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        lock(&self.script).calls.push(call);
    }
}

#[async_trait]
impl FetchGateway for FakeGateway {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.record(format!("login:{email}"));
        lock(&self.script)
            .logins
            .pop_front()
            .unwrap_or(Err(http_error(401)))
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.record("profile".to_string());
        lock(&self.script)
            .profiles
            .pop_front()
            .unwrap_or_else(|| Ok(profile("alice")))
    }

    async fn fetch_notifications(&self) -> Result<Vec<RemoteNotification>, ApiError> {
        self.record("list".to_string());
        lock(&self.script)
            .lists
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("mark_read:{id}"));
        if lock(&self.script).failing_reads.contains(id) {
            return Err(http_error(500));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete:{id}"));
        let gate = lock(&self.delete_gate).clone();
        if let Some(gate) = gate {
            let permit = gate.acquire().await.map_err(|e| ApiError::Network(e.to_string()))?;
            permit.forget();
        }
        if lock(&self.script).failing_deletes.contains(id) {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

struct FakeConnection {
    id: ConnectionId,
    credential: Option<String>,
    events: EventSink,
    state: watch::Sender<ConnectionState>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    sent: Vec<Outbound>,
}

/// Transport that hands out scripted connections. Tests drive each
/// connection's lifecycle by index, in the order `connect` was called.
#[derive(Default)]
pub struct FakeTransport {
    connections: Mutex<Vec<FakeConnection>>,
    refuse: Mutex<bool>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make subsequent `connect` calls fail outright.
    pub fn refuse_connections(&self, refuse: bool) {
        *lock(&self.refuse) = refuse;
    }

    pub fn connect_count(&self) -> usize {
        lock(&self.connections).len()
    }

    pub fn credential(&self, index: usize) -> Option<String> {
        lock(&self.connections)[index].credential.clone()
    }

    fn emit(&self, index: usize, state: Option<ConnectionState>, event: TransportEvent) {
        let connections = lock(&self.connections);
        let conn = &connections[index];
        if let Some(state) = state {
            conn.state.send_replace(state);
        }
        let _ = conn.events.send(ConnectionEvent {
            connection: conn.id,
            event,
        });
    }

    pub fn open(&self, index: usize) {
        self.emit(index, Some(ConnectionState::Open), TransportEvent::Connected);
    }

    pub fn push(&self, index: usize, frame: ServerFrame) {
        self.emit(index, None, TransportEvent::Message(frame));
    }

    pub fn drop_abnormally(&self, index: usize) {
        let reason = CloseReason::failure("connection reset");
        self.emit(
            index,
            Some(ConnectionState::Closed(reason.clone())),
            TransportEvent::Disconnected(reason),
        );
    }

    pub fn close_normally(&self, index: usize) {
        let reason = CloseReason::requested(CLOSE_NORMAL, "bye");
        self.emit(
            index,
            Some(ConnectionState::Closed(reason.clone())),
            TransportEvent::Disconnected(reason),
        );
    }

    /// Everything the engine has sent on connection `index` so far.
    pub fn sent(&self, index: usize) -> Vec<Outbound> {
        let mut connections = lock(&self.connections);
        let conn = &mut connections[index];
        while let Ok(outbound) = conn.outbound.try_recv() {
            conn.sent.push(outbound);
        }
        conn.sent.clone()
    }

    pub fn was_closed_normally(&self, index: usize) -> bool {
        self.sent(index)
            .iter()
            .any(|out| matches!(out, Outbound::Close { code, .. } if *code == CLOSE_NORMAL))
    }
}

impl Transport for FakeTransport {
    fn connect(
        &self,
        _endpoint: &Url,
        credential: Option<&Credential>,
        events: EventSink,
    ) -> Result<WsHandle> {
        let Some(credential) = credential else {
            return Err(SyncError::Unauthenticated);
        };
        if *lock(&self.refuse) {
            return Err(SyncError::Transport("connection refused".to_string()));
        }

        let mut connections = lock(&self.connections);
        let id = ConnectionId(connections.len() as u64);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        connections.push(FakeConnection {
            id,
            credential: Some(credential.expose().to_string()),
            events,
            state: state_tx,
            outbound: out_rx,
            sent: Vec::new(),
        });
        Ok(WsHandle::new(id, out_tx, state_rx))
    }
}

/// Alert sink that records what it was asked to show.
pub struct RecordingAlerts {
    permission: AlertPermission,
    shown: Mutex<Vec<String>>,
    requested: Mutex<bool>,
}

impl RecordingAlerts {
    pub fn new(permission: AlertPermission) -> Arc<Self> {
        Arc::new(Self {
            permission,
            shown: Mutex::new(Vec::new()),
            requested: Mutex::new(false),
        })
    }

    pub fn shown(&self) -> Vec<String> {
        lock(&self.shown).clone()
    }

    pub fn was_requested(&self) -> bool {
        *lock(&self.requested)
    }
}

impl AlertSink for RecordingAlerts {
    fn permission(&self) -> AlertPermission {
        self.permission
    }

    fn request_permission(&self) {
        *lock(&self.requested) = true;
    }

    fn show(&self, title: &str, _body: &str) {
        lock(&self.shown).push(title.to_string());
    }
}

/// Wait for a snapshot matching `predicate`, panicking after a minute.
pub async fn wait_until(
    rx: &mut watch::Receiver<SyncSnapshot>,
    predicate: impl FnMut(&SyncSnapshot) -> bool,
) -> SyncSnapshot {
    let found = match tokio::time::timeout(Duration::from_secs(60), rx.wait_for(predicate)).await {
        Ok(Ok(snapshot)) => Some(snapshot.clone()),
        Ok(Err(_)) => panic!("sync engine stopped while waiting"),
        Err(_) => None,
    };
    match found {
        Some(snapshot) => snapshot,
        None => panic!("timed out waiting for snapshot; last: {:?}", *rx.borrow()),
    }
}

/// Poll `check` until it holds. Each poll lets spawned tasks run.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition never held");
}
