//! The sync engine actor.
//!
//! All engine state lives in one task. Each event (an intent from a
//! [`SyncHandle`], a finished REST call, a transport event, or a timer) is
//! handled to completion before the next one, and a fresh [`SyncSnapshot`] is
//! published after every event.
//!
//! Bootstrap runs `CheckingSession → LoadingProfile → LoadingNotifications →
//! Live`, and the push channel is only opened once the store has been seeded.
//! Bootstrap calls carry the bootstrap epoch and are discarded once a refresh
//! or logout starts a new one. Mutation confirmations carry the session epoch,
//! which only moves when the session ends or the signed-in user changes, so a
//! read or delete issued before a refresh still settles after it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use notiflow_shared::{
    ApiError, ClientFrame, LoginResponse, RemoteNotification, ServerFrame, UserProfile,
    CLOSE_NORMAL,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::alerts::{AlertPermission, AlertSink, NoopAlerts};
use crate::api_client::{ApiClient, FetchGateway};
use crate::config::{ClientConfig, ListFetchFailurePolicy};
use crate::error::{Result, SyncError};
use crate::session::{Credential, IdentityKey, SessionStore};
use crate::stores::{
    DeleteOutcome, MergeOutcome, Mutation, NotificationRecord, NotificationStore, ReadOutcome,
};
use crate::ws::{
    ArmOutcome, BackoffPolicy, ConnectionEvent, ConnectionState, EventSink, ReconnectController,
    ReconnectTicket, Transport, TransportEvent, WsHandle, WsTransport,
};

/// Bootstrap phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unauthenticated,
    CheckingSession,
    LoadingProfile,
    LoadingNotifications,
    Live,
}

/// Read-only view of the engine state, refreshed after every event.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub phase: Phase,
    pub connection: ConnectionState,
    /// Newest first.
    pub notifications: Arc<Vec<NotificationRecord>>,
    pub unread_count: usize,
    /// Last counter reported by the backend over the push channel.
    pub server_unread_count: Option<u64>,
    pub profile: Option<UserProfile>,
    /// User-facing message from the last bootstrap or login failure.
    pub notice: Option<String>,
}

impl SyncSnapshot {
    fn initial() -> Self {
        Self {
            phase: Phase::CheckingSession,
            connection: ConnectionState::Idle,
            notifications: Arc::new(Vec::new()),
            unread_count: 0,
            server_unread_count: None,
            profile: None,
            notice: None,
        }
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.notifications.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.notifications.iter().map(|r| r.id.as_str()).collect()
    }
}

/// The engine's external dependencies.
#[derive(Clone)]
pub struct Collaborators {
    pub gateway: Arc<dyn FetchGateway>,
    pub transport: Arc<dyn Transport>,
    pub session: Arc<dyn SessionStore>,
    pub alerts: Arc<dyn AlertSink>,
}

impl Collaborators {
    /// REST over HTTP, push over WebSocket, no native alerts.
    pub fn http(config: &ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
        let gateway = ApiClient::new(
            config.api_base_url.clone(),
            session.clone(),
            config.request_timeout,
        )?;
        Ok(Self {
            gateway: Arc::new(gateway),
            transport: Arc::new(WsTransport::new(config.handshake_timeout)),
            session,
            alerts: Arc::new(NoopAlerts),
        })
    }

    pub fn with_alerts(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }
}

enum Intent {
    Login { email: String, password: String },
    Logout,
    Refresh,
    MarkRead(String),
    Delete(String),
    MarkAllRead,
    Shutdown,
}

enum Completion {
    Login {
        epoch: u64,
        result: Result<LoginResponse, ApiError>,
    },
    Profile {
        epoch: u64,
        result: Result<UserProfile, ApiError>,
    },
    Notifications {
        epoch: u64,
        result: Result<Vec<RemoteNotification>, ApiError>,
    },
    RetryNotifications {
        epoch: u64,
    },
    Read {
        epoch: u64,
        id: String,
        prior: bool,
        result: Result<(), ApiError>,
    },
    Delete {
        epoch: u64,
        id: String,
        result: Result<(), ApiError>,
    },
    ReconnectDue(ReconnectTicket),
}

/// Cloneable handle to a running [`SyncEngine`]. The engine stops when every
/// handle is dropped or [`SyncHandle::shutdown`] is called.
#[derive(Clone)]
pub struct SyncHandle {
    intents: mpsc::UnboundedSender<Intent>,
    snapshot: watch::Receiver<SyncSnapshot>,
}

impl SyncHandle {
    /// Sign in. On success the credential is stored and the bootstrap chain runs again.
    pub fn login(&self, email: impl Into<String>, password: impl Into<String>) {
        self.dispatch(Intent::Login {
            email: email.into(),
            password: password.into(),
        });
    }

    /// Clear the session, close the push channel and cancel any pending reconnect.
    pub fn logout(&self) {
        self.dispatch(Intent::Logout);
    }

    /// Re-run the bootstrap chain from the session check.
    pub fn refresh(&self) {
        self.dispatch(Intent::Refresh);
    }

    /// Mark one notification read, optimistically.
    ///
    /// Only honoured while the phase is [`Phase::Live`]. Intents sent during a
    /// bootstrap, including one started by [`SyncHandle::refresh`], are
    /// dropped rather than queued.
    pub fn mark_read(&self, id: impl Into<String>) {
        self.dispatch(Intent::MarkRead(id.into()));
    }

    /// Delete one notification. The record stays visible, marked pending,
    /// until the backend confirms.
    ///
    /// Dropped unless the phase is [`Phase::Live`], like [`SyncHandle::mark_read`].
    pub fn delete(&self, id: impl Into<String>) {
        self.dispatch(Intent::Delete(id.into()));
    }

    /// Mark every unread notification read. Dropped unless the phase is [`Phase::Live`].
    pub fn mark_all_read(&self) {
        self.dispatch(Intent::MarkAllRead);
    }

    pub fn shutdown(&self) {
        self.dispatch(Intent::Shutdown);
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshot.clone()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.intents.is_closed()
    }

    fn dispatch(&self, intent: Intent) {
        if self.intents.send(intent).is_err() {
            tracing::debug!("sync engine has stopped; intent dropped");
        }
    }
}

impl PartialEq for SyncHandle {
    fn eq(&self, other: &Self) -> bool {
        self.intents.same_channel(&other.intents)
    }
}

impl fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHandle")
            .field("running", &self.is_running())
            .field("phase", &self.snapshot.borrow().phase)
            .finish()
    }
}

pub struct SyncEngine {
    config: ClientConfig,
    gateway: Arc<dyn FetchGateway>,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    alerts: Arc<dyn AlertSink>,

    store: NotificationStore,
    reconnect: ReconnectController,
    phase: Phase,
    bootstrap_epoch: u64,
    session_epoch: u64,
    identity: Option<IdentityKey>,
    profile: Option<UserProfile>,
    connection: Option<WsHandle>,
    connection_state: ConnectionState,
    server_unread: Option<u64>,
    notice: Option<String>,
    list_retry: Option<JoinHandle<()>>,

    completions: mpsc::UnboundedSender<Completion>,
    events: EventSink,
    snapshot: watch::Sender<SyncSnapshot>,
}

impl SyncEngine {
    /// Start the engine on the current tokio runtime, reconnecting per `config.reconnect`.
    pub fn spawn(config: ClientConfig, collaborators: Collaborators) -> SyncHandle {
        let policy: Arc<dyn BackoffPolicy> = Arc::new(config.reconnect.clone());
        Self::spawn_with_backoff(config, collaborators, policy)
    }

    /// Start the engine with a custom reconnect back-off policy.
    pub fn spawn_with_backoff(
        config: ClientConfig,
        collaborators: Collaborators,
        policy: Arc<dyn BackoffPolicy>,
    ) -> SyncHandle {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SyncSnapshot::initial());

        let engine = SyncEngine {
            config,
            gateway: collaborators.gateway,
            transport: collaborators.transport,
            session: collaborators.session,
            alerts: collaborators.alerts,
            store: NotificationStore::new(),
            reconnect: ReconnectController::new(policy),
            phase: Phase::CheckingSession,
            bootstrap_epoch: 0,
            session_epoch: 0,
            identity: None,
            profile: None,
            connection: None,
            connection_state: ConnectionState::Idle,
            server_unread: None,
            notice: None,
            list_retry: None,
            completions: completion_tx,
            events: event_tx,
            snapshot: snapshot_tx,
        };
        tokio::spawn(engine.run(intent_rx, completion_rx, event_rx));

        SyncHandle {
            intents: intent_tx,
            snapshot: snapshot_rx,
        }
    }

    async fn run(
        mut self,
        mut intents: mpsc::UnboundedReceiver<Intent>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        self.alerts.request_permission();
        self.begin_bootstrap();
        self.publish();

        loop {
            tokio::select! {
                intent = intents.recv() => match intent {
                    Some(Intent::Shutdown) | None => break,
                    Some(intent) => self.handle_intent(intent),
                },
                Some(completion) = completions.recv() => self.handle_completion(completion),
                Some(event) = events.recv() => self.handle_connection_event(event),
            }
            self.publish();
        }

        self.teardown_connection("client shutting down");
        self.cancel_list_retry();
        self.publish();
        tracing::info!("sync engine stopped");
    }

    fn publish(&self) {
        let snapshot = SyncSnapshot {
            phase: self.phase,
            connection: self.connection_state.clone(),
            notifications: Arc::new(self.store.records().to_vec()),
            unread_count: self.store.unread_count(),
            server_unread_count: self.server_unread,
            profile: self.profile.clone(),
            notice: self.notice.clone(),
        };
        self.snapshot.send_if_modified(move |current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    /// Run `call` on its own task and feed its output back into the event loop.
    fn spawn_call<F, T, W>(&self, call: F, wrap: W)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        W: FnOnce(T) -> Completion + Send + 'static,
    {
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let output = call.await;
            let _ = completions.send(wrap(output));
        });
    }

    // --- Intents ---

    fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Login { email, password } => self.login(email, password),
            Intent::Logout => {
                tracing::info!("signing out");
                self.end_session(None);
            }
            Intent::Refresh => self.begin_bootstrap(),
            Intent::MarkRead(id) => self.mark_read(id),
            Intent::Delete(id) => self.delete(id),
            Intent::MarkAllRead => self.mark_all_read(),
            // handled by the run loop
            Intent::Shutdown => {}
        }
    }

    fn login(&mut self, email: String, password: String) {
        if self.phase != Phase::Unauthenticated {
            tracing::warn!(phase = ?self.phase, "login ignored: a session is already active");
            return;
        }
        self.notice = None;
        let gateway = self.gateway.clone();
        let epoch = self.session_epoch;
        self.spawn_call(
            async move { gateway.login(&email, &password).await },
            move |result| Completion::Login { epoch, result },
        );
    }

    fn mark_read(&mut self, id: String) {
        if self.phase != Phase::Live {
            tracing::debug!(%id, phase = ?self.phase, "mark-read ignored before sync is live");
            return;
        }
        match self.store.apply_read(&id) {
            ReadOutcome::Applied { prior } => self.confirm_read_remotely(id, prior),
            ReadOutcome::AlreadyRead => tracing::debug!(%id, "already read"),
            ReadOutcome::NotFound => tracing::debug!(%id, "mark-read for unknown notification"),
        }
    }

    fn mark_all_read(&mut self) {
        if self.phase != Phase::Live {
            return;
        }
        let applied = self.store.apply_read_all();
        tracing::info!(count = applied.len(), "marking all notifications read");
        for (id, prior) in applied {
            self.confirm_read_remotely(id, prior);
        }
    }

    /// Tell the backend about an optimistic read: best-effort over the push
    /// channel, authoritative over REST.
    fn confirm_read_remotely(&mut self, id: String, prior: bool) {
        if let Some(handle) = &self.connection {
            handle.send(ClientFrame::MarkRead {
                notification_id: id.clone(),
            });
        }
        let gateway = self.gateway.clone();
        let epoch = self.session_epoch;
        let call_id = id.clone();
        self.spawn_call(
            async move { gateway.mark_read(&call_id).await },
            move |result| Completion::Read {
                epoch,
                id,
                prior,
                result,
            },
        );
    }

    fn delete(&mut self, id: String) {
        if self.phase != Phase::Live {
            tracing::debug!(%id, phase = ?self.phase, "delete ignored before sync is live");
            return;
        }
        match self.store.apply_delete(&id) {
            DeleteOutcome::Marked => {
                let gateway = self.gateway.clone();
                let epoch = self.session_epoch;
                let call_id = id.clone();
                self.spawn_call(
                    async move { gateway.delete(&call_id).await },
                    move |result| Completion::Delete { epoch, id, result },
                );
            }
            DeleteOutcome::AlreadyPending => tracing::debug!(%id, "delete already in flight"),
            DeleteOutcome::NotFound => tracing::debug!(%id, "delete for unknown notification"),
        }
    }

    // --- Remote call results ---

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::ReconnectDue(ticket) => self.reconnect_due(ticket),
            Completion::Login { epoch, result } if epoch == self.session_epoch => {
                self.login_finished(result)
            }
            Completion::Profile { epoch, result } if epoch == self.bootstrap_epoch => {
                self.profile_loaded(result)
            }
            Completion::Notifications { epoch, result } if epoch == self.bootstrap_epoch => {
                self.notifications_loaded(result)
            }
            Completion::RetryNotifications { epoch } if epoch == self.bootstrap_epoch => {
                self.list_retry = None;
                if self.phase == Phase::LoadingNotifications {
                    self.fetch_notifications();
                }
            }
            Completion::Read {
                epoch,
                id,
                prior,
                result,
            } if epoch == self.session_epoch => self.read_confirmed(id, prior, result),
            Completion::Delete { epoch, id, result } if epoch == self.session_epoch => {
                self.delete_confirmed(id, result)
            }
            _ => tracing::debug!("dropping result from an earlier session"),
        }
    }

    fn login_finished(&mut self, result: Result<LoginResponse, ApiError>) {
        if self.phase != Phase::Unauthenticated {
            return;
        }
        match result {
            Ok(LoginResponse { token, user }) => {
                tracing::info!(user = %user.id, "signed in");
                self.session.set(Credential::new(token));
                self.begin_bootstrap();
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.notice = Some(e.user_message());
            }
        }
    }

    fn begin_bootstrap(&mut self) {
        self.teardown_connection("restarting session");
        self.cancel_list_retry();
        self.bootstrap_epoch += 1;
        self.phase = Phase::CheckingSession;

        if self.session.get().is_none() {
            tracing::info!("no stored session");
            self.end_session(None);
            return;
        }

        self.phase = Phase::LoadingProfile;
        let gateway = self.gateway.clone();
        let epoch = self.bootstrap_epoch;
        self.spawn_call(
            async move { gateway.fetch_profile().await },
            move |result| Completion::Profile { epoch, result },
        );
    }

    fn profile_loaded(&mut self, result: Result<UserProfile, ApiError>) {
        if self.phase != Phase::LoadingProfile {
            return;
        }
        match result {
            Ok(profile) => {
                let identity = IdentityKey::from(&profile);
                if self.identity.as_ref().is_some_and(|current| current != &identity) {
                    self.store.reset();
                    self.server_unread = None;
                    self.session_epoch += 1;
                }
                tracing::info!(user = %identity, "profile loaded");
                self.identity = Some(identity);
                self.profile = Some(profile);
                self.phase = Phase::LoadingNotifications;
                self.fetch_notifications();
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile load failed; signing out");
                self.end_session(Some(e.user_message()));
            }
        }
    }

    fn fetch_notifications(&mut self) {
        let gateway = self.gateway.clone();
        let epoch = self.bootstrap_epoch;
        self.spawn_call(
            async move { gateway.fetch_notifications().await },
            move |result| Completion::Notifications { epoch, result },
        );
    }

    fn notifications_loaded(&mut self, result: Result<Vec<RemoteNotification>, ApiError>) {
        if self.phase != Phase::LoadingNotifications {
            return;
        }
        match result {
            Ok(list) => {
                let received_at = Utc::now();
                let records = list
                    .into_iter()
                    .map(|remote| NotificationRecord::from_remote(remote, received_at))
                    .collect();
                let count = self.store.seed(records);
                tracing::info!(count, "notifications loaded");
                self.phase = Phase::Live;
                self.notice = None;
                self.connect();
            }
            Err(e)
                if self.config.list_fetch_failure == ListFetchFailurePolicy::RetryTransient
                    && !e.is_auth_failure() =>
            {
                let delay = self.reconnect.base_delay();
                tracing::warn!(error = %e, ?delay, "notification list unavailable; will retry");
                self.notice = Some(e.user_message());

                let completions = self.completions.clone();
                let epoch = self.bootstrap_epoch;
                self.cancel_list_retry();
                self.list_retry = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = completions.send(Completion::RetryNotifications { epoch });
                }));
            }
            Err(e) => {
                tracing::warn!(error = %e, "notification list failed; signing out");
                self.end_session(Some(e.user_message()));
            }
        }
    }

    fn read_confirmed(&mut self, id: String, prior: bool, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                self.store.confirm_read(&id);
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "mark-read failed; rolling back");
                self.store.rollback(&id, Mutation::Read { prior });
                if e.is_auth_failure() {
                    self.end_session(Some(e.user_message()));
                }
            }
        }
    }

    fn delete_confirmed(&mut self, id: String, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                if self.store.confirm_delete(&id).is_some() {
                    tracing::debug!(%id, "notification deleted");
                }
            }
            Err(e) => {
                // No automatic retry: the record stays visible and the user can delete again.
                tracing::warn!(%id, error = %e, "delete failed; notification kept");
                self.store.rollback(&id, Mutation::Delete);
                if e.is_auth_failure() {
                    self.end_session(Some(e.user_message()));
                }
            }
        }
    }

    // --- Push channel ---

    fn connect(&mut self) {
        if self.phase != Phase::Live {
            return;
        }
        let Some(identity) = self.identity.clone() else {
            return;
        };
        if let Some(handle) = &self.connection {
            if !matches!(handle.state(), ConnectionState::Closed(_)) {
                tracing::debug!(conn = %handle.id(), "push channel already active");
                return;
            }
        }

        let credential = self.session.get();
        match self
            .transport
            .connect(&self.config.push_url, credential.as_ref(), self.events.clone())
        {
            Ok(handle) => {
                tracing::debug!(conn = %handle.id(), user = %identity, "connecting push channel");
                self.connection_state = handle.state();
                self.connection = Some(handle);
            }
            Err(SyncError::Unauthenticated) => {
                tracing::warn!("session vanished before the push channel could connect");
                self.end_session(Some(ApiError::Unauthenticated.user_message()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "push channel connect failed");
                self.schedule_reconnect(&identity);
            }
        }
    }

    fn handle_connection_event(&mut self, ConnectionEvent { connection, event }: ConnectionEvent) {
        let Some(handle) = self.connection.as_ref().filter(|h| h.id() == connection) else {
            tracing::debug!(conn = %connection, "ignoring event from a replaced connection");
            return;
        };
        self.connection_state = handle.state();

        match event {
            TransportEvent::Connected => {
                tracing::info!(conn = %connection, "live updates connected");
                self.reconnect.reset_attempts();
            }
            TransportEvent::Message(frame) => self.handle_frame(frame),
            TransportEvent::Error(detail) => {
                let err = SyncError::Transport(detail);
                tracing::debug!(conn = %connection, error = %err, "transport error");
            }
            TransportEvent::Disconnected(reason) => {
                if !reason.is_abnormal() {
                    tracing::info!(conn = %connection, "push channel closed normally");
                    return;
                }
                if self.phase != Phase::Live {
                    return;
                }
                if let Some(identity) = self.identity.clone() {
                    self.schedule_reconnect(&identity);
                }
            }
        }
    }

    fn handle_frame(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::Notification { notification } => {
                let record = NotificationRecord::from_remote(notification, Utc::now());
                let id = record.id.clone();
                let title = record.title.clone();
                let body = record.body.clone();

                match self.store.merge_push(record) {
                    MergeOutcome::Inserted => {
                        tracing::debug!(%id, "notification received");
                        if self.alerts.permission() == AlertPermission::Granted {
                            self.alerts.show(&title, &body);
                        }
                    }
                    MergeOutcome::Duplicate => tracing::debug!(%id, "duplicate notification ignored"),
                    MergeOutcome::Buffered => tracing::debug!(%id, "notification buffered until seed"),
                }
            }
            ServerFrame::UnreadCount { count } => self.server_unread = Some(count),
            ServerFrame::Unknown => {}
        }
    }

    fn schedule_reconnect(&mut self, identity: &IdentityKey) {
        let completions = self.completions.clone();
        let outcome = self.reconnect.arm(identity, move |ticket| {
            let _ = completions.send(Completion::ReconnectDue(ticket));
        });
        match outcome {
            ArmOutcome::Scheduled(delay) => tracing::info!(
                ?delay,
                attempt = self.reconnect.attempt(),
                "push channel lost; reconnect scheduled"
            ),
            ArmOutcome::AlreadyPending => tracing::debug!("reconnect already pending"),
            ArmOutcome::Exhausted => {
                tracing::warn!("giving up on push channel reconnects");
                self.notice = Some("Live updates are unavailable.".to_string());
            }
        }
    }

    fn reconnect_due(&mut self, ticket: ReconnectTicket) {
        if !self.reconnect.fire(&ticket, self.identity.as_ref()) {
            tracing::debug!(user = %ticket.identity, "stale reconnect dropped");
            return;
        }
        tracing::info!(attempt = self.reconnect.attempt(), "reconnecting push channel");
        self.connect();
    }

    // --- Teardown ---

    fn teardown_connection(&mut self, reason: &str) {
        self.reconnect.cancel();
        if let Some(handle) = self.connection.take() {
            tracing::debug!(conn = %handle.id(), reason, "closing push channel");
            handle.close(CLOSE_NORMAL, reason);
        }
        self.connection_state = ConnectionState::Idle;
    }

    fn cancel_list_retry(&mut self) {
        if let Some(timer) = self.list_retry.take() {
            tracing::debug!("cancelling notification list retry");
            timer.abort();
        }
    }

    fn end_session(&mut self, notice: Option<String>) {
        self.teardown_connection("session ended");
        self.cancel_list_retry();
        self.session.clear();
        self.store.reset();
        self.identity = None;
        self.profile = None;
        self.server_unread = None;
        self.bootstrap_epoch += 1;
        self.session_epoch += 1;
        self.phase = Phase::Unauthenticated;
        self.notice = notice;
    }
}
