use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::admin::AdminApi;
use crate::core::errors::AdminError;
use crate::core::session::SessionHandle;
use crate::core::settings::ConnectionSettings;
use crate::storage::profile::ClusterProfile;

/// Lifecycle state of the managed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

struct ManagerInner {
    api: Arc<dyn AdminApi>,
    /// The single live session. Written only inside a transition.
    session: Mutex<Option<SessionHandle>>,
    /// Held for the whole of a connect or disconnect.
    transition: Mutex<()>,
    state: watch::Sender<ConnectionState>,
}

/// Owns the one active administrative session.
///
/// `connect`, `disconnect` and friends are transitions: only one may run at a
/// time and a second concurrent call fails with [`AdminError::Busy`] instead
/// of racing on the session slot. Cloning the manager is cheap and every clone
/// shares the same session, so it can be handed to background tasks.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

/// Releases the transition lock when dropped, however the transition ends.
type TransitionGuard<'a> = MutexGuard<'a, ()>;

impl ConnectionManager {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ManagerInner {
                api,
                session: Mutex::new(None),
                transition: Mutex::new(()),
                state,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Observe state transitions (e.g. to drive a status label).
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.transition.try_lock().is_err()
    }

    /// The live session, if any. Callers use it for one operation and drop
    /// it; a handle held past a reconnect answers `NotConnected`.
    pub async fn current_session(&self) -> Option<SessionHandle> {
        self.inner.session.lock().await.clone()
    }

    fn begin_transition(&self) -> Result<TransitionGuard<'_>, AdminError> {
        self.inner
            .transition
            .try_lock()
            .map_err(|_| AdminError::Busy)
    }

    fn set_state(&self, state: ConnectionState) {
        debug!("Connection state -> {:?}", state);
        self.inner.state.send_replace(state);
    }

    /// Validates `profile`, closes any previous session, then opens and probes
    /// a new one.
    ///
    /// A validation failure leaves the previous session and state untouched.
    /// Any later failure leaves the manager `Failed` with no session.
    pub async fn connect(&self, profile: &ClusterProfile) -> Result<SessionHandle, AdminError> {
        let _guard = self.begin_transition()?;
        info!("Connecting with profile '{}' ({})", profile.name, profile.id);

        let settings = ConnectionSettings::from_profile(profile).map_err(|e| {
            warn!("Profile '{}' failed validation: {e}", profile.name);
            e
        })?;

        // Close before replace: the old client is gone before a new one exists.
        self.close_current().await;
        self.set_state(ConnectionState::Connecting);

        let client = match self.inner.api.open(&settings.to_properties()).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to open admin client for '{}': {e}", profile.name);
                self.set_state(ConnectionState::Failed);
                return Err(AdminError::connection(&profile.id, &e));
            }
        };

        let session = SessionHandle::new(&profile.id, &profile.name, client);
        match session.list_cluster_nodes().await {
            Ok(nodes) => debug!("Liveness probe answered with {} nodes", nodes.len()),
            Err(e) => {
                let reason = match &e {
                    AdminError::Operation { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                error!("Liveness probe failed for '{}': {reason}", profile.name);
                if let Err(close_err) = session.close().await {
                    warn!("Closing unverified client failed: {close_err}");
                }
                self.set_state(ConnectionState::Failed);
                return Err(AdminError::Connection {
                    profile_id: profile.id.clone(),
                    reason,
                });
            }
        }

        *self.inner.session.lock().await = Some(session.clone());
        self.set_state(ConnectionState::Connected);
        info!("Connected to cluster '{}'", profile.name);
        Ok(session)
    }

    /// Closes the active session if there is one. Calling it while already
    /// disconnected is a no-op.
    pub async fn disconnect(&self) -> Result<(), AdminError> {
        let _guard = self.begin_transition()?;
        self.close_current().await;
        self.set_state(ConnectionState::Disconnected);
        Ok(())
    }

    /// Disconnects only when the active session was opened from `profile_id`.
    /// Returns whether a session was torn down.
    pub async fn disconnect_if_bound(&self, profile_id: &str) -> Result<bool, AdminError> {
        let _guard = self.begin_transition()?;
        let bound = self
            .inner
            .session
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| s.profile_id() == profile_id);
        if bound {
            info!("Active profile {profile_id} removed; closing its session");
            self.close_current().await;
            self.set_state(ConnectionState::Disconnected);
        }
        Ok(bound)
    }

    /// Closes any session on application exit. Unlike `disconnect` this
    /// never reports `Busy`; it waits for a running transition to finish.
    pub async fn shutdown(&self) {
        let _guard = self.inner.transition.lock().await;
        self.close_current().await;
        self.set_state(ConnectionState::Disconnected);
        info!("Connection manager shut down.");
    }

    /// Takes the session out of its slot and closes it. Close failures are
    /// logged and swallowed so they never block a reconnect.
    async fn close_current(&self) {
        let previous = self.inner.session.lock().await.take();
        if let Some(session) = previous {
            match session.close().await {
                Ok(()) => info!("Closed session for profile '{}'", session.profile_name()),
                Err(e) => warn!(
                    "Closing session for profile '{}' failed (continuing): {e}",
                    session.profile_name()
                ),
            }
        }
    }
}
