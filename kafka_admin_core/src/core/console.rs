use std::sync::Arc;

use log::info;

use crate::admin::{AclBinding, AdminApi, TopicSummary};
use crate::core::connection_manager::ConnectionManager;
use crate::core::errors::AdminError;
use crate::core::session::SessionHandle;
use crate::core::worker::BackgroundWorker;
use crate::filter::FilterSpec;
use crate::snapshot::{ResourceSnapshot, ResourceView};
use crate::storage::{ClusterProfile, ProfileStore};

/// What a front end drives: profiles, the connection, and one filtered view
/// per resource kind.
///
/// Connect and fetch run on the background worker and are awaited here;
/// filtering is synchronous.
pub struct AdminConsole {
    profiles: ProfileStore,
    manager: ConnectionManager,
    worker: BackgroundWorker,
    topics: ResourceView<TopicSummary>,
    acls: ResourceView<AclBinding>,
}

impl AdminConsole {
    pub fn new(profiles: ProfileStore, api: Arc<dyn AdminApi>) -> Self {
        Self::with_worker(profiles, api, BackgroundWorker::default())
    }

    pub fn with_worker(
        profiles: ProfileStore,
        api: Arc<dyn AdminApi>,
        worker: BackgroundWorker,
    ) -> Self {
        Self {
            profiles,
            manager: ConnectionManager::new(api),
            worker,
            topics: ResourceView::new(),
            acls: ResourceView::new(),
        }
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Adds or replaces (by id) a profile and persists it.
    pub fn save_profile(&mut self, profile: ClusterProfile) -> Result<ClusterProfile, AdminError> {
        self.profiles.update(profile)
    }

    /// Deletes a profile; if the live session was opened from it, the session
    /// is closed first. `Busy` leaves both the profile and the session in place.
    pub async fn remove_profile(&mut self, id: &str) -> Result<bool, AdminError> {
        if self.profiles.get(id).is_some() && self.manager.disconnect_if_bound(id).await? {
            self.forget_snapshots();
        }
        self.profiles.remove(id)
    }

    pub async fn connect(&mut self, profile_id: &str) -> Result<SessionHandle, AdminError> {
        let profile = self.profiles.get(profile_id).ok_or_else(|| {
            AdminError::validation("profile id", format!("no profile with id '{profile_id}'"))
        })?;
        let manager = self.manager.clone();
        let session = self
            .worker
            .submit(async move { manager.connect(&profile).await })
            .wait()
            .await?;
        // Rows from the previous cluster must not show under the new one.
        self.forget_snapshots();
        Ok(session)
    }

    pub async fn disconnect(&mut self) -> Result<(), AdminError> {
        self.manager.disconnect().await
    }

    /// The live session for a one-off operation (create, delete, alter...).
    pub async fn session(&self) -> Result<SessionHandle, AdminError> {
        self.manager
            .current_session()
            .await
            .ok_or(AdminError::NotConnected)
    }

    /// Re-fetches the topic listing. Returns the new row count; on failure
    /// the previous listing stays visible.
    pub async fn refresh_topics(&mut self) -> Result<usize, AdminError> {
        let manager = self.manager.clone();
        let fetched = self
            .worker
            .submit(async move {
                let session = manager
                    .current_session()
                    .await
                    .ok_or(AdminError::NotConnected)?;
                Ok(ResourceSnapshot::new(session.list_topics().await?))
            })
            .wait()
            .await;
        self.topics.apply_fetch(fetched)
    }

    pub async fn refresh_acls(&mut self) -> Result<usize, AdminError> {
        let manager = self.manager.clone();
        let fetched = self
            .worker
            .submit(async move {
                let session = manager
                    .current_session()
                    .await
                    .ok_or(AdminError::NotConnected)?;
                Ok(ResourceSnapshot::new(session.describe_acls().await?))
            })
            .wait()
            .await;
        self.acls.apply_fetch(fetched)
    }

    pub fn topics(&self) -> &ResourceView<TopicSummary> {
        &self.topics
    }

    pub fn acls(&self) -> &ResourceView<AclBinding> {
        &self.acls
    }

    pub fn filter_topics(&mut self, spec: &FilterSpec<TopicSummary>) -> Result<usize, AdminError> {
        self.topics.set_filter(spec)
    }

    pub fn filter_acls(&mut self, spec: &FilterSpec<AclBinding>) -> Result<usize, AdminError> {
        self.acls.set_filter(spec)
    }

    pub fn clear_topic_filter(&mut self) {
        self.topics.clear_filter();
    }

    pub fn clear_acl_filter(&mut self) {
        self.acls.clear_filter();
    }

    /// Closes the live session, if any. Call on application exit.
    pub async fn shutdown(self) {
        self.manager.shutdown().await;
        info!("Console shut down.");
    }

    fn forget_snapshots(&mut self) {
        self.topics.replace_snapshot(ResourceSnapshot::empty());
        self.acls.replace_snapshot(ResourceSnapshot::empty());
    }
}
