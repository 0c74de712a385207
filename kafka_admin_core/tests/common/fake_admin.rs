//! A deterministic **in-process stand-in** for the Cluster Admin API.
//!
//! *  **From the test's perspective**
//!    * Count what the manager did through `FakeAdminApi::calls`
//!      (opens, closes per client, liveness probes).
//!    * Flip the `fail_*` switches to make a step fail.
//!    * `hold_open()` parks the next `open` until the test releases it, which
//!      makes "a second connect while one is in flight" reproducible.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kafka_admin_core::admin::{
    AclBinding, AdminApi, AdminClient, ApiError, ClusterNode, ConfigEntry, NewTopic,
    PartitionInfo, TopicSummary,
};
use tokio::sync::Notify;

#[derive(Default)]
pub struct Calls {
    pub opens: AtomicUsize,
    pub probes: AtomicUsize,
    /// Client ids in the order they were closed.
    pub closed: Mutex<Vec<usize>>,
    /// Properties passed to every `open`.
    pub open_properties: Mutex<Vec<BTreeMap<String, String>>>,
}

impl Calls {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closed.lock().unwrap().len()
    }

    pub fn closed_ids(&self) -> Vec<usize> {
        self.closed.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.opens() + self.probes() + self.closes()
    }
}

#[derive(Default)]
pub struct Switches {
    pub fail_open: AtomicBool,
    pub fail_probe: AtomicBool,
    pub fail_close: AtomicBool,
    pub fail_fetch: AtomicBool,
}

struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

pub struct FakeAdminApi {
    pub calls: Arc<Calls>,
    pub switches: Arc<Switches>,
    pub topics: Arc<Mutex<Vec<TopicSummary>>>,
    pub acls: Arc<Mutex<Vec<AclBinding>>>,
    gate: Mutex<Option<Gate>>,
}

impl FakeAdminApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Arc::default(),
            switches: Arc::default(),
            topics: Arc::default(),
            acls: Arc::default(),
            gate: Mutex::new(None),
        })
    }

    pub fn set(&self, switch: &AtomicBool, on: bool) {
        switch.store(on, Ordering::SeqCst);
    }

    pub fn set_topics(&self, topics: Vec<TopicSummary>) {
        *self.topics.lock().unwrap() = topics;
    }

    pub fn set_acls(&self, acls: Vec<AclBinding>) {
        *self.acls.lock().unwrap() = acls;
    }

    /// Parks the next `open`. Returns `(entered, release)`: wait on `entered`
    /// to know the open is in flight, notify `release` to let it finish.
    pub fn hold_open(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Gate {
            entered: entered.clone(),
            release: release.clone(),
        });
        (entered, release)
    }
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn open(
        &self,
        properties: &BTreeMap<String, String>,
    ) -> Result<Box<dyn AdminClient>, ApiError> {
        let id = self.calls.opens.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls
            .open_properties
            .lock()
            .unwrap()
            .push(properties.clone());

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.switches.fail_open.load(Ordering::SeqCst) {
            return Err(ApiError::new("Timed out waiting for a node assignment"));
        }
        Ok(Box::new(FakeClient {
            id,
            calls: self.calls.clone(),
            switches: self.switches.clone(),
            topics: self.topics.clone(),
            acls: self.acls.clone(),
        }))
    }
}

struct FakeClient {
    id: usize,
    calls: Arc<Calls>,
    switches: Arc<Switches>,
    topics: Arc<Mutex<Vec<TopicSummary>>>,
    acls: Arc<Mutex<Vec<AclBinding>>>,
}

impl FakeClient {
    fn fetch_guard(&self) -> Result<(), ApiError> {
        if self.switches.fail_fetch.load(Ordering::SeqCst) {
            return Err(ApiError::new("Authorization failed."));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminClient for FakeClient {
    async fn close(&self) -> Result<(), ApiError> {
        self.calls.closed.lock().unwrap().push(self.id);
        if self.switches.fail_close.load(Ordering::SeqCst) {
            return Err(ApiError::new("close interrupted"));
        }
        Ok(())
    }

    async fn list_cluster_nodes(&self) -> Result<Vec<ClusterNode>, ApiError> {
        self.calls.probes.fetch_add(1, Ordering::SeqCst);
        if self.switches.fail_probe.load(Ordering::SeqCst) {
            return Err(ApiError::new("Timed out waiting to send the call"));
        }
        Ok(vec![ClusterNode {
            id: 1,
            host: "localhost".into(),
            port: 9092,
            rack: None,
        }])
    }

    async fn list_topics(&self) -> Result<Vec<TopicSummary>, ApiError> {
        self.fetch_guard()?;
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn describe_topic(&self, _name: &str) -> Result<Vec<PartitionInfo>, ApiError> {
        self.fetch_guard()?;
        Ok(Vec::new())
    }

    async fn describe_topic_config(&self, _name: &str) -> Result<Vec<ConfigEntry>, ApiError> {
        self.fetch_guard()?;
        Ok(Vec::new())
    }

    async fn alter_topic_config(
        &self,
        _name: &str,
        _changes: &BTreeMap<String, String>,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn create_topic(&self, topic: &NewTopic) -> Result<(), ApiError> {
        let mut topics = self.topics.lock().unwrap();
        if topics.iter().any(|t| t.name == topic.name) {
            return Err(ApiError::new(format!("Topic '{}' already exists.", topic.name)));
        }
        topics.push(TopicSummary {
            name: topic.name.clone(),
            partitions: topic.partitions as usize,
            replication_factor: topic.replication_factor as usize,
        });
        Ok(())
    }

    async fn delete_topic(&self, name: &str) -> Result<(), ApiError> {
        self.topics.lock().unwrap().retain(|t| t.name != name);
        Ok(())
    }

    async fn describe_acls(&self) -> Result<Vec<AclBinding>, ApiError> {
        self.fetch_guard()?;
        Ok(self.acls.lock().unwrap().clone())
    }

    async fn create_acls(&self, bindings: &[AclBinding]) -> Result<(), ApiError> {
        self.acls.lock().unwrap().extend_from_slice(bindings);
        Ok(())
    }

    async fn delete_acls(&self, bindings: &[AclBinding]) -> Result<(), ApiError> {
        self.acls.lock().unwrap().retain(|a| !bindings.contains(a));
        Ok(())
    }
}
