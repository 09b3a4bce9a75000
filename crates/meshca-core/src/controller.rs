//! Administrative operations over the shared mesh state.
//!
//! CA creation, issuance and topology replacement run one at a time inside
//! the writer section, so a `create_ca` can never swap CA material out from
//! under an issuance in flight. Config derivation only takes the read lock
//! and always sees a whole snapshot, since replacements swap the state in
//! one write.
//!
//! State changes are saved before they are committed to memory: if the
//! save fails, the in-memory state is left as it was.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::ca::CertificateAuthority;
use crate::error::{MeshError, Result};
use crate::issuer::{CertificateIssuer, HostCertificateRequest, HostCertificateResult};
use crate::node_config::{self, HostConfigParams, NodeConfig};
use crate::signer::{Signer, Workspace};
use crate::state::{MeshState, MeshSummary};
use crate::store::StateStore;
use crate::topology::Network;

/// Entry point for every administrator action.
pub struct MeshController {
    state: RwLock<MeshState>,
    writer: Mutex<()>,
    signer: Arc<dyn Signer>,
    store: Arc<dyn StateStore>,
    workspace: Workspace,
}

impl MeshController {
    pub fn new(
        state: MeshState,
        signer: Arc<dyn Signer>,
        store: Arc<dyn StateStore>,
        workspace: Workspace,
    ) -> Self {
        Self {
            state: RwLock::new(state),
            writer: Mutex::new(()),
            signer,
            store,
            workspace,
        }
    }

    /// Build a controller from whatever the store holds (empty state if nothing).
    pub async fn open(
        signer: Arc<dyn Signer>,
        store: Arc<dyn StateStore>,
        workspace: Workspace,
    ) -> Result<Self> {
        let state = store.load().await?.unwrap_or_default();
        info!(
            established = state.is_established(),
            networks = state.topology.networks().len(),
            hosts = state.topology.host_count(),
            "mesh state loaded"
        );
        Ok(Self::new(state, signer, store, workspace))
    }

    /// Create (or replace) the CA and return its certificate.
    ///
    /// Replacing a CA breaks trust with every certificate issued by the old
    /// one. That is allowed; it is logged.
    pub async fn create_ca(&self, name: &str) -> Result<String> {
        let _writer = self.writer.lock().await;

        let ca = CertificateAuthority::create(name, self.signer.as_ref(), &self.workspace).await?;
        let certificate = ca.certificate().to_string();

        let mut next = self.state.read().await.clone();
        if let Some(previous) = &next.ca {
            warn!(previous = previous.name(), replacement = ca.name(), "replacing existing CA");
        }
        next.ca = Some(ca);
        self.commit(next).await?;
        Ok(certificate)
    }

    /// Sign a host certificate with the current CA. Issuance is not saved.
    pub async fn sign_certificate(
        &self,
        request: &HostCertificateRequest,
    ) -> Result<HostCertificateResult> {
        let _writer = self.writer.lock().await;
        let ca = self.state.read().await.ca.clone();
        CertificateIssuer::new(self.signer.as_ref(), &self.workspace)
            .sign(ca.as_ref(), request)
            .await
    }

    /// Replace every network. The new set is validated as a whole first.
    pub async fn replace_networks(&self, networks: Vec<Network>) -> Result<()> {
        let _writer = self.writer.lock().await;

        let mut next = self.state.read().await.clone();
        next.topology.replace(networks)?;
        let (networks, hosts) = (next.topology.networks().len(), next.topology.host_count());
        self.commit(next).await?;
        info!(networks, hosts, "topology replaced");
        Ok(())
    }

    async fn commit(&self, next: MeshState) -> Result<()> {
        self.store.save(&next).await?;
        *self.state.write().await = next;
        Ok(())
    }

    pub async fn is_established(&self) -> bool {
        self.state.read().await.is_established()
    }

    /// CA identity and networks, without secrets.
    pub async fn summary(&self) -> MeshSummary {
        self.state.read().await.summary()
    }

    pub async fn networks(&self) -> Vec<Network> {
        self.state.read().await.topology.networks().to_vec()
    }

    pub fn lighthouse_config(&self) -> NodeConfig {
        node_config::lighthouse_config()
    }

    pub fn host_config(&self, params: &HostConfigParams) -> NodeConfig {
        node_config::host_config(params)
    }

    /// Configuration for a host of the stored topology. Lighthouses get the
    /// lighthouse document; everyone else a host document derived from
    /// their network.
    pub async fn host_config_for(&self, network: &str, host: &str) -> Result<NodeConfig> {
        let state = self.state.read().await;
        let net = state
            .topology
            .network(network)
            .ok_or_else(|| MeshError::validation(format!("unknown network '{network}'")))?;
        let member = net.host(host).ok_or_else(|| {
            MeshError::validation(format!("network '{network}' has no host '{host}'"))
        })?;

        if member.is_lighthouse() {
            return Ok(node_config::lighthouse_config());
        }
        Ok(node_config::host_config(&HostConfigParams::for_host(net, member)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::testing::FakeSigner;
    use crate::signer::SignerError;
    use crate::store::MemoryStore;
    use crate::topology::{Host, HostRole};
    use crate::ErrorKind;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        saves: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl StateStore for CountingStore {
        async fn load(&self) -> Result<Option<MeshState>> {
            self.inner.load().await
        }

        async fn save(&self, state: &MeshState) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MeshError::io(
                    "write",
                    "/readonly/db.json",
                    std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                ));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(state).await
        }
    }

    /// Tracks how many signer calls overlap.
    struct SlowSigner {
        inner: FakeSigner,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Signer for SlowSigner {
        async fn invoke(
            &self,
            args: &[String],
            cwd: &Path,
        ) -> std::result::Result<(), SignerError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let result = self.inner.invoke(args, cwd).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn controller(signer: Arc<dyn Signer>, store: Arc<CountingStore>) -> MeshController {
        MeshController::new(MeshState::default(), signer, store, Workspace::default())
    }

    fn n1() -> Network {
        Network::new("n1", "10.0.0.0/24")
            .with_host(
                Host::new(HostRole::Lighthouse, "lh", "10.0.0.1")
                    .with_public_endpoint("1.2.3.4:4242"),
            )
            .with_host(Host::new(HostRole::Regular, "node-a", "10.0.0.2"))
            .with_host(Host::new(HostRole::Regular, "relay-1", "10.0.0.3").with_relay(true))
    }

    #[tokio::test]
    async fn test_sign_before_create_fails() {
        let store = Arc::new(CountingStore::default());
        let mesh = controller(Arc::new(FakeSigner::new()), store.clone());

        let err = mesh
            .sign_certificate(&HostCertificateRequest::new("node-a", "10.0.0.5/24"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CaNotEstablished);
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_saves_and_sign_does_not() {
        let store = Arc::new(CountingStore::default());
        let mesh = controller(Arc::new(FakeSigner::new()), store.clone());

        let crt = mesh.create_ca("mesh1").await.unwrap();
        assert_eq!(crt, "CA-CERT[mesh1]");
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);

        mesh.sign_certificate(&HostCertificateRequest::new("node-a", "10.0.0.5/24"))
            .await
            .unwrap();
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert!(store.inner.snapshot().await.unwrap().is_established());
    }

    #[tokio::test]
    async fn test_failed_create_keeps_previous_ca() {
        let store = Arc::new(CountingStore::default());
        let mesh = controller(Arc::new(FakeSigner::new()), store.clone());
        mesh.create_ca("first").await.unwrap();

        let broken = MeshController::new(
            mesh.state.read().await.clone(),
            Arc::new(FakeSigner::without("ca.crt")),
            store.clone(),
            Workspace::default(),
        );
        let err = broken.create_ca("second").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);

        let summary = broken.summary().await;
        let ca = summary.ca.unwrap();
        assert_eq!(ca.name, "first");
        assert_eq!(ca.crt, "CA-CERT[first]");
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_memory_unchanged() {
        let store = Arc::new(CountingStore::default());
        store.fail.store(true, Ordering::SeqCst);
        let mesh = controller(Arc::new(FakeSigner::new()), store.clone());

        let err = mesh.create_ca("mesh1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(!mesh.is_established().await);

        let err = mesh.replace_networks(vec![n1()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(mesh.networks().await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_networks_validates_and_saves() {
        let store = Arc::new(CountingStore::default());
        let mesh = controller(Arc::new(FakeSigner::new()), store.clone());

        let bad =
            Network::new("bad", "").with_host(Host::new(HostRole::Lighthouse, "lh", "10.0.0.1"));
        let err = mesh.replace_networks(vec![bad]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);

        mesh.replace_networks(vec![n1()]).await.unwrap();
        assert_eq!(mesh.networks().await, vec![n1()]);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);

        let err = mesh.replace_networks(vec![n1(), n1()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(mesh.networks().await, vec![n1()]);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);

        mesh.replace_networks(Vec::new()).await.unwrap();
        assert!(mesh.networks().await.is_empty());
    }

    #[tokio::test]
    async fn test_host_config_for_topology() {
        let store = Arc::new(CountingStore::default());
        let mesh = controller(Arc::new(FakeSigner::new()), store);
        mesh.replace_networks(vec![n1()]).await.unwrap();

        let lighthouse = mesh.host_config_for("n1", "lh").await.unwrap();
        assert_eq!(lighthouse, mesh.lighthouse_config());

        let node = mesh.host_config_for("n1", "node-a").await.unwrap();
        assert!(!node.lighthouse.am_lighthouse);
        assert_eq!(node.lighthouse.hosts, Some(vec!["10.0.0.1".to_string()]));
        let relay = node.relay.unwrap();
        assert!(relay.use_relays);
        assert_eq!(relay.relays, Some(vec!["10.0.0.3".to_string()]));

        let relay_node = mesh.host_config_for("n1", "relay-1").await.unwrap();
        assert!(relay_node.relay.unwrap().am_relay);

        let err = mesh.host_config_for("n1", "ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert!(mesh.host_config_for("n9", "lh").await.is_err());
    }

    #[tokio::test]
    async fn test_signer_calls_never_overlap() {
        let signer = Arc::new(SlowSigner {
            inner: FakeSigner::new(),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let store = Arc::new(CountingStore::default());
        let mesh = controller(signer.clone(), store);
        mesh.create_ca("mesh1").await.unwrap();

        let request = HostCertificateRequest::new("node-a", "10.0.0.5/24");
        let (a, b, c, d) = tokio::join!(
            mesh.sign_certificate(&request),
            mesh.create_ca("mesh2"),
            mesh.sign_certificate(&request),
            mesh.summary(),
        );
        tokio_test::assert_ok!(a);
        tokio_test::assert_ok!(b);
        tokio_test::assert_ok!(c);
        assert!(d.ca.is_some());
        assert_eq!(signer.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_loads_saved_state() {
        let store = Arc::new(CountingStore::default());
        let mesh = controller(Arc::new(FakeSigner::new()), store.clone());
        mesh.create_ca("mesh1").await.unwrap();
        mesh.replace_networks(vec![n1()]).await.unwrap();

        let reopened =
            MeshController::open(Arc::new(FakeSigner::new()), store, Workspace::default())
                .await
                .unwrap();
        assert!(reopened.is_established().await);
        assert_eq!(reopened.networks().await, vec![n1()]);
    }
}
