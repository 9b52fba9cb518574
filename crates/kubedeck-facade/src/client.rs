//! Credential-scoped cluster client.

use std::future::Future;

use kube::Client;
use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::credential::{ClusterCredential, CredentialSource};
use crate::error::is_token_expired;
use crate::version::probe_kubelet_version;
use crate::Result;

/// A transport bound to one credential.
///
/// The client is built per façade call and discarded afterwards. It caches
/// one successful version probe for its lifetime and rebuilds its transport
/// once when the API server rejects the bearer credential.
pub struct ClusterClient {
    inner: RwLock<Client>,
    credential: Option<ClusterCredential>,
    version: OnceCell<Option<String>>,
}

impl ClusterClient {
    /// Wrap a connected transport together with the credential that built it.
    #[must_use]
    pub fn new(client: Client, credential: ClusterCredential) -> Self {
        Self {
            inner: RwLock::new(client),
            credential: Some(credential),
            version: OnceCell::new(),
        }
    }

    /// Wrap a pre-configured transport. Such clients cannot reconnect.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            inner: RwLock::new(client),
            credential: None,
            version: OnceCell::new(),
        }
    }

    /// Which credential interpretation built this client, if any.
    #[must_use]
    pub fn source(&self) -> Option<CredentialSource> {
        self.credential.as_ref().map(ClusterCredential::source)
    }

    /// A handle to the current transport.
    #[must_use]
    pub fn kube(&self) -> Client {
        self.inner.read().clone()
    }

    /// Run one API call, reconnecting and retrying once on an expired token.
    ///
    /// `op` receives a fresh transport handle each attempt.
    ///
    /// # Errors
    ///
    /// Returns the mapped API error of the last attempt.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(Client) -> Fut,
        Fut: Future<Output = kube::Result<T>>,
    {
        match op(self.kube()).await {
            Err(err) if is_token_expired(&err) && self.credential.is_some() => {
                warn!(error = %err, "Credential rejected, reconnecting");
                self.reconnect().await?;
                Ok(op(self.kube()).await?)
            }
            result => Ok(result?),
        }
    }

    async fn reconnect(&self) -> Result<()> {
        let Some(credential) = &self.credential else {
            return Ok(());
        };
        let client = credential.connect().await?;
        *self.inner.write() = client;
        info!(source = ?credential.source(), "Reconnected cluster client");
        Ok(())
    }

    /// Kubelet version of the first node, probed at most once per client.
    ///
    /// Failed probes are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the node list cannot be read.
    pub async fn kubelet_version(&self) -> Result<Option<String>> {
        self.version
            .get_or_try_init(|| probe_kubelet_version(self))
            .await
            .cloned()
    }
}
