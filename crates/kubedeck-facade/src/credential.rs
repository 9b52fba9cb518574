//! Credential resolution and client construction.
//!
//! A credential arrives as one opaque string and is interpreted in a fixed
//! order: an existing file path, then a service-account JSON document
//! `{"api_server": ..., "token": ...}`, then raw kubeconfig text.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::client::ClusterClient;
use crate::{FacadeError, Result};

/// Which interpretation of a credential built a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// A kubeconfig file on disk.
    File,
    /// A service-account bearer token with an API server URL.
    ServiceAccount,
    /// Kubeconfig text passed inline.
    RawText,
}

#[derive(Deserialize)]
struct ServiceAccountToken {
    api_server: String,
    token: String,
}

/// A resolved cluster credential.
#[derive(Clone)]
pub enum ClusterCredential {
    /// Path to a readable kubeconfig file.
    File(PathBuf),
    /// API server URL and bearer token.
    ServiceAccount {
        /// API server base URL.
        api_server: String,
        /// Bearer token.
        token: String,
    },
    /// Inline kubeconfig document.
    RawText(String),
}

impl fmt::Debug for ClusterCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::ServiceAccount { api_server, .. } => f
                .debug_struct("ServiceAccount")
                .field("api_server", api_server)
                .field("token", &"[redacted]")
                .finish(),
            Self::RawText(_) => f.debug_tuple("RawText").field(&"[redacted]").finish(),
        }
    }
}

impl ClusterCredential {
    /// Interpret an opaque credential string.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Auth`] if the credential is empty or a
    /// service-account document carries an empty server or token.
    pub fn resolve(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(FacadeError::Auth("credential is empty".to_string()));
        }

        let path = Path::new(input);
        if path.is_file() {
            return Ok(Self::File(path.to_path_buf()));
        }

        if let Ok(sa) = serde_json::from_str::<ServiceAccountToken>(input) {
            if sa.api_server.trim().is_empty() || sa.token.trim().is_empty() {
                return Err(FacadeError::Auth(
                    "service account credential needs api_server and token".to_string(),
                ));
            }
            return Ok(Self::ServiceAccount {
                api_server: sa.api_server,
                token: sa.token,
            });
        }

        Ok(Self::RawText(input.to_string()))
    }

    /// Which interpretation this credential uses.
    #[must_use]
    pub fn source(&self) -> CredentialSource {
        match self {
            Self::File(_) => CredentialSource::File,
            Self::ServiceAccount { .. } => CredentialSource::ServiceAccount,
            Self::RawText(_) => CredentialSource::RawText,
        }
    }

    /// Load the kubeconfig this credential describes.
    ///
    /// Raw text is persisted to a temporary file first, which is removed
    /// once loaded. Service-account credentials never touch the disk.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Auth`] if the kubeconfig cannot be parsed, or
    /// [`FacadeError::Io`] if the temporary file cannot be written.
    pub fn kubeconfig(&self) -> Result<Kubeconfig> {
        match self {
            Self::File(path) => Kubeconfig::read_from(path).map_err(invalid_kubeconfig),
            Self::ServiceAccount { api_server, token } => {
                service_account_kubeconfig(api_server, token)
            }
            Self::RawText(text) => {
                let mut file = NamedTempFile::new()?;
                file.write_all(text.as_bytes())?;
                file.flush()?;
                debug!(path = %file.path().display(), "Persisted inline kubeconfig");
                Kubeconfig::read_from(file.path()).map_err(invalid_kubeconfig)
            }
        }
    }

    /// Build a connected transport from this credential.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Auth`] if the kubeconfig is invalid, or
    /// [`FacadeError::Remote`] if the transport cannot be created.
    pub async fn connect(&self) -> Result<Client> {
        let kubeconfig = self.kubeconfig()?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(invalid_kubeconfig)?;
        Ok(Client::try_from(config)?)
    }
}

fn invalid_kubeconfig(err: impl fmt::Display) -> FacadeError {
    FacadeError::Auth(format!("invalid kubeconfig: {err}"))
}

/// Kubeconfig for a bearer token against a server with TLS verification off.
fn service_account_kubeconfig(api_server: &str, token: &str) -> Result<Kubeconfig> {
    let document = json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": "service-account",
            "cluster": {
                "server": api_server,
                "insecure-skip-tls-verify": true,
            },
        }],
        "users": [{
            "name": "service-account",
            "user": { "token": token },
        }],
        "contexts": [{
            "name": "service-account",
            "context": {
                "cluster": "service-account",
                "user": "service-account",
            },
        }],
        "current-context": "service-account",
    });
    serde_json::from_value(document).map_err(invalid_kubeconfig)
}

/// Builds [`ClusterClient`]s from opaque credentials.
pub struct ClientFactory;

impl ClientFactory {
    /// Resolve `credential` and connect a client for it.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Auth`] for empty or unparseable credentials.
    pub async fn build(credential: &str) -> Result<ClusterClient> {
        let credential = ClusterCredential::resolve(credential)?;
        let client = credential.connect().await?;
        debug!(source = ?credential.source(), "Connected cluster client");
        Ok(ClusterClient::new(client, credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r"
apiVersion: v1
kind: Config
clusters:
- name: local
  cluster:
    server: https://127.0.0.1:6443
    insecure-skip-tls-verify: true
users:
- name: admin
  user:
    token: abc123
contexts:
- name: local
  context:
    cluster: local
    user: admin
current-context: local
";

    #[test]
    fn empty_credential_is_auth_error() {
        assert!(matches!(
            ClusterCredential::resolve("   "),
            Err(FacadeError::Auth(_))
        ));
    }

    #[test]
    fn existing_path_wins() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(KUBECONFIG.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap();

        let credential = ClusterCredential::resolve(path).unwrap();
        assert_eq!(credential.source(), CredentialSource::File);
        let kubeconfig = credential.kubeconfig().unwrap();
        assert_eq!(kubeconfig.current_context.as_deref(), Some("local"));
    }

    #[test]
    fn token_json_is_service_account() {
        let credential =
            ClusterCredential::resolve(r#"{"api_server": "https://10.0.0.1:6443", "token": "t0k"}"#)
                .unwrap();
        assert_eq!(credential.source(), CredentialSource::ServiceAccount);

        let kubeconfig = credential.kubeconfig().unwrap();
        let cluster = kubeconfig.clusters[0].cluster.as_ref().unwrap();
        assert_eq!(cluster.server.as_deref(), Some("https://10.0.0.1:6443"));
        assert_eq!(cluster.insecure_skip_tls_verify, Some(true));
        assert_eq!(kubeconfig.current_context.as_deref(), Some("service-account"));
    }

    #[test]
    fn token_json_with_blank_token_is_rejected() {
        assert!(matches!(
            ClusterCredential::resolve(r#"{"api_server": "https://x", "token": ""}"#),
            Err(FacadeError::Auth(_))
        ));
    }

    #[test]
    fn other_text_is_raw_kubeconfig() {
        let credential = ClusterCredential::resolve(KUBECONFIG).unwrap();
        assert_eq!(credential.source(), CredentialSource::RawText);
        let kubeconfig = credential.kubeconfig().unwrap();
        assert_eq!(kubeconfig.clusters[0].name, "local");
    }

    #[test]
    fn garbage_text_fails_as_auth() {
        let credential = ClusterCredential::resolve("{{ not: [yaml").unwrap();
        assert!(matches!(credential.kubeconfig(), Err(FacadeError::Auth(_))));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credential = ClusterCredential::ServiceAccount {
            api_server: "https://10.0.0.1".to_string(),
            token: "super-secret".to_string(),
        };
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("10.0.0.1"));
        assert!(!rendered.contains("super-secret"));

        let raw = ClusterCredential::RawText("token: hidden".to_string());
        assert!(!format!("{raw:?}").contains("hidden"));
    }

    #[tokio::test]
    async fn service_account_connects_without_network() {
        let client = ClientFactory::build(r#"{"api_server": "http://127.0.0.1:1", "token": "t"}"#)
            .await
            .unwrap();
        assert_eq!(client.source(), Some(CredentialSource::ServiceAccount));
    }
}
